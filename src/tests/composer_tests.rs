// Profile text composition and validation

#[cfg(test)]
mod composer_tests {
    use crate::profile::{compose, validate, Profile, ProfileKind};

    fn full_profile() -> Profile {
        Profile {
            id: "p1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            kind: ProfileKind::User,
            role: Some("Engineer".to_string()),
            company: Some("Acme".to_string()),
            location: Some("Berlin".to_string()),
            interests: vec!["rust".to_string(), "climbing".to_string()],
        }
    }

    #[test]
    fn compose_uses_fixed_field_order() {
        assert_eq!(compose(&full_profile()), "Engineer Acme Berlin rust climbing");
    }

    #[test]
    fn compose_is_deterministic() {
        let profile = full_profile();
        assert_eq!(compose(&profile), compose(&profile));
    }

    #[test]
    fn compose_skips_blank_parts() {
        let mut profile = full_profile();
        profile.company = Some("   ".to_string());
        profile.location = None;
        assert_eq!(compose(&profile), "Engineer rust climbing");
    }

    #[test]
    fn compose_trims_parts() {
        let mut profile = full_profile();
        profile.role = Some("  Engineer  ".to_string());
        profile.interests = vec!["  rust ".to_string(), " ".to_string()];
        let text = compose(&profile);
        assert_eq!(text, "Engineer Acme Berlin rust");
        assert!(!text.contains("  "), "no double spaces: {:?}", text);
    }

    #[test]
    fn compose_empty_profile_yields_empty_string() {
        let mut profile = full_profile();
        profile.role = None;
        profile.company = None;
        profile.location = None;
        profile.interests.clear();
        assert_eq!(compose(&profile), "");
    }

    #[test]
    fn validate_accepts_single_field() {
        let mut profile = full_profile();
        profile.role = None;
        profile.company = None;
        profile.interests.clear();
        assert!(validate(&profile).is_ok());
    }

    #[test]
    fn validate_rejects_profile_with_no_embeddable_fields() {
        let mut profile = full_profile();
        profile.role = None;
        profile.company = Some("  ".to_string());
        profile.location = None;
        profile.interests = vec![" ".to_string()];
        let reason = validate(&profile).unwrap_err();
        assert!(reason.contains("no embeddable fields"), "{}", reason);
    }

    #[test]
    fn validate_rejects_blank_id() {
        let mut profile = full_profile();
        profile.id = "  ".to_string();
        assert!(validate(&profile).is_err());
    }
}
