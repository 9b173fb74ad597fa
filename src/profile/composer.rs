// Profile Text Composer
//
// Turns a profile record into the canonical text fed to the embedding model.
// Deterministic: same profile in, same text out. Field order is fixed
// (role, company, location, interests) so re-running the pipeline produces
// identical embedding input.

use super::Profile;

/// Compose the canonical embedding text for a profile.
///
/// Parts blank after trimming are skipped entirely, so the output never
/// contains double spaces or placeholder words.
pub fn compose(profile: &Profile) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(4);

    if let Some(role) = profile.role.as_deref() {
        let role = role.trim();
        if !role.is_empty() {
            parts.push(role);
        }
    }
    if let Some(company) = profile.company.as_deref() {
        let company = company.trim();
        if !company.is_empty() {
            parts.push(company);
        }
    }
    if let Some(location) = profile.location.as_deref() {
        let location = location.trim();
        if !location.is_empty() {
            parts.push(location);
        }
    }

    let interests: Vec<&str> = profile
        .interests
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect();
    let interests = interests.join(" ");
    if !interests.is_empty() {
        parts.push(&interests);
    }

    parts.join(" ")
}

/// Validate a profile ahead of embedding.
///
/// Returns the rejection reason instead of erroring so batch callers can
/// record it per item and keep going.
pub fn validate(profile: &Profile) -> std::result::Result<(), String> {
    if profile.id.trim().is_empty() {
        return Err("profile id is empty".to_string());
    }

    if compose(profile).is_empty() {
        return Err(format!(
            "profile {} has no embeddable fields (role, company, location, interests all empty)",
            profile.id
        ));
    }

    Ok(())
}
