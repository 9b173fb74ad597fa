// Profile Module
//
// Profile records and the vector payload types shared by the embedding
// pipeline, the vector store and the recommendation merger.

use serde::{Deserialize, Serialize};

pub mod composer;

pub use composer::{compose, validate};

/// Which side of the contact graph a profile belongs to.
///
/// Connections carry the ids of the users who own them; users carry nothing
/// extra. This replaces a stringly-typed `payload.type` field so downstream
/// code matches on the variant instead of comparing strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProfileKind {
    User,
    Connection {
        #[serde(default)]
        user_ids: Vec<String>,
    },
}

impl ProfileKind {
    pub fn is_user(&self) -> bool {
        matches!(self, ProfileKind::User)
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, ProfileKind::Connection { .. })
    }

    /// Stable label used in filters and log output
    pub fn label(&self) -> &'static str {
        match self {
            ProfileKind::User => "user",
            ProfileKind::Connection { .. } => "connection",
        }
    }
}

/// A contact profile, either the user's own or one of their connections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub kind: ProfileKind,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl Profile {
    /// True if at least one embeddable field survives trimming
    pub fn is_embeddable(&self) -> bool {
        !composer::compose(self).is_empty()
    }
}

/// Metadata stored beside each vector in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPayload {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub kind: ProfileKind,
}

impl PointPayload {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            id: profile.id.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            kind: profile.kind.clone(),
        }
    }
}

/// The unit written to a vector store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

/// A ranked similarity hit returned by a vector store query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub payload: PointPayload,
}
