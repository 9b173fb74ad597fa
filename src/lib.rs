// Rolo - Contact Recommendation Engine Library
//!
//! Rolo recommends new contacts by comparing semantic embeddings of profile
//! data, and offers a quota-limited external people search as a cold-start
//! source of candidates. Embedding models and search providers are consumed
//! as external services behind traits.

pub mod api;
pub mod config;
pub mod directory;
pub mod embeddings;
pub mod errors;
pub mod pipeline;
pub mod profile;
pub mod recommend;
pub mod search;
pub mod store;

#[cfg(test)]
pub mod tests;

// Re-export common types
pub use api::{ApiResponse, RoloEngine};
pub use config::{RoloConfig, StoreBackend};
pub use errors::{Result, RoloError};
pub use profile::{PointPayload, PointRecord, Profile, ProfileKind, ScoredPoint};
pub use recommend::{match_reason, RecommendTarget, RecommendationPage};
