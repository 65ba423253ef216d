//! Core data models for the video catalog service.
//!
//! Video objects are owned by the bucket; sessions are owned by the external
//! auth provider and only read here. Both serialize naturally as JSON via `serde`.

pub mod session;
pub mod video;
