//! HTTP request handlers
//!
//! - `api` - health, recovery and retention status
//! - `audio` - generated audio download
//! - `generate` - realtime speech generation
//! - `session` - session reset
//! - `translate` - standalone translation
//! - `voices` - voice catalog listing

pub mod api;
pub mod audio;
pub mod generate;
pub mod session;
pub mod translate;
pub mod voices;
