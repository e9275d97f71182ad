//! Amazon Polly backend, the default route for voice ids no local engine
//! claims.
//!
//! Credentials come from explicit configuration when both the key id and the
//! secret are set, and from the default AWS provider chain otherwise
//! (environment, `~/.aws/credentials`, instance role).

mod config;
mod provider;

pub use config::{
    DEFAULT_REGION, MAX_TEXT_LENGTH, PCM_SAMPLE_RATES, POLLY_LANGUAGE_NAMES, POLLY_SAMPLE_RATE,
    PollyConfig, polly_language_name,
};
pub use provider::PollyBackend;

#[cfg(test)]
mod tests;
