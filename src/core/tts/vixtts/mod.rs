//! Vietnamese fine-tuned XTTS backend (`vi_xtts_<gender>`).

mod provider;

pub use provider::{VIXTTS_LANGUAGE, ViXttsBackend, ViXttsConfig};
