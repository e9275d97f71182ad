//! Voice metadata shared by every synthesis backend.
//!
//! - `descriptor` - immutable voice records and the engine/gender enums
//! - `identifier` - typed parsing of caller-supplied voice ids
//! - `catalog` - the rebuildable `engine -> language -> voices` index

mod catalog;
mod descriptor;
mod identifier;

pub use catalog::{CatalogSnapshot, LanguageGroups, VoiceCatalog};
pub use descriptor::{Engine, Gender, VoiceDescriptor};
pub use identifier::{VoiceIdentifier, VoiceSelector};
