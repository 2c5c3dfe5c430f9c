//! Voice catalog and routing.
//!
//! Maps client-facing voice identifiers onto the provider that serves them
//! and builds the grouped listing shown to clients.

mod catalog;
mod types;

pub use crate::backend::Gender;
pub use catalog::{CLOUD_GROUP, LOCAL_GROUP, LOCAL_PREFIX, MAX_LOCAL_VOICES, VoiceCatalog};
pub use types::{
    CloudAccent, ProviderKind, Route, VoiceEntry, VoiceGroup, VoiceListing, VoiceOption,
};
