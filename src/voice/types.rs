//! Voice catalog types.

use serde::Serialize;
use serde::ser::SerializeMap;

use crate::backend::Gender;

/// Which provider family serves a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    RemoteSpeechApi,
    CloudAccent,
    LocalEngine,
}

/// Accents offered by the cloud provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloudAccent {
    #[default]
    Us,
    Uk,
    Australia,
    India,
    Canada,
    Ireland,
    SouthAfrica,
}

impl CloudAccent {
    pub const ALL: [CloudAccent; 7] = [
        CloudAccent::Us,
        CloudAccent::Uk,
        CloudAccent::Australia,
        CloudAccent::India,
        CloudAccent::Canada,
        CloudAccent::Ireland,
        CloudAccent::SouthAfrica,
    ];

    /// Client-facing voice identifier.
    pub fn code(&self) -> &'static str {
        match self {
            CloudAccent::Us => "gtts-us",
            CloudAccent::Uk => "gtts-uk",
            CloudAccent::Australia => "gtts-au",
            CloudAccent::India => "gtts-in",
            CloudAccent::Canada => "gtts-ca",
            CloudAccent::Ireland => "gtts-ie",
            CloudAccent::SouthAfrica => "gtts-za",
        }
    }

    /// Region token selecting the accent on the provider side.
    pub fn region(&self) -> &'static str {
        match self {
            CloudAccent::Us => "com",
            CloudAccent::Uk => "co.uk",
            CloudAccent::Australia => "com.au",
            CloudAccent::India => "co.in",
            CloudAccent::Canada => "ca",
            CloudAccent::Ireland => "ie",
            CloudAccent::SouthAfrica => "co.za",
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            CloudAccent::Us => "Google US English",
            CloudAccent::Uk => "Google UK English",
            CloudAccent::Australia => "Google Australian",
            CloudAccent::India => "Google Indian English",
            CloudAccent::Canada => "Google Canadian",
            CloudAccent::Ireland => "Google Irish",
            CloudAccent::SouthAfrica => "Google South African",
        }
    }

    /// Look up an accent by code, falling back to the default accent.
    pub fn from_code(code: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|accent| accent.code() == code)
            .unwrap_or_default()
    }
}

/// A selectable voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceEntry {
    pub id: String,
    pub display: String,
    pub gender: Gender,
    pub accent: String,
    pub provider: ProviderKind,
}

/// How a voice identifier is served, decided once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Remote speech API voice, by name.
    Remote(String),
    /// Local engine voice, by engine-native id.
    Local(String),
    /// Cloud provider accent.
    Cloud(CloudAccent),
}

/// Display record sent to clients.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VoiceOption {
    pub name: String,
    pub display: String,
    pub gender: Gender,
}

impl From<&VoiceEntry> for VoiceOption {
    fn from(entry: &VoiceEntry) -> Self {
        Self {
            name: entry.id.clone(),
            display: entry.display.clone(),
            gender: entry.gender,
        }
    }
}

/// A labelled group of voices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceGroup {
    pub label: String,
    pub voices: Vec<VoiceOption>,
}

/// Ordered voice groups.
///
/// Serializes as a JSON object whose keys keep the group order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceListing {
    pub groups: Vec<VoiceGroup>,
}

impl VoiceListing {
    pub fn group(&self, label: &str) -> Option<&VoiceGroup> {
        self.groups.iter().find(|g| g.label == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.label.as_str()).collect()
    }
}

impl Serialize for VoiceListing {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.label, &group.voices)?;
        }
        map.end()
    }
}
