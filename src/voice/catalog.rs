//! The built-in voice catalog.

use std::collections::HashMap;

use crate::backend::{EngineVoice, Gender};

use super::types::{
    CloudAccent, ProviderKind, Route, VoiceEntry, VoiceGroup, VoiceListing, VoiceOption,
};

/// Identifier prefix for local engine voices.
pub const LOCAL_PREFIX: &str = "system-";

/// Label of the group listing local engine voices.
pub const LOCAL_GROUP: &str = "System Voices";

/// Label of the group listing cloud accents.
pub const CLOUD_GROUP: &str = "Google TTS - Accents (Neutral)";

/// At most this many local engine voices are listed.
pub const MAX_LOCAL_VOICES: usize = 10;

// (id, display, gender, accent), in display order within each group.
const REMOTE_GROUPS: &[(&str, &[(&str, &str, Gender, &str)])] = &[
    (
        "Male Voices - British",
        &[
            ("Brian", "Brian - British Male (Clear)", Gender::Male, "British"),
            ("Daniel", "Daniel - British Male (Deep)", Gender::Male, "British"),
            ("George", "George - British Male (Mature)", Gender::Male, "British"),
        ],
    ),
    (
        "Male Voices - American",
        &[
            ("Matthew", "Matthew - American Male (Neutral)", Gender::Male, "American"),
            ("Joey", "Joey - American Male (Casual)", Gender::Male, "American"),
            ("Justin", "Justin - American Male (Young)", Gender::Male, "American Teen"),
        ],
    ),
    (
        "Male Voices - Other",
        &[("Russell", "Russell - Australian Male", Gender::Male, "Australian")],
    ),
    (
        "Female Voices - British",
        &[
            ("Emma", "Emma - British Female (Clear)", Gender::Female, "British"),
            ("Amy", "Amy - British Female (Warm)", Gender::Female, "British"),
        ],
    ),
    (
        "Female Voices - American",
        &[
            ("Salli", "Salli - American Female (Clear)", Gender::Female, "American"),
            ("Joanna", "Joanna - American Female (Neutral)", Gender::Female, "American"),
            ("Kendra", "Kendra - American Female (Professional)", Gender::Female, "American"),
            ("Kimberly", "Kimberly - American Female (Warm)", Gender::Female, "American"),
            ("Ivy", "Ivy - American Female (Young)", Gender::Female, "American Child"),
        ],
    ),
    (
        "Female Voices - Other",
        &[("Nicole", "Nicole - Australian Female", Gender::Female, "Australian")],
    ),
];

/// Immutable table of selectable voices and how each is served.
#[derive(Debug, Clone)]
pub struct VoiceCatalog {
    groups: Vec<(String, Vec<VoiceEntry>)>,
    remote: HashMap<String, VoiceEntry>,
    local_enabled: bool,
}

impl VoiceCatalog {
    /// Build the built-in catalog.
    ///
    /// `local_enabled` says whether a local engine is present on this host.
    pub fn new(local_enabled: bool) -> Self {
        let mut groups = Vec::new();
        let mut remote = HashMap::new();

        for (label, voices) in REMOTE_GROUPS {
            let entries: Vec<VoiceEntry> = voices
                .iter()
                .map(|(id, display, gender, accent)| VoiceEntry {
                    id: id.to_string(),
                    display: display.to_string(),
                    gender: *gender,
                    accent: accent.to_string(),
                    provider: ProviderKind::RemoteSpeechApi,
                })
                .collect();

            for entry in &entries {
                remote.insert(entry.id.clone(), entry.clone());
            }
            groups.push((label.to_string(), entries));
        }

        let cloud = CloudAccent::ALL
            .iter()
            .map(|accent| VoiceEntry {
                id: accent.code().to_string(),
                display: accent.display().to_string(),
                gender: Gender::Neutral,
                accent: accent.region().to_string(),
                provider: ProviderKind::CloudAccent,
            })
            .collect();
        groups.push((CLOUD_GROUP.to_string(), cloud));

        Self {
            groups,
            remote,
            local_enabled,
        }
    }

    pub fn local_enabled(&self) -> bool {
        self.local_enabled
    }

    /// Look up a remote speech voice.
    pub fn remote_voice(&self, id: &str) -> Option<&VoiceEntry> {
        self.remote.get(id)
    }

    /// Decide which provider serves `voice_id`.
    ///
    /// Unknown identifiers are treated as cloud accent codes.
    pub fn resolve(&self, voice_id: &str) -> Route {
        if self.remote.contains_key(voice_id) {
            return Route::Remote(voice_id.to_string());
        }

        if self.local_enabled
            && let Some(engine_id) = voice_id.strip_prefix(LOCAL_PREFIX)
            && !engine_id.is_empty()
        {
            return Route::Local(engine_id.to_string());
        }

        Route::Cloud(CloudAccent::from_code(voice_id))
    }

    /// Turn engine voices into catalog entries.
    pub fn local_entries(voices: &[EngineVoice]) -> Vec<VoiceEntry> {
        voices
            .iter()
            .take(MAX_LOCAL_VOICES)
            .map(|voice| VoiceEntry {
                id: format!("{LOCAL_PREFIX}{}", voice.id),
                display: format!("{} (System)", voice.name),
                gender: voice.gender,
                accent: voice.id.clone(),
                provider: ProviderKind::LocalEngine,
            })
            .collect()
    }

    /// Build the client listing.
    ///
    /// `local` is the result of probing the local engine; `None` or an empty
    /// list omits the local group.
    pub fn listing(&self, local: Option<&[EngineVoice]>) -> VoiceListing {
        let mut groups: Vec<VoiceGroup> = self
            .groups
            .iter()
            .map(|(label, entries)| VoiceGroup {
                label: label.clone(),
                voices: entries.iter().map(VoiceOption::from).collect(),
            })
            .collect();

        if let Some(voices) = local
            && !voices.is_empty()
        {
            groups.push(VoiceGroup {
                label: LOCAL_GROUP.to_string(),
                voices: Self::local_entries(voices)
                    .iter()
                    .map(VoiceOption::from)
                    .collect(),
            });
        }

        VoiceListing { groups }
    }
}
