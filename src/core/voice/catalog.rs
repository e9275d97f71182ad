use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwap;
use futures::future::join_all;
use tracing::{debug, error, info};

use crate::core::tts::SharedBackend;

use super::{Engine, VoiceDescriptor};

/// Voices of one engine grouped by language name.
pub type LanguageGroups = BTreeMap<String, Vec<VoiceDescriptor>>;

/// Engine display name to its language groups.
pub type CatalogSnapshot = BTreeMap<String, LanguageGroups>;

/// In-memory voice index rebuilt from the backends' `list_voices()` output.
///
/// Readers get an `Arc` to an immutable snapshot. A rebuild constructs the
/// next snapshot off to the side and publishes it with one pointer swap, so a
/// reader never observes a half-built catalog.
pub struct VoiceCatalog {
    snapshot: ArcSwap<CatalogSnapshot>,
    initialized: AtomicBool,
}

impl Default for VoiceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceCatalog {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(CatalogSnapshot::new()),
            initialized: AtomicBool::new(false),
        }
    }

    /// Current snapshot without triggering a refresh.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.load_full()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Total number of voices across every engine and language.
    pub fn voice_count(&self) -> usize {
        self.snapshot
            .load()
            .values()
            .flat_map(|groups| groups.values())
            .map(Vec::len)
            .sum()
    }

    /// Snapshot for clients; performs the first refresh lazily.
    pub async fn get_voices(&self, backends: &[SharedBackend]) -> Arc<CatalogSnapshot> {
        if !self.is_initialized() {
            self.refresh(backends).await;
        }
        self.snapshot()
    }

    /// Rebuild the whole catalog.
    ///
    /// Any backend failure leaves the catalog empty; the error is logged and
    /// never propagated.
    pub async fn refresh(&self, backends: &[SharedBackend]) {
        let listings = join_all(backends.iter().map(|backend| async move {
            (backend.engine(), backend.list_voices().await)
        }))
        .await;

        let mut next = CatalogSnapshot::new();
        for (engine, listing) in listings {
            match listing {
                Ok(voices) => {
                    let groups = normalize(engine, voices);
                    if !groups.is_empty() {
                        next.insert(engine.display_name().to_string(), groups);
                    }
                }
                Err(e) => {
                    error!(engine = %engine, error = %e, "Voice listing failed, catalog cleared");
                    next.clear();
                    break;
                }
            }
        }

        let count: usize = next.values().flat_map(|g| g.values()).map(Vec::len).sum();
        self.snapshot.store(Arc::new(next));
        self.initialized.store(true, Ordering::Release);
        info!(voices = count, "Voice catalog refreshed");
    }

    /// Replace the entries of a single engine, leaving the others untouched.
    pub async fn refresh_engine(&self, backend: &SharedBackend) {
        let engine = backend.engine();
        let groups = match backend.list_voices().await {
            Ok(voices) => normalize(engine, voices),
            Err(e) => {
                error!(engine = %engine, error = %e, "Voice listing failed, engine removed from catalog");
                LanguageGroups::new()
            }
        };

        let key = engine.display_name();
        self.snapshot.rcu(|current| {
            let mut next = CatalogSnapshot::clone(current);
            if groups.is_empty() {
                next.remove(key);
            } else {
                next.insert(key.to_string(), groups.clone());
            }
            next
        });
        debug!(engine = %engine, "Voice catalog entry refreshed");
    }
}

/// Group by language, drop empties and duplicates, sort by display name.
fn normalize(engine: Engine, voices: Vec<VoiceDescriptor>) -> LanguageGroups {
    let mut seen = HashSet::new();
    let mut groups = LanguageGroups::new();

    for voice in voices {
        if voice.engine != engine || voice.language_name.is_empty() {
            continue;
        }
        if !seen.insert(voice.id.clone()) {
            continue;
        }
        groups
            .entry(voice.language_name.clone())
            .or_default()
            .push(voice);
    }

    groups.retain(|_, voices| !voices.is_empty());
    for voices in groups.values_mut() {
        voices.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tts::{SynthesisBackend, SynthesisRequest, TTSError, TTSResult};
    use crate::core::voice::Gender;
    use async_trait::async_trait;

    struct FixedBackend {
        engine: Engine,
        voices: Option<Vec<VoiceDescriptor>>,
    }

    #[async_trait]
    impl SynthesisBackend for FixedBackend {
        fn engine(&self) -> Engine {
            self.engine
        }

        async fn list_voices(&self) -> TTSResult<Vec<VoiceDescriptor>> {
            self.voices
                .clone()
                .ok_or_else(|| TTSError::InvalidConfiguration("listing broke".into()))
        }

        async fn synthesize(&self, _request: SynthesisRequest<'_>) -> TTSResult<String> {
            unreachable!("catalog never synthesizes")
        }
    }

    fn voice(engine: Engine, id: &str, name: &str, language: &str) -> VoiceDescriptor {
        VoiceDescriptor::new(engine, id, name, language, Gender::Female)
    }

    fn backend(engine: Engine, voices: Option<Vec<VoiceDescriptor>>) -> SharedBackend {
        Arc::new(FixedBackend { engine, voices })
    }

    #[tokio::test]
    async fn test_refresh_groups_and_sorts() {
        let catalog = VoiceCatalog::new();
        let backends = vec![
            backend(
                Engine::BaseLocal,
                Some(vec![
                    voice(Engine::BaseLocal, "xtts_fr_male", "XTTS Male Voice (French)", "French"),
                    voice(Engine::BaseLocal, "xtts_en_male", "XTTS Male Voice (English)", "English"),
                    voice(Engine::BaseLocal, "xtts_en_female", "XTTS Female Voice (English)", "English"),
                ]),
            ),
            backend(Engine::PipelineLocal, Some(vec![])),
        ];

        catalog.refresh(&backends).await;
        let snapshot = catalog.snapshot();

        assert!(catalog.is_initialized());
        assert_eq!(snapshot.len(), 1, "engines without voices are omitted");
        let xtts = &snapshot["XTTS"];
        assert_eq!(xtts.keys().collect::<Vec<_>>(), vec!["English", "French"]);
        assert_eq!(xtts["English"][0].id, "xtts_en_female");
        assert_eq!(xtts["English"][1].id, "xtts_en_male");
        assert_eq!(catalog.voice_count(), 3);
    }

    #[tokio::test]
    async fn test_refresh_error_empties_catalog() {
        let catalog = VoiceCatalog::new();
        let good = backend(
            Engine::BaseLocal,
            Some(vec![voice(Engine::BaseLocal, "xtts_en_male", "A", "English")]),
        );

        catalog.refresh(std::slice::from_ref(&good)).await;
        assert_eq!(catalog.voice_count(), 1);

        catalog
            .refresh(&[good, backend(Engine::Cloud, None)])
            .await;
        assert!(catalog.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_drops_duplicate_ids_and_empty_languages() {
        let catalog = VoiceCatalog::new();
        let backends = vec![backend(
            Engine::MultiSpeakerLocal,
            Some(vec![
                voice(Engine::MultiSpeakerLocal, "kokoro_af_sky", "Sky", "English (US)"),
                voice(Engine::MultiSpeakerLocal, "kokoro_af_sky", "Sky again", "English (US)"),
                voice(Engine::MultiSpeakerLocal, "kokoro_xx", "Nameless", ""),
            ]),
        )];

        catalog.refresh(&backends).await;

        assert_eq!(catalog.voice_count(), 1);
        assert!(!catalog.snapshot()["Kokoro"].contains_key(""));
    }

    #[tokio::test]
    async fn test_refresh_engine_replaces_only_that_engine() {
        let catalog = VoiceCatalog::new();
        let backends = vec![
            backend(
                Engine::Cloud,
                Some(vec![voice(Engine::Cloud, "Joanna", "Joanna", "Polly English (US)")]),
            ),
            backend(
                Engine::BaseLocal,
                Some(vec![voice(Engine::BaseLocal, "xtts_en_male", "A", "English")]),
            ),
        ];
        catalog.refresh(&backends).await;

        catalog.refresh_engine(&backend(Engine::BaseLocal, None)).await;

        let snapshot = catalog.snapshot();
        assert!(snapshot.contains_key("Polly"));
        assert!(!snapshot.contains_key("XTTS"));
    }

    #[tokio::test]
    async fn test_get_voices_refreshes_lazily() {
        let catalog = VoiceCatalog::new();
        let backends = vec![backend(
            Engine::RegionalLocal,
            Some(vec![voice(Engine::RegionalLocal, "vi_xtts_female", "F", "Vietnamese")]),
        )];

        assert!(!catalog.is_initialized());
        let voices = catalog.get_voices(&backends).await;

        assert_eq!(voices["Vietnamese XTTS"]["Vietnamese"].len(), 1);
    }
}
