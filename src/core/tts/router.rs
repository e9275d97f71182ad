use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::base::{SharedBackend, TTSError, TTSResult};
use crate::core::voice::Engine;

/// Voice id to backend dispatch.
///
/// Each local backend registers literal prefixes; the longest matching prefix
/// wins and anything unmatched goes to the cloud backend. Backends sit in
/// replaceable slots so a recovered instance can be swapped in while requests
/// keep flowing. `resolve` clones the `Arc` out of the slot and never holds the
/// lock while a backend runs.
pub struct BackendRouter {
    /// Sorted longest prefix first.
    routes: Vec<(&'static str, Engine)>,
    default: RwLock<SharedBackend>,
    local: HashMap<Engine, RwLock<SharedBackend>>,
}

impl BackendRouter {
    /// Build a router from the cloud default and any number of local backends.
    ///
    /// Fails when the default is not the cloud engine, an engine is registered
    /// twice, a prefix is empty, or two engines claim overlapping prefixes.
    pub fn new(default: SharedBackend, locals: Vec<SharedBackend>) -> TTSResult<Self> {
        if default.engine() != Engine::Cloud {
            return Err(TTSError::InvalidConfiguration(format!(
                "default backend must be the cloud engine, got {}",
                default.engine()
            )));
        }

        let mut routes: Vec<(&'static str, Engine)> = default
            .voice_prefixes()
            .iter()
            .map(|p| (*p, Engine::Cloud))
            .collect();
        let mut local = HashMap::new();

        for backend in locals {
            let engine = backend.engine();
            if engine == Engine::Cloud || local.contains_key(&engine) {
                return Err(TTSError::InvalidConfiguration(format!(
                    "backend {engine} registered more than once"
                )));
            }
            for prefix in backend.voice_prefixes() {
                routes.push((*prefix, engine));
            }
            local.insert(engine, RwLock::new(backend));
        }

        if let Some((_, engine)) = routes.iter().find(|(p, _)| p.is_empty()) {
            return Err(TTSError::InvalidConfiguration(format!(
                "empty voice prefix registered by {engine}"
            )));
        }
        for (i, (a, engine_a)) in routes.iter().enumerate() {
            for (b, engine_b) in routes.iter().skip(i + 1) {
                if engine_a != engine_b && (a.starts_with(b) || b.starts_with(a)) {
                    return Err(TTSError::InvalidConfiguration(format!(
                        "voice prefix '{a}' ({engine_a}) overlaps '{b}' ({engine_b})"
                    )));
                }
            }
        }

        routes.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));
        info!(
            backends = local.len() + 1,
            prefixes = routes.len(),
            "Backend router ready"
        );

        Ok(Self {
            routes,
            default: RwLock::new(default),
            local,
        })
    }

    /// Engine that serves `voice_id`. Pure lookup.
    pub fn route(&self, voice_id: &str) -> Engine {
        self.routes
            .iter()
            .find(|(prefix, engine)| voice_id.starts_with(prefix) && self.has_engine(*engine))
            .map(|(_, engine)| *engine)
            .unwrap_or(Engine::Cloud)
    }

    /// Backend that serves `voice_id`, together with its engine.
    pub fn resolve(&self, voice_id: &str) -> (Engine, SharedBackend) {
        let engine = self.route(voice_id);
        debug!(voice_id = voice_id, engine = %engine, "Resolved voice");
        (engine, self.backend_or_default(engine))
    }

    pub fn has_engine(&self, engine: Engine) -> bool {
        engine == Engine::Cloud || self.local.contains_key(&engine)
    }

    pub fn backend(&self, engine: Engine) -> Option<SharedBackend> {
        if engine == Engine::Cloud {
            return Some(self.default.read().clone());
        }
        self.local.get(&engine).map(|slot| slot.read().clone())
    }

    fn backend_or_default(&self, engine: Engine) -> SharedBackend {
        self.local
            .get(&engine)
            .map(|slot| slot.read().clone())
            .unwrap_or_else(|| self.default.read().clone())
    }

    /// Registered engines, cloud first.
    pub fn engines(&self) -> Vec<Engine> {
        Engine::ALL
            .into_iter()
            .filter(|engine| self.has_engine(*engine))
            .collect()
    }

    /// Current backend of every registered engine.
    pub fn backends(&self) -> Vec<SharedBackend> {
        self.engines()
            .into_iter()
            .filter_map(|engine| self.backend(engine))
            .collect()
    }

    /// Swap in a new instance for an already registered engine.
    ///
    /// Returns the previous instance, or `None` when the engine was never
    /// registered.
    pub fn replace(&self, backend: SharedBackend) -> Option<SharedBackend> {
        let engine = backend.engine();
        let slot = if engine == Engine::Cloud {
            &self.default
        } else {
            match self.local.get(&engine) {
                Some(slot) => slot,
                None => return None,
            }
        };
        let previous = std::mem::replace(&mut *slot.write(), backend);
        info!(engine = %engine, "Backend replaced");
        Some(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tts::{SynthesisBackend, SynthesisRequest};
    use crate::core::voice::VoiceDescriptor;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Named {
        engine: Engine,
        prefixes: &'static [&'static str],
        tag: &'static str,
    }

    #[async_trait]
    impl SynthesisBackend for Named {
        fn engine(&self) -> Engine {
            self.engine
        }

        fn voice_prefixes(&self) -> &'static [&'static str] {
            self.prefixes
        }

        async fn list_voices(&self) -> TTSResult<Vec<VoiceDescriptor>> {
            Ok(Vec::new())
        }

        async fn synthesize(&self, _request: SynthesisRequest<'_>) -> TTSResult<String> {
            Ok(self.tag.to_string())
        }
    }

    fn named(engine: Engine, tag: &'static str) -> SharedBackend {
        Arc::new(Named {
            engine,
            prefixes: engine.voice_prefixes(),
            tag,
        })
    }

    fn full_router() -> BackendRouter {
        BackendRouter::new(
            named(Engine::Cloud, "polly"),
            vec![
                named(Engine::BaseLocal, "xtts"),
                named(Engine::RegionalLocal, "vixtts"),
                named(Engine::MultiSpeakerLocal, "kokoro"),
                named(Engine::PipelineLocal, "indic"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_route_by_prefix() {
        let router = full_router();

        assert_eq!(router.route("xtts_en_male"), Engine::BaseLocal);
        assert_eq!(router.route("vi_xtts_female"), Engine::RegionalLocal);
        assert_eq!(router.route("vixtts_male"), Engine::RegionalLocal);
        assert_eq!(router.route("kokoro_af_heart"), Engine::MultiSpeakerLocal);
        assert_eq!(router.route("indic_hi_rohit"), Engine::PipelineLocal);
    }

    #[test]
    fn test_unmatched_routes_to_cloud() {
        let router = full_router();

        assert_eq!(router.route("Joanna"), Engine::Cloud);
        assert_eq!(router.route(""), Engine::Cloud);
        assert_eq!(router.route("XTTS_en_male"), Engine::Cloud);
    }

    #[test]
    fn test_missing_local_engine_falls_back_to_cloud() {
        let router = BackendRouter::new(named(Engine::Cloud, "polly"), vec![]).unwrap();

        assert_eq!(router.route("xtts_en_male"), Engine::Cloud);
        assert_eq!(router.engines(), vec![Engine::Cloud]);
    }

    #[test]
    fn test_overlapping_prefixes_rejected() {
        let clash: SharedBackend = Arc::new(Named {
            engine: Engine::PipelineLocal,
            prefixes: &["xtts"],
            tag: "clash",
        });
        let result = BackendRouter::new(
            named(Engine::Cloud, "polly"),
            vec![named(Engine::BaseLocal, "xtts"), clash],
        );

        assert!(matches!(result, Err(TTSError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_non_cloud_default_rejected() {
        assert!(BackendRouter::new(named(Engine::BaseLocal, "xtts"), vec![]).is_err());
    }

    #[test]
    fn test_duplicate_engine_rejected() {
        let result = BackendRouter::new(
            named(Engine::Cloud, "polly"),
            vec![named(Engine::BaseLocal, "a"), named(Engine::BaseLocal, "b")],
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_replace_swaps_instance() {
        let router = full_router();
        let voice = crate::core::voice::VoiceIdentifier::parse("xtts_en_male", Engine::BaseLocal)
            .unwrap();
        let request = SynthesisRequest {
            text: "hi",
            voice: &voice,
            session_id: "s",
        };

        let previous = router.replace(named(Engine::BaseLocal, "xtts-2")).unwrap();
        assert_eq!(previous.synthesize(request).await.unwrap(), "xtts");

        let (_, current) = router.resolve("xtts_en_male");
        assert_eq!(current.synthesize(request).await.unwrap(), "xtts-2");
    }

    #[test]
    fn test_replace_unregistered_engine_is_rejected() {
        let router = BackendRouter::new(named(Engine::Cloud, "polly"), vec![]).unwrap();
        assert!(router.replace(named(Engine::PipelineLocal, "indic")).is_none());
    }
}
