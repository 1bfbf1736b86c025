//! Handler factories keyed by media kind.

use super::{AudioHandler, ImageHandler, MediaHandler, TextHandler, VideoHandler};
use crate::device::DeviceArbiter;
use crate::error::{PlaybackError, Result};
use bridge_traits::media::{MediaKind, MediaProbe};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Creates a fresh handler for one item.
pub type HandlerFactory = Arc<dyn Fn() -> Arc<dyn MediaHandler> + Send + Sync>;

/// Maps each media kind to the factory that builds its handlers.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    factories: HashMap<MediaKind, HandlerFactory>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the built-in handlers for all four media kinds.
    pub fn with_defaults(probe: Arc<dyn MediaProbe>, arbiter: DeviceArbiter) -> Self {
        let mut registry = Self::new();

        let image_probe = Arc::clone(&probe);
        registry.register(MediaKind::Image, move || -> Arc<dyn MediaHandler> {
            Arc::new(ImageHandler::new(Arc::clone(&image_probe)))
        });

        let text_probe = Arc::clone(&probe);
        registry.register(MediaKind::Text, move || -> Arc<dyn MediaHandler> {
            Arc::new(TextHandler::new(Arc::clone(&text_probe)))
        });

        let audio_probe = Arc::clone(&probe);
        let audio_arbiter = arbiter.clone();
        registry.register(MediaKind::Audio, move || -> Arc<dyn MediaHandler> {
            Arc::new(AudioHandler::new(
                Arc::clone(&audio_probe),
                audio_arbiter.clone(),
            ))
        });

        registry.register(MediaKind::Video, move || -> Arc<dyn MediaHandler> {
            Arc::new(VideoHandler::new(Arc::clone(&probe), arbiter.clone()))
        });

        registry
    }

    /// Registers (or replaces) the factory for `kind`.
    pub fn register<F>(&mut self, kind: MediaKind, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn MediaHandler> + Send + Sync + 'static,
    {
        self.factories.insert(kind, Arc::new(factory));
        self
    }

    /// Builds a new handler for `kind`.
    pub fn create(&self, kind: MediaKind) -> Result<Arc<dyn MediaHandler>> {
        self.factories
            .get(&kind)
            .map(|factory| factory())
            .ok_or(PlaybackError::NoHandlerRegistered(kind))
    }

    pub fn supports(&self, kind: MediaKind) -> bool {
        self.factories.contains_key(&kind)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.factories.keys().copied().collect();
        kinds.sort();
        f.debug_struct("HandlerRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::media::MediaInfo;

    struct NullProbe;

    #[async_trait]
    impl MediaProbe for NullProbe {
        async fn probe(
            &self,
            _kind: MediaKind,
            _source: &str,
        ) -> bridge_traits::error::Result<MediaInfo> {
            Ok(MediaInfo::default())
        }
    }

    #[test]
    fn test_defaults_cover_every_kind() {
        let registry = HandlerRegistry::with_defaults(Arc::new(NullProbe), DeviceArbiter::new());
        for kind in MediaKind::ALL {
            assert!(registry.supports(kind));
            assert_eq!(registry.create(kind).unwrap().kind(), kind);
        }
    }

    #[test]
    fn test_missing_factory() {
        let registry = HandlerRegistry::new();
        let err = registry.create(MediaKind::Video).err().unwrap();
        assert!(matches!(err, PlaybackError::NoHandlerRegistered(MediaKind::Video)));
        assert!(err.is_load_failure());
    }

    #[test]
    fn test_each_create_builds_a_new_handler() {
        let registry = HandlerRegistry::with_defaults(Arc::new(NullProbe), DeviceArbiter::new());
        let first = registry.create(MediaKind::Image).unwrap();
        let second = registry.create(MediaKind::Image).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_register_replaces_factory() {
        let mut registry = HandlerRegistry::with_defaults(Arc::new(NullProbe), DeviceArbiter::new());
        registry.register(MediaKind::Text, || -> Arc<dyn MediaHandler> {
            Arc::new(ImageHandler::new(Arc::new(NullProbe)))
        });
        assert_eq!(
            registry.create(MediaKind::Text).unwrap().kind(),
            MediaKind::Image
        );
        assert!(format!("{registry:?}").contains("Text"));
    }
}
