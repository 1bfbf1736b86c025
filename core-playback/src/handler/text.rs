//! Text slide handler.

use super::{CompletionSignal, HandlerPhase, MediaHandler, NaturalDuration};
use crate::error::{PlaybackError, Result};
use crate::item::MediaItem;
use async_trait::async_trait;
use bridge_traits::media::{MediaKind, MediaProbe};
use bridge_traits::surface::RenderCue;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Default)]
struct TextState {
    phase: HandlerPhase,
    body: String,
    hint: Option<Duration>,
}

/// Presents a text slide. The body comes from the source itself when it is
/// `text:`-prefixed, otherwise from the file the source names.
pub struct TextHandler {
    probe: Arc<dyn MediaProbe>,
    state: Mutex<TextState>,
}

impl TextHandler {
    pub fn new(probe: Arc<dyn MediaProbe>) -> Self {
        Self {
            probe,
            state: Mutex::new(TextState::default()),
        }
    }

    pub fn phase(&self) -> HandlerPhase {
        self.state.lock().phase
    }

    async fn read_body(&self, item: &MediaItem) -> Result<String> {
        if let Some(inline) = item.inline_text() {
            return Ok(inline.to_string());
        }

        let info = self
            .probe
            .probe(MediaKind::Text, &item.source)
            .await
            .map_err(|err| PlaybackError::load_failure(&item.id, err))?;

        info.body
            .ok_or_else(|| PlaybackError::load_failure(&item.id, "no text content"))
    }
}

#[async_trait]
impl MediaHandler for TextHandler {
    fn kind(&self) -> MediaKind {
        MediaKind::Text
    }

    async fn load(&self, item: &MediaItem) -> Result<()> {
        self.state.lock().phase.begin_load(&item.id)?;

        let body = match self.read_body(item).await {
            Ok(body) => body,
            Err(err) => {
                self.state.lock().phase.fail();
                return Err(err);
            }
        };

        let mut state = self.state.lock();
        state.phase.finish_load(&item.id)?;
        debug!(item_id = %item.id, chars = body.chars().count(), "Text ready");
        state.body = body;
        state.hint = item.duration_hint();
        Ok(())
    }

    fn activate(&self, _finished: CompletionSignal) -> Result<RenderCue> {
        let mut state = self.state.lock();
        state.phase.begin_activate()?;
        Ok(RenderCue::Text {
            body: state.body.clone(),
        })
    }

    fn deactivate(&self) {
        self.state.lock().phase.retire();
    }

    fn natural_duration(&self) -> NaturalDuration {
        self.state.lock().hint.into()
    }
}
