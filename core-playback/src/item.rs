//! # Media Items and Playlists
//!
//! A [`MediaItem`] describes one thing to present: its kind, where it comes
//! from and how the engine should move past it. Items are immutable once
//! they are part of a [`Playlist`]; a playlist is replaced wholesale on
//! reload, never edited in place.
//!
//! Both types deserialize from JSON so a host can feed parsed playlist files
//! straight in:
//!
//! ```json
//! [
//!   { "id": "intro", "kind": "image", "source": "slides/intro.png", "duration_secs": 5.0, "transition": "auto" },
//!   { "id": "chorus", "kind": "image", "layers": ["backdrop.png", "lyrics/chorus.png"] },
//!   { "id": "clip", "kind": "video", "source": "media/clip.mp4", "transition": "auto", "loop_to": 0 }
//! ]
//! ```

use crate::error::{PlaybackError, Result};
use bridge_traits::media::MediaKind;
use core_runtime::config::AdvanceMode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Transition Mode
// ============================================================================

/// How the engine moves past an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionMode {
    /// Advance on its own once the item's duration elapses.
    Auto,
    /// Wait for the operator.
    Manual,
    /// Use the engine-wide default.
    #[default]
    Inherit,
}

impl TransitionMode {
    /// Resolves `Inherit` against the engine default.
    pub fn resolve(self, default: AdvanceMode) -> AdvanceMode {
        match self {
            TransitionMode::Auto => AdvanceMode::Auto,
            TransitionMode::Manual => AdvanceMode::Manual,
            TransitionMode::Inherit => default,
        }
    }
}

// ============================================================================
// Media Item
// ============================================================================

/// One entry of a playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Unique within its playlist.
    pub id: String,
    pub kind: MediaKind,
    /// File path, or `text:`-prefixed inline content for text items. Image
    /// items with `layers` may leave it empty.
    #[serde(default)]
    pub source: String,
    /// Images composited bottom to top. Only meaningful for image items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<String>,
    /// Explicit display duration. Takes precedence over the media's own
    /// length when the item advances automatically.
    #[serde(
        default,
        rename = "duration_secs",
        with = "duration_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_duration_hint: Option<Duration>,
    #[serde(default)]
    pub transition: TransitionMode,
    /// Index to continue from when this item advances automatically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_to: Option<usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl MediaItem {
    pub fn new(id: impl Into<String>, kind: MediaKind, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            source: source.into(),
            layers: Vec::new(),
            display_duration_hint: None,
            transition: TransitionMode::default(),
            loop_to: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Inline text slide; the body is carried in the source.
    pub fn text(id: impl Into<String>, body: &str) -> Self {
        Self::new(id, MediaKind::Text, format!("{INLINE_TEXT_PREFIX}{body}"))
    }

    /// Image slide composited from `layers`, first layer at the bottom.
    pub fn layered<I, S>(id: impl Into<String>, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut item = Self::new(id, MediaKind::Image, String::new());
        item.layers = layers.into_iter().map(Into::into).collect();
        item
    }

    pub fn with_duration_hint(mut self, hint: Duration) -> Self {
        self.display_duration_hint = Some(hint);
        self
    }

    pub fn with_transition(mut self, transition: TransitionMode) -> Self {
        self.transition = transition;
        self
    }

    pub fn with_loop_to(mut self, target: usize) -> Self {
        self.loop_to = Some(target);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Duration hint, ignoring a zero hint (which means "no timer").
    pub fn duration_hint(&self) -> Option<Duration> {
        self.display_duration_hint.filter(|hint| !hint.is_zero())
    }

    /// Images to draw for this item, bottom first. `layers` wins over
    /// `source`; empty when neither is set.
    pub fn image_layers(&self) -> Vec<&str> {
        if !self.layers.is_empty() {
            self.layers.iter().map(String::as_str).collect()
        } else if self.source.is_empty() {
            Vec::new()
        } else {
            vec![self.source.as_str()]
        }
    }

    /// Inline body when the source is `text:`-prefixed.
    pub fn inline_text(&self) -> Option<&str> {
        self.source.strip_prefix(INLINE_TEXT_PREFIX)
    }
}

/// Source prefix marking inline text content.
pub const INLINE_TEXT_PREFIX: &str = "text:";

/// Serde helper storing an optional duration as fractional seconds.
mod duration_secs {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        match Option::<f64>::deserialize(deserializer)? {
            None => Ok(None),
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid duration: {secs} seconds"))),
        }
    }
}

// ============================================================================
// Playlist
// ============================================================================

/// Ordered, immutable sequence of items with unique ids.
///
/// Cloning is cheap; clones share the same items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<MediaItem>", into = "Vec<MediaItem>")]
pub struct Playlist {
    items: Arc<[MediaItem]>,
}

impl Playlist {
    /// Builds a playlist, rejecting duplicate item ids.
    pub fn new(items: Vec<MediaItem>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id.as_str()) {
                return Err(PlaybackError::DuplicateItemId(item.id.clone()));
            }
        }
        Ok(Self {
            items: items.into(),
        })
    }

    pub fn empty() -> Self {
        Self {
            items: Arc::from(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MediaItem> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaItem> {
        self.items.iter()
    }

    /// Index of the item with the given id.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }
}

impl Default for Playlist {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<Vec<MediaItem>> for Playlist {
    type Error = PlaybackError;

    fn try_from(items: Vec<MediaItem>) -> Result<Self> {
        Playlist::new(items)
    }
}

impl From<Playlist> for Vec<MediaItem> {
    fn from(playlist: Playlist) -> Self {
        playlist.items.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_resolution() {
        assert_eq!(
            TransitionMode::Inherit.resolve(AdvanceMode::Auto),
            AdvanceMode::Auto
        );
        assert_eq!(
            TransitionMode::Inherit.resolve(AdvanceMode::Manual),
            AdvanceMode::Manual
        );
        assert_eq!(
            TransitionMode::Manual.resolve(AdvanceMode::Auto),
            AdvanceMode::Manual
        );
        assert_eq!(
            TransitionMode::Auto.resolve(AdvanceMode::Manual),
            AdvanceMode::Auto
        );
    }

    #[test]
    fn test_item_from_json() {
        let json = r#"{
            "id": "intro",
            "kind": "image",
            "source": "slides/intro.png",
            "duration_secs": 2.5,
            "transition": "auto",
            "loop_to": 3,
            "metadata": { "title": "Welcome" }
        }"#;

        let item: MediaItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, "intro");
        assert_eq!(item.kind, MediaKind::Image);
        assert_eq!(item.display_duration_hint, Some(Duration::from_millis(2500)));
        assert_eq!(item.transition, TransitionMode::Auto);
        assert_eq!(item.loop_to, Some(3));
        assert_eq!(item.metadata.get("title").map(String::as_str), Some("Welcome"));
    }

    #[test]
    fn test_item_json_defaults() {
        let item: MediaItem =
            serde_json::from_str(r#"{"id":"a","kind":"video","source":"a.mp4"}"#).unwrap();
        assert_eq!(item.transition, TransitionMode::Inherit);
        assert!(item.display_duration_hint.is_none());
        assert!(item.loop_to.is_none());
        assert!(item.metadata.is_empty());
    }

    #[test]
    fn test_negative_duration_rejected() {
        let result: std::result::Result<MediaItem, _> = serde_json::from_str(
            r#"{"id":"a","kind":"image","source":"a.png","duration_secs":-1.0}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_hint_means_no_timer() {
        let item = MediaItem::new("a", MediaKind::Image, "a.png").with_duration_hint(Duration::ZERO);
        assert!(item.duration_hint().is_none());
    }

    #[test]
    fn test_inline_text() {
        let item = MediaItem::text("note", "Hello audience");
        assert_eq!(item.kind, MediaKind::Text);
        assert_eq!(item.inline_text(), Some("Hello audience"));

        let file = MediaItem::new("file", MediaKind::Text, "notes/a.txt");
        assert!(file.inline_text().is_none());
    }

    #[test]
    fn test_layered_image_from_json() {
        let item: MediaItem = serde_json::from_str(
            r#"{"id":"chorus","kind":"image","layers":["backdrop.png","lyrics/chorus.png"]}"#,
        )
        .unwrap();
        assert!(item.source.is_empty());
        assert_eq!(item.image_layers(), vec!["backdrop.png", "lyrics/chorus.png"]);
        assert_eq!(
            item,
            MediaItem::layered("chorus", ["backdrop.png", "lyrics/chorus.png"])
        );
    }

    #[test]
    fn test_image_layers_fall_back_to_source() {
        let single = MediaItem::new("a", MediaKind::Image, "a.png");
        assert_eq!(single.image_layers(), vec!["a.png"]);

        let blank: MediaItem =
            serde_json::from_str(r#"{"id":"blank","kind":"image"}"#).unwrap();
        assert!(blank.image_layers().is_empty());

        let json = serde_json::to_string(&single).unwrap();
        assert!(!json.contains("layers"));
    }

    #[test]
    fn test_playlist_rejects_duplicate_ids() {
        let result = Playlist::new(vec![
            MediaItem::new("a", MediaKind::Image, "a.png"),
            MediaItem::new("b", MediaKind::Image, "b.png"),
            MediaItem::new("a", MediaKind::Video, "a.mp4"),
        ]);
        assert!(matches!(result, Err(PlaybackError::DuplicateItemId(id)) if id == "a"));
    }

    #[test]
    fn test_playlist_from_json() {
        let json = r#"[
            {"id":"a","kind":"image","source":"a.png"},
            {"id":"b","kind":"text","source":"text:Hi"}
        ]"#;
        let playlist: Playlist = serde_json::from_str(json).unwrap();
        assert_eq!(playlist.len(), 2);
        assert_eq!(playlist.position_of("b"), Some(1));
        assert!(playlist.position_of("zzz").is_none());

        let dup = r#"[
            {"id":"a","kind":"image","source":"a.png"},
            {"id":"a","kind":"image","source":"b.png"}
        ]"#;
        assert!(serde_json::from_str::<Playlist>(dup).is_err());
    }

    #[test]
    fn test_empty_playlist_is_constructible() {
        let playlist = Playlist::new(Vec::new()).unwrap();
        assert!(playlist.is_empty());
        assert_eq!(playlist, Playlist::empty());
    }
}
