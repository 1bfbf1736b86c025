//! Playlist sanity checks.
//!
//! Issues found here are warnings. A playlist with issues still loads; the
//! engine reports them with the `PlaylistLoaded` event so the operator can
//! fix the playlist file.

use crate::item::Playlist;
use bridge_traits::media::MediaKind;
use core_runtime::config::{AdvanceMode, EndBehavior, PlaybackSettings};
use std::fmt;

/// A suspicious playlist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistIssue {
    /// `loop_to` points past the end of the playlist. It is ignored.
    LoopTargetOutOfRange {
        item_id: String,
        target: usize,
        len: usize,
    },
    /// `loop_to` points at the item itself.
    SelfLoop { item_id: String },
    /// `loop_to` is set on an item that never advances on its own.
    InactiveLoop { item_id: String },
    /// The last item advances automatically but the playlist holds at the
    /// end, so the timer only reports the end of the playlist.
    IdleTimerOnLast { item_id: String },
    /// An auto image or text item has no duration hint and will wait for
    /// the operator.
    MissingDuration { item_id: String },
    /// An image item has neither a source nor layers; it shows a blank
    /// slide.
    NoImageLayers { item_id: String },
}

impl PlaylistIssue {
    pub fn item_id(&self) -> &str {
        match self {
            PlaylistIssue::LoopTargetOutOfRange { item_id, .. }
            | PlaylistIssue::SelfLoop { item_id }
            | PlaylistIssue::InactiveLoop { item_id }
            | PlaylistIssue::IdleTimerOnLast { item_id }
            | PlaylistIssue::MissingDuration { item_id }
            | PlaylistIssue::NoImageLayers { item_id } => item_id,
        }
    }
}

impl fmt::Display for PlaylistIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaylistIssue::LoopTargetOutOfRange {
                item_id,
                target,
                len,
            } => write!(
                f,
                "'{item_id}' loops to item {} but the playlist has {len} items",
                target + 1
            ),
            PlaylistIssue::SelfLoop { item_id } => write!(f, "'{item_id}' loops to itself"),
            PlaylistIssue::InactiveLoop { item_id } => write!(
                f,
                "'{item_id}' has a loop target but never advances automatically"
            ),
            PlaylistIssue::IdleTimerOnLast { item_id } => write!(
                f,
                "'{item_id}' is the last item; its timer only ends the playlist"
            ),
            PlaylistIssue::MissingDuration { item_id } => write!(
                f,
                "'{item_id}' is set to advance automatically but has no duration"
            ),
            PlaylistIssue::NoImageLayers { item_id } => {
                write!(f, "'{item_id}' is an image with no layers")
            }
        }
    }
}

/// Checks `playlist` against `settings` and returns every issue found, in
/// playlist order.
pub fn validate_playlist(playlist: &Playlist, settings: &PlaybackSettings) -> Vec<PlaylistIssue> {
    let mut issues = Vec::new();
    let len = playlist.len();

    for (index, item) in playlist.iter().enumerate() {
        if item.kind == MediaKind::Image && item.image_layers().is_empty() {
            issues.push(PlaylistIssue::NoImageLayers {
                item_id: item.id.clone(),
            });
        }

        let auto = item.transition.resolve(settings.default_transition) == AdvanceMode::Auto;
        let has_duration = item.duration_hint().is_some() || item.kind.is_timed();

        if auto && !has_duration {
            issues.push(PlaylistIssue::MissingDuration {
                item_id: item.id.clone(),
            });
        }

        let advances = auto && has_duration;

        if let Some(target) = item.loop_to {
            if target >= len {
                issues.push(PlaylistIssue::LoopTargetOutOfRange {
                    item_id: item.id.clone(),
                    target,
                    len,
                });
            } else if target == index {
                issues.push(PlaylistIssue::SelfLoop {
                    item_id: item.id.clone(),
                });
            }
            if !advances {
                issues.push(PlaylistIssue::InactiveLoop {
                    item_id: item.id.clone(),
                });
            }
        } else if advances && index + 1 == len && settings.end_of_playlist == EndBehavior::Hold {
            issues.push(PlaylistIssue::IdleTimerOnLast {
                item_id: item.id.clone(),
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{MediaItem, TransitionMode};
    use std::time::Duration;

    fn image(id: &str) -> MediaItem {
        MediaItem::new(id, MediaKind::Image, format!("{id}.png"))
    }

    fn auto_image(id: &str) -> MediaItem {
        image(id)
            .with_transition(TransitionMode::Auto)
            .with_duration_hint(Duration::from_secs(5))
    }

    #[test]
    fn test_clean_manual_playlist() {
        let playlist = Playlist::new(vec![image("a"), image("b"), image("c")]).unwrap();
        assert!(validate_playlist(&playlist, &PlaybackSettings::default()).is_empty());
    }

    #[test]
    fn test_loop_target_checks() {
        let playlist = Playlist::new(vec![
            auto_image("a").with_loop_to(7),
            auto_image("b").with_loop_to(1),
            image("c").with_loop_to(0),
        ])
        .unwrap();

        let issues = validate_playlist(&playlist, &PlaybackSettings::default());
        assert_eq!(
            issues,
            vec![
                PlaylistIssue::LoopTargetOutOfRange {
                    item_id: "a".into(),
                    target: 7,
                    len: 3,
                },
                PlaylistIssue::SelfLoop {
                    item_id: "b".into()
                },
                PlaylistIssue::InactiveLoop {
                    item_id: "c".into()
                },
            ]
        );
    }

    #[test]
    fn test_missing_duration_on_static_auto_item() {
        let playlist = Playlist::new(vec![
            image("a").with_transition(TransitionMode::Auto),
            MediaItem::new("b", MediaKind::Video, "b.mp4").with_transition(TransitionMode::Auto),
            image("c"),
        ])
        .unwrap();

        let issues = validate_playlist(&playlist, &PlaybackSettings::default());
        assert_eq!(
            issues,
            vec![PlaylistIssue::MissingDuration {
                item_id: "a".into()
            }]
        );
    }

    #[test]
    fn test_timer_on_last_item_depends_on_end_behavior() {
        let playlist = Playlist::new(vec![image("a"), auto_image("b")]).unwrap();

        let hold = validate_playlist(&playlist, &PlaybackSettings::default());
        assert_eq!(
            hold,
            vec![PlaylistIssue::IdleTimerOnLast {
                item_id: "b".into()
            }]
        );

        let settings = PlaybackSettings {
            end_of_playlist: EndBehavior::Wrap,
            ..Default::default()
        };
        assert!(validate_playlist(&playlist, &settings).is_empty());
    }

    #[test]
    fn test_inherited_auto_counts_as_auto() {
        let playlist = Playlist::new(vec![image("a"), image("b")]).unwrap();
        let settings = PlaybackSettings {
            default_transition: AdvanceMode::Auto,
            ..Default::default()
        };

        let issues = validate_playlist(&playlist, &settings);
        assert_eq!(issues.len(), 2);
        assert!(issues
            .iter()
            .all(|issue| matches!(issue, PlaylistIssue::MissingDuration { .. })));
    }

    #[test]
    fn test_image_without_layers() {
        let playlist = Playlist::new(vec![
            MediaItem::layered("stack", ["backdrop.png", "title.png"]),
            MediaItem::layered("empty", Vec::<String>::new()),
            image("single"),
        ])
        .unwrap();

        let issues = validate_playlist(&playlist, &PlaybackSettings::default());
        assert_eq!(
            issues,
            vec![PlaylistIssue::NoImageLayers {
                item_id: "empty".into()
            }]
        );
        assert_eq!(issues[0].to_string(), "'empty' is an image with no layers");
    }

    #[test]
    fn test_issue_messages_name_the_item() {
        let issue = PlaylistIssue::LoopTargetOutOfRange {
            item_id: "intro".into(),
            target: 4,
            len: 3,
        };
        assert_eq!(issue.item_id(), "intro");
        assert_eq!(
            issue.to_string(),
            "'intro' loops to item 5 but the playlist has 3 items"
        );
    }
}
