//! # Transition Policy
//!
//! Decides whether and when an active item advances on its own.
//!
//! - Manual items (explicit or inherited) wait for the operator.
//! - Auto items use their duration hint when one is set. Otherwise they use
//!   the media's natural duration plus the configured grace period.
//! - An auto item with neither is treated as manual and a configuration
//!   warning is logged.
//!
//! For video and audio with a known length the deadline races the handler's
//! own finished signal; whichever arrives first advances.

use crate::handler::NaturalDuration;
use crate::item::MediaItem;
use core_runtime::config::{AdvanceMode, PlaybackSettings};
use std::time::Duration;
use tracing::warn;

/// Where an automatic advance delay came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelaySource {
    /// The item's explicit duration hint.
    Hint,
    /// The media's own length plus grace.
    Natural,
}

/// Result of [`TransitionPolicy::plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvancePlan {
    /// Stay on the item until the operator moves on.
    Manual,
    /// Advance automatically after `delay`.
    After {
        delay: Duration,
        source: DelaySource,
        /// Also advance when the handler reports end of media.
        race_finished: bool,
    },
}

impl AdvancePlan {
    pub fn is_auto(&self) -> bool {
        matches!(self, AdvancePlan::After { .. })
    }

    pub fn delay(&self) -> Option<Duration> {
        match self {
            AdvancePlan::After { delay, .. } => Some(*delay),
            AdvancePlan::Manual => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPolicy {
    default_mode: AdvanceMode,
    grace: Duration,
}

impl TransitionPolicy {
    pub fn new(default_mode: AdvanceMode, grace: Duration) -> Self {
        Self {
            default_mode,
            grace,
        }
    }

    pub fn from_settings(settings: &PlaybackSettings) -> Self {
        Self::new(settings.default_transition, settings.auto_advance_grace)
    }

    /// Resolved mode of `item` under this policy.
    pub fn mode_for(&self, item: &MediaItem) -> AdvanceMode {
        item.transition.resolve(self.default_mode)
    }

    /// Plans the advance of an item that has just become active.
    pub fn plan(
        &self,
        item: &MediaItem,
        natural: NaturalDuration,
        emits_finished: bool,
    ) -> AdvancePlan {
        if self.mode_for(item) == AdvanceMode::Manual {
            return AdvancePlan::Manual;
        }

        let race_finished = emits_finished && natural.is_finite();

        if let Some(hint) = item.duration_hint() {
            return AdvancePlan::After {
                delay: hint,
                source: DelaySource::Hint,
                race_finished,
            };
        }

        match natural {
            NaturalDuration::Finite(length) if !length.is_zero() => AdvancePlan::After {
                delay: length + self.grace,
                source: DelaySource::Natural,
                race_finished,
            },
            _ => {
                warn!(
                    item_id = %item.id,
                    kind = %item.kind,
                    "Auto transition without a known duration; waiting for the operator"
                );
                AdvancePlan::Manual
            }
        }
    }
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        Self::from_settings(&PlaybackSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::TransitionMode;
    use bridge_traits::media::MediaKind;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_manual_items_never_plan_a_deadline() {
        let policy = TransitionPolicy::new(AdvanceMode::Auto, Duration::ZERO);
        let item = MediaItem::new("a", MediaKind::Video, "a.mp4")
            .with_transition(TransitionMode::Manual)
            .with_duration_hint(secs(3));

        assert_eq!(
            policy.plan(&item, NaturalDuration::Finite(secs(12)), true),
            AdvancePlan::Manual
        );
    }

    #[test]
    fn test_inherit_uses_default_mode() {
        let item = MediaItem::new("a", MediaKind::Image, "a.png").with_duration_hint(secs(5));

        let manual = TransitionPolicy::new(AdvanceMode::Manual, Duration::ZERO);
        assert_eq!(
            manual.plan(&item, NaturalDuration::Indefinite, false),
            AdvancePlan::Manual
        );

        let auto = TransitionPolicy::new(AdvanceMode::Auto, Duration::ZERO);
        assert_eq!(
            auto.plan(&item, NaturalDuration::Indefinite, false).delay(),
            Some(secs(5))
        );
    }

    #[test]
    fn test_hint_wins_over_natural_duration() {
        let policy = TransitionPolicy::new(AdvanceMode::Auto, secs(1));
        let item = MediaItem::new("a", MediaKind::Video, "a.mp4").with_duration_hint(secs(4));

        assert_eq!(
            policy.plan(&item, NaturalDuration::Finite(secs(12)), true),
            AdvancePlan::After {
                delay: secs(4),
                source: DelaySource::Hint,
                race_finished: true,
            }
        );
    }

    #[test]
    fn test_natural_duration_gets_grace() {
        let policy = TransitionPolicy::new(AdvanceMode::Auto, Duration::from_millis(500));
        let item = MediaItem::new("a", MediaKind::Audio, "a.mp3");

        assert_eq!(
            policy.plan(&item, NaturalDuration::Finite(secs(12)), true),
            AdvancePlan::After {
                delay: Duration::from_millis(12_500),
                source: DelaySource::Natural,
                race_finished: true,
            }
        );
    }

    #[test]
    fn test_auto_without_duration_falls_back_to_manual() {
        let policy = TransitionPolicy::new(AdvanceMode::Auto, Duration::ZERO);

        let image = MediaItem::new("a", MediaKind::Image, "a.png");
        assert_eq!(
            policy.plan(&image, NaturalDuration::Indefinite, false),
            AdvancePlan::Manual
        );

        let video = MediaItem::new("b", MediaKind::Video, "b.mp4");
        assert_eq!(
            policy.plan(&video, NaturalDuration::Indefinite, true),
            AdvancePlan::Manual
        );
    }

    #[test]
    fn test_static_media_does_not_race() {
        let policy = TransitionPolicy::new(AdvanceMode::Auto, Duration::ZERO);
        let item = MediaItem::new("a", MediaKind::Image, "a.png").with_duration_hint(secs(5));

        let plan = policy.plan(&item, NaturalDuration::Finite(secs(5)), false);
        assert!(matches!(
            plan,
            AdvancePlan::After {
                race_finished: false,
                ..
            }
        ));
        assert!(plan.is_auto());
    }
}
