//! # Playlist Cursor
//!
//! Tracks the current position in a playlist. The cursor is a plain value
//! owned by the orchestrator; it never touches handlers or timers.
//!
//! Invariant: when the playlist is non-empty the current index is in
//! `0..len`; when it is empty the cursor is parked and has no position.

use crate::error::{PlaybackError, Result};
use crate::item::{MediaItem, Playlist};
use core_runtime::config::EndBehavior;

/// Outcome of [`PlaylistCursor::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved forward to the given index.
    Moved(usize),
    /// Went past the last item and continued from the first.
    Wrapped(usize),
    /// Already on the last item and the playlist holds at the end. The
    /// cursor did not move.
    AtEnd,
}

impl Advance {
    /// New index, if the cursor moved.
    pub fn index(self) -> Option<usize> {
        match self {
            Advance::Moved(index) | Advance::Wrapped(index) => Some(index),
            Advance::AtEnd => None,
        }
    }
}

/// Outcome of [`PlaylistCursor::retreat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retreat {
    Moved(usize),
    /// Already on the first item. Retreating never wraps.
    AtStart,
}

#[derive(Debug, Clone)]
pub struct PlaylistCursor {
    playlist: Playlist,
    current: Option<usize>,
    end_behavior: EndBehavior,
}

impl PlaylistCursor {
    /// Creates a parked cursor over an empty playlist.
    pub fn new(end_behavior: EndBehavior) -> Self {
        Self {
            playlist: Playlist::empty(),
            current: None,
            end_behavior,
        }
    }

    /// Creates a cursor positioned on the first item of `playlist`.
    pub fn with_playlist(playlist: Playlist, end_behavior: EndBehavior) -> Result<Self> {
        let mut cursor = Self::new(end_behavior);
        cursor.reset(playlist)?;
        Ok(cursor)
    }

    pub fn end_behavior(&self) -> EndBehavior {
        self.end_behavior
    }

    pub fn advance(&mut self) -> Advance {
        let Some(current) = self.current else {
            return Advance::AtEnd;
        };

        if current + 1 < self.playlist.len() {
            self.current = Some(current + 1);
            return Advance::Moved(current + 1);
        }

        match self.end_behavior {
            EndBehavior::Wrap => {
                self.current = Some(0);
                Advance::Wrapped(0)
            }
            EndBehavior::Hold => Advance::AtEnd,
        }
    }

    pub fn retreat(&mut self) -> Retreat {
        match self.current {
            Some(current) if current > 0 => {
                self.current = Some(current - 1);
                Retreat::Moved(current - 1)
            }
            _ => Retreat::AtStart,
        }
    }

    /// Moves to `index`. Out-of-range targets leave the cursor unchanged.
    pub fn jump_to(&mut self, index: usize) -> Result<usize> {
        if index >= self.playlist.len() {
            return Err(PlaybackError::OutOfRange {
                index,
                len: self.playlist.len(),
            });
        }
        self.current = Some(index);
        Ok(index)
    }

    /// Replaces the playlist and moves to its first item. An empty playlist
    /// is rejected and the previous playlist and position are kept.
    pub fn reset(&mut self, playlist: Playlist) -> Result<usize> {
        if playlist.is_empty() {
            return Err(PlaybackError::EmptyPlaylist);
        }
        self.playlist = playlist;
        self.current = Some(0);
        Ok(0)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_item(&self) -> Option<&MediaItem> {
        self.current.and_then(|index| self.playlist.get(index))
    }

    pub fn len(&self) -> usize {
        self.playlist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlist.is_empty()
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::media::MediaKind;

    fn playlist(len: usize) -> Playlist {
        Playlist::new(
            (0..len)
                .map(|i| MediaItem::new(format!("item-{i}"), MediaKind::Image, format!("{i}.png")))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_cursor_is_parked() {
        let mut cursor = PlaylistCursor::new(EndBehavior::Wrap);
        assert!(cursor.is_empty());
        assert_eq!(cursor.current_index(), None);
        assert!(cursor.current_item().is_none());
        assert_eq!(cursor.advance(), Advance::AtEnd);
        assert_eq!(cursor.retreat(), Retreat::AtStart);
        assert!(matches!(
            cursor.jump_to(0),
            Err(PlaybackError::OutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_index_stays_in_bounds_for_any_sequence() {
        for len in 1..10 {
            for end in [EndBehavior::Hold, EndBehavior::Wrap] {
                let mut cursor = PlaylistCursor::with_playlist(playlist(len), end).unwrap();
                for step in 0..(len * 3) {
                    match step % 5 {
                        0 | 1 | 3 => {
                            cursor.advance();
                        }
                        2 => {
                            cursor.retreat();
                        }
                        _ => {
                            let _ = cursor.jump_to(step % (len + 2));
                        }
                    }
                    let index = cursor.current_index().unwrap();
                    assert!(index < len, "index {index} escaped playlist of {len}");
                }
            }
        }
    }

    #[test]
    fn test_advance_from_last() {
        for len in 1..10 {
            let mut hold = PlaylistCursor::with_playlist(playlist(len), EndBehavior::Hold).unwrap();
            hold.jump_to(len - 1).unwrap();
            assert_eq!(hold.advance(), Advance::AtEnd);
            assert_eq!(hold.current_index(), Some(len - 1));

            let mut wrap = PlaylistCursor::with_playlist(playlist(len), EndBehavior::Wrap).unwrap();
            wrap.jump_to(len - 1).unwrap();
            assert_eq!(wrap.advance(), Advance::Wrapped(0));
            assert_eq!(wrap.current_index(), Some(0));
        }
    }

    #[test]
    fn test_retreat_from_first_never_wraps() {
        for end in [EndBehavior::Hold, EndBehavior::Wrap] {
            let mut cursor = PlaylistCursor::with_playlist(playlist(4), end).unwrap();
            assert_eq!(cursor.retreat(), Retreat::AtStart);
            assert_eq!(cursor.current_index(), Some(0));
        }
    }

    #[test]
    fn test_advance_then_retreat_round_trip() {
        let mut cursor = PlaylistCursor::with_playlist(playlist(5), EndBehavior::Hold).unwrap();
        assert_eq!(cursor.advance(), Advance::Moved(1));
        assert_eq!(cursor.advance(), Advance::Moved(2));
        assert_eq!(cursor.retreat(), Retreat::Moved(1));
        assert_eq!(cursor.current_item().unwrap().id, "item-1");
    }

    #[test]
    fn test_jump_out_of_range_leaves_cursor() {
        let mut cursor = PlaylistCursor::with_playlist(playlist(3), EndBehavior::Hold).unwrap();
        cursor.jump_to(2).unwrap();

        let err = cursor.jump_to(3).unwrap_err();
        assert!(matches!(err, PlaybackError::OutOfRange { index: 3, len: 3 }));
        assert_eq!(cursor.current_index(), Some(2));
    }

    #[test]
    fn test_reset_with_empty_playlist_keeps_state() {
        let mut cursor = PlaylistCursor::with_playlist(playlist(3), EndBehavior::Hold).unwrap();
        cursor.jump_to(1).unwrap();

        assert!(matches!(
            cursor.reset(Playlist::empty()),
            Err(PlaybackError::EmptyPlaylist)
        ));
        assert_eq!(cursor.len(), 3);
        assert_eq!(cursor.current_index(), Some(1));
    }

    #[test]
    fn test_reset_moves_to_first_item() {
        let mut cursor = PlaylistCursor::with_playlist(playlist(3), EndBehavior::Hold).unwrap();
        cursor.jump_to(2).unwrap();

        assert_eq!(cursor.reset(playlist(6)).unwrap(), 0);
        assert_eq!(cursor.len(), 6);
        assert_eq!(cursor.current_index(), Some(0));
    }

    #[test]
    fn test_with_playlist_rejects_empty() {
        assert!(matches!(
            PlaylistCursor::with_playlist(Playlist::empty(), EndBehavior::Hold),
            Err(PlaybackError::EmptyPlaylist)
        ));
    }

    #[test]
    fn test_single_item_playlist() {
        let mut hold = PlaylistCursor::with_playlist(playlist(1), EndBehavior::Hold).unwrap();
        assert_eq!(hold.advance(), Advance::AtEnd);

        let mut wrap = PlaylistCursor::with_playlist(playlist(1), EndBehavior::Wrap).unwrap();
        assert_eq!(wrap.advance(), Advance::Wrapped(0));
        assert_eq!(Advance::Wrapped(0).index(), Some(0));
        assert_eq!(Advance::AtEnd.index(), None);
    }
}
