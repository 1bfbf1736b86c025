//! Operator commands accepted by the orchestrator.

use crate::item::Playlist;
use core_runtime::config::KeyAction;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Next,
    Previous,
    JumpTo(usize),
    TogglePause,
    /// Replace the playlist and start from its first item.
    Reload(Playlist),
    /// Blank the display and release the current item.
    Clear,
    /// Present the item under the cursor again after `Clear`.
    Show,
    Shutdown,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Next => "next",
            Command::Previous => "previous",
            Command::JumpTo(_) => "jump_to",
            Command::TogglePause => "toggle_pause",
            Command::Reload(_) => "reload",
            Command::Clear => "clear",
            Command::Show => "show",
            Command::Shutdown => "shutdown",
        }
    }
}

impl From<KeyAction> for Command {
    fn from(action: KeyAction) -> Self {
        match action {
            KeyAction::Next => Command::Next,
            KeyAction::Previous => Command::Previous,
            KeyAction::Show => Command::Show,
            KeyAction::Clear => Command::Clear,
            KeyAction::TogglePause => Command::TogglePause,
            KeyAction::Quit => Command::Shutdown,
        }
    }
}
