//! Normalized input contract
//!
//! Every player — keyboard, touch, gamepad, or bot — is driven through the
//! same per-tick [`InputSnapshot`]. The core never sees raw events; the
//! platform layer implements [`InputSource`] and the orchestrator polls it
//! once per player per tick. Bots synthesize their snapshot inline.

use serde::{Deserialize, Serialize};

use super::bot::BotBrain;

/// One player's normalized input for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    /// Horizontal movement intent, -1..=1
    pub x: f32,
    /// Vertical intent, -1..=1 (positive = down; sustained down while
    /// grounded enters the prone stance, down in flight descends)
    pub y: f32,
    /// Aim direction (right stick); overrides facing when nonzero
    pub aim_x: f32,
    pub aim_y: f32,
    pub jump: bool,
    pub attack: bool,
    pub shield: bool,
    /// Lobby join request (gamepad slots)
    pub join: bool,
}

/// Which physical source feeds a human player's snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    /// WASD cluster (local PvP, left side)
    KeyboardWasd,
    /// Arrow-key cluster (local PvP, right side)
    KeyboardArrows,
    /// Merged keyboard + touch + first gamepad (single-player)
    Universal,
    /// A dedicated gamepad slot (controller lobby)
    Gamepad(u8),
}

/// Pull-based input collaborator implemented by the platform layer
pub trait InputSource {
    /// Snapshot for one player this tick. Must be side-effect free from the
    /// sim's point of view; the same call within a tick returns the same
    /// value.
    fn snapshot(&self, player_id: usize, kind: InputKind) -> InputSnapshot;

    /// Whether a pause toggle was requested this tick (consumed by caller)
    fn pause_requested(&self) -> bool {
        false
    }
}

/// What drives a player: a human input source or an in-process bot.
///
/// Bots are not a separate entity type; they produce the same snapshot the
/// physics and combat paths consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Controller {
    Human(InputKind),
    Bot(BotBrain),
}

impl Controller {
    pub fn is_bot(&self) -> bool {
        matches!(self, Controller::Bot(_))
    }
}

/// Always-neutral input source for tests and headless runs
pub struct NullInput;

impl InputSource for NullInput {
    fn snapshot(&self, _player_id: usize, _kind: InputKind) -> InputSnapshot {
        InputSnapshot::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot_is_neutral() {
        let snap = InputSnapshot::default();
        assert_eq!(snap.x, 0.0);
        assert!(!snap.jump && !snap.attack && !snap.shield && !snap.join);
    }

    #[test]
    fn test_null_source_returns_neutral() {
        let src = NullInput;
        assert_eq!(
            src.snapshot(0, InputKind::Universal),
            InputSnapshot::default()
        );
        assert!(!src.pause_requested());
    }
}
