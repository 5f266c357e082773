//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (one tick per frame, per-tick motion constants)
//! - Seeded RNG only
//! - Stable iteration order (players by slot, entities by ID)
//! - No rendering or platform dependencies

pub mod bot;
pub mod combat;
pub mod geom;
pub mod input;
pub mod level;
pub mod player;
pub mod state;
pub mod tick;
pub mod weapon;

pub use bot::{BotBrain, Difficulty};
pub use geom::Rect;
pub use input::{Controller, InputKind, InputSnapshot, InputSource, NullInput};
pub use level::{Level, Material, Platform, PlatformKind};
pub use player::{Player, PlayerId};
pub use state::{GamePhase, GameState, MatchMode, Particle};
pub use tick::tick;
pub use weapon::{Projectile, ProjectileKind, Weapon, WeaponId, WeaponKind};
