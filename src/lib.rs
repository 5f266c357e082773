//! Crystal Clash - a stickman platform-fighter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, combat, levels, bots, rounds)
//! - `fx`: Effect-sink collaborator interface (audio/visual cues)
//! - `settings`: Player preferences
//!
//! Rendering and raw input capture live outside the crate: the render layer
//! reads `sim::GameState` once per frame, and input arrives through the
//! `sim::InputSource` trait as a normalized per-player snapshot.

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod fx;
pub mod settings;
pub mod sim;

pub use settings::Settings;

/// Game configuration constants
///
/// All motion constants are per simulation tick (one tick per display
/// refresh, nominally 60 Hz).
pub mod consts {
    /// Default world dimensions (the level adopts the canvas size on wasm)
    pub const WORLD_WIDTH: f32 = 1280.0;
    pub const WORLD_HEIGHT: f32 = 720.0;

    /// Player hitbox
    pub const PLAYER_WIDTH: f32 = 30.0;
    pub const PLAYER_HEIGHT: f32 = 60.0;
    /// Prone stance: half-height hitbox, feet kept anchored
    pub const PRONE_HEIGHT: f32 = 30.0;
    pub const PRONE_SHIFT: f32 = 30.0;

    /// Ground movement
    pub const PLAYER_SPEED: f32 = 5.0;
    pub const JUMP_FORCE: f32 = 12.0;
    /// Winged players flap instead of jumping
    pub const WING_FLAP: f32 = 5.0;
    pub const GRAVITY: f32 = 0.5;
    /// Wings make gravity floatier, not zero
    pub const WING_GRAVITY: f32 = 0.35;
    pub const GROUND_FRICTION: f32 = 0.8;
    pub const MAX_JUMPS: u8 = 2;

    /// Free-flight movement (bird / cloud riders)
    pub const FLY_ACCEL: f32 = 0.5;
    pub const FLY_MAX_SPEED: f32 = 8.0;

    /// Health
    pub const BASE_MAX_HEALTH: i32 = 100;
    pub const BIRD_MAX_HEALTH: i32 = 300;
    pub const SHIELD_DAMAGE_SCALE: f32 = 0.1;
    pub const BIRD_DAMAGE_SCALE: f32 = 0.2;
    /// Falling out of the world is always lethal
    pub const FALL_MARGIN: f32 = 100.0;
    pub const FALL_DAMAGE: i32 = 1000;

    /// Combat
    pub const ATTACK_COOLDOWN_TICKS: u32 = 20;
    pub const PUNCH_RANGE: f32 = 40.0;
    pub const PUNCH_DAMAGE: i32 = 5;
    pub const SWORD_RANGE: f32 = 60.0;
    pub const SWORD_DAMAGE: i32 = 25;
    pub const MELEE_KNOCKBACK_X: f32 = 10.0;
    pub const MELEE_KNOCKBACK_Y: f32 = 5.0;
    pub const BEAM_LENGTH: f32 = 400.0;
    pub const BEAM_HEIGHT: f32 = 10.0;
    pub const BEAM_DAMAGE: i32 = 15;
    /// Bird self-detonation
    pub const DETONATION_RADIUS: f32 = 150.0;
    pub const DETONATION_DAMAGE: i32 = 20;
    pub const DETONATION_KNOCKBACK: f32 = 20.0;
    /// Damage per tick while overlapping the bird
    pub const BIRD_CONTACT_DAMAGE: i32 = 1;

    /// Projectiles
    pub const PROJECTILE_DAMAGE: i32 = 10;
    pub const PROJECTILE_LIFE_TICKS: u32 = 100;
    pub const PROJECTILE_KNOCKBACK: f32 = 5.0;
    pub const BULLET_SPEED: f32 = 10.0;
    pub const BULLET_SIZE: f32 = 10.0;
    pub const SHOCKWAVE_SPEED: f32 = 15.0;
    pub const SHOCKWAVE_SIZE: f32 = 30.0;

    /// Weapon use impulses
    pub const DAGGER_DASH: f32 = 20.0;
    pub const SHOOTER_RECOIL: f32 = 2.0;
    pub const STICK_LIFT: f32 = 10.0;

    /// Weapon pickups
    pub const WEAPON_SIZE: f32 = 30.0;
    pub const WEAPON_DURABILITY: u32 = 20;
    pub const WEAPON_FALL_SPEED: f32 = 5.0;
    pub const CRYSTAL_FALL_SPEED: f32 = 0.5;
    /// Free weapons never sink below this margin above the world bottom
    pub const WEAPON_FLOOR_MARGIN: f32 = 50.0;
    /// ~10 seconds at 60 Hz between random weapon drops
    pub const WEAPON_SPAWN_INTERVAL_TICKS: u32 = 600;

    /// Platforms
    pub const TRAMPOLINE_BOUNCE: f32 = 20.0;
    pub const MOVING_PLATFORM_SPEED: f32 = 2.0;
    pub const MOVING_PLATFORM_RANGE: f32 = 100.0;

    /// Round/level flow
    pub const CRYSTAL_LEVEL_INTERVAL: u32 = 5;
    /// Delay between round end and the next level (4 s at 60 Hz)
    pub const ROUND_TRANSITION_TICKS: u32 = 240;
    /// Slow motion advances the sim on every Nth frame only
    pub const SLOWMO_STRIDE: u64 = 4;
    /// Duration of the magic-stick scale pulse
    pub const SCALE_PULSE_TICKS: u32 = 60;
    pub const LOBBY_SLOTS: u8 = 4;
}

/// Linear interpolation
#[inline]
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start * (1.0 - t) + end * t
}
