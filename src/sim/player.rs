//! The player entity: physics body, health, stances, and combat state
//!
//! A player is updated once per tick from a normalized [`InputSnapshot`] —
//! the same path whether a human or a bot produced it. Cross-entity effects
//! (weapon pickup, damage crediting, knockback) are resolved by the
//! orchestrator; this module owns single-body behavior only.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::Rect;
use super::input::{Controller, InputSnapshot};
use super::level::{Level, PlatformKind};
use super::weapon::WeaponId;
use crate::consts::*;
use crate::fx::{EffectSink, SoundCue};

/// Stable player slot index; also used as the non-owning back-reference in
/// weapons and projectiles.
pub type PlayerId = usize;

/// Outcome of a `take_damage` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    /// Health actually removed after shield/bird scaling
    pub applied: i32,
    /// True only on the alive -> dead transition
    pub died: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub width: f32,
    pub height: f32,

    pub health: i32,
    pub max_health: i32,
    pub alive: bool,

    /// +1 facing right, -1 facing left
    pub facing: i8,
    pub grounded: bool,
    pub jump_count: u8,
    /// Latch so a held jump key fires only once
    jump_held: bool,
    pub prone: bool,

    /// Flight flags. `is_bird` implies `wings`.
    pub wings: bool,
    pub on_cloud: bool,
    pub is_bird: bool,

    /// Carried weapon id, exclusive; the weapon's `owner` mirrors this
    pub weapon: Option<WeaponId>,
    pub shield_active: bool,
    pub attack_cooldown: u32,
    /// Persists across rounds within a match
    pub kills: u32,
    /// Cosmetic scale pulse (magic stick use)
    pub scale: f32,

    pub controller: Controller,

    /// Attack intents, set on input and consumed by the orchestrator
    pub wants_punch: bool,
    pub wants_attack: bool,
    pub wants_explode: bool,

    /// Safe position for round resets and NaN recovery
    pub spawn: Vec2,
}

impl Player {
    pub fn new(id: PlayerId, spawn: Vec2, controller: Controller) -> Self {
        Self {
            id,
            pos: spawn,
            vel: Vec2::ZERO,
            width: PLAYER_WIDTH,
            height: PLAYER_HEIGHT,
            health: BASE_MAX_HEALTH,
            max_health: BASE_MAX_HEALTH,
            alive: true,
            facing: 1,
            grounded: false,
            jump_count: 0,
            jump_held: false,
            prone: false,
            wings: false,
            on_cloud: false,
            is_bird: false,
            weapon: None,
            shield_active: false,
            attack_cooldown: 0,
            kills: 0,
            scale: 1.0,
            controller,
            wants_punch: false,
            wants_attack: false,
            wants_explode: false,
            spawn,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }

    /// Where a carried weapon sits relative to the body
    pub fn hand_pos(&self) -> Vec2 {
        let c = self.center();
        if self.prone {
            Vec2::new(c.x + self.facing as f32 * 30.0, c.y + 15.0)
        } else {
            Vec2::new(c.x + self.facing as f32 * 25.0, c.y - 5.0)
        }
    }

    pub fn flying(&self) -> bool {
        self.is_bird || self.on_cloud
    }

    /// Reset per-round state at level start. Kill count persists.
    pub fn start_round(&mut self, spawn: Vec2) {
        self.spawn = spawn;
        self.pos = spawn;
        self.vel = Vec2::ZERO;
        self.alive = true;
        self.weapon = None;
        self.wings = false;
        self.is_bird = false;
        self.on_cloud = false;
        self.jump_count = 0;
        self.jump_held = false;
        if self.prone {
            self.prone = false;
            self.height = PLAYER_HEIGHT;
        }
        self.max_health = BASE_MAX_HEALTH;
        self.health = self.max_health;
        self.shield_active = false;
        self.attack_cooldown = 0;
        self.scale = 1.0;
        self.wants_punch = false;
        self.wants_attack = false;
        self.wants_explode = false;
    }

    /// Full per-tick update for one body: input, physics, cooldowns
    pub fn update(&mut self, input: &InputSnapshot, level: &Level, fx: &mut dyn EffectSink) {
        if !self.alive {
            return;
        }
        self.apply_input(input, fx);
        self.step_physics(level, fx);
        if self.grounded {
            self.jump_count = 0;
        }
        if self.attack_cooldown > 0 {
            self.attack_cooldown -= 1;
        }
    }

    fn apply_input(&mut self, input: &InputSnapshot, fx: &mut dyn EffectSink) {
        if self.flying() {
            // Free flight: accelerate on both axes, capped magnitude
            self.vel.x += input.x * FLY_ACCEL;
            if input.jump {
                self.vel.y -= FLY_ACCEL;
            }
            if input.y > 0.0 {
                self.vel.y += FLY_ACCEL;
            }
            let speed = self.vel.length();
            if speed > FLY_MAX_SPEED {
                self.vel = self.vel / speed * FLY_MAX_SPEED;
            }
            if input.x != 0.0 {
                self.facing = if input.x > 0.0 { 1 } else { -1 };
            }
            if input.attack && self.attack_cooldown == 0 {
                self.begin_attack();
            }
            return;
        }

        // Prone stance: sustained down while grounded shrinks the hitbox,
        // with a one-time vertical shift to keep feet anchored
        if input.y > 0.5 && self.grounded {
            if !self.prone {
                self.pos.y += PRONE_SHIFT;
                self.prone = true;
                self.height = PRONE_HEIGHT;
            }
            self.vel.x = 0.0;
        } else if self.prone {
            self.pos.y -= PRONE_SHIFT;
            self.prone = false;
            self.height = PLAYER_HEIGHT;
        }

        if !self.prone {
            if input.x != 0.0 {
                self.vel.x = input.x * PLAYER_SPEED;
                if input.aim_x.abs() < 0.1 {
                    self.facing = if input.x > 0.0 { 1 } else { -1 };
                }
            } else {
                self.vel.x *= GROUND_FRICTION;
            }
        }

        // Aim stick overrides facing
        if input.aim_x.abs() > 0.1 {
            self.facing = if input.aim_x > 0.0 { 1 } else { -1 };
        }

        // Edge-triggered jump with a double-jump budget
        if input.jump {
            if !self.jump_held {
                if self.wings || self.on_cloud {
                    self.vel.y = -WING_FLAP;
                } else if self.grounded || self.jump_count < MAX_JUMPS {
                    self.vel.y = -JUMP_FORCE;
                    self.grounded = false;
                    self.jump_count += 1;
                    fx.play(SoundCue::Jump);
                }
                self.jump_held = true;
            }
        } else {
            self.jump_held = false;
        }

        if input.attack && self.attack_cooldown == 0 {
            self.begin_attack();
        }

        if input.shield && !self.shield_active {
            fx.play(SoundCue::ShieldOn);
        }
        self.shield_active = input.shield;
    }

    /// Start the attack cooldown and raise the matching intent for the
    /// orchestrator to resolve.
    pub fn begin_attack(&mut self) {
        self.attack_cooldown = ATTACK_COOLDOWN_TICKS;
        if self.is_bird {
            self.wants_explode = true;
        } else if self.weapon.is_some() {
            self.wants_attack = true;
        } else {
            self.wants_punch = true;
        }
    }

    fn step_physics(&mut self, level: &Level, fx: &mut dyn EffectSink) {
        if self.flying() {
            // Flight ignores gravity and platforms; world edges reflect
            self.pos += self.vel;
            if self.pos.x < 0.0 {
                self.pos.x = 0.0;
                self.vel.x = -self.vel.x;
            }
            if self.pos.x > level.width - self.width {
                self.pos.x = level.width - self.width;
                self.vel.x = -self.vel.x;
            }
            if self.pos.y < 0.0 {
                self.pos.y = 0.0;
                self.vel.y = -self.vel.y;
            }
            if self.pos.y > level.height - self.height {
                self.pos.y = level.height - self.height;
                self.vel.y = -self.vel.y;
            }
            return;
        }

        let gravity = if self.wings { WING_GRAVITY } else { GRAVITY };
        self.vel.y += gravity;
        self.grounded = false;

        if self.vel.x.is_finite() {
            self.pos.x += self.vel.x;
        }
        self.collide_horizontal(level);

        if self.vel.y.is_finite() {
            self.pos.y += self.vel.y;
        }
        self.collide_vertical(level, fx);
    }

    fn collide_horizontal(&mut self, level: &Level) {
        for platform in level.active_platforms() {
            if self.rect().intersects(&platform.rect) {
                if self.vel.x > 0.0 {
                    self.pos.x = platform.rect.x - self.width;
                } else if self.vel.x < 0.0 {
                    self.pos.x = platform.rect.right();
                }
                self.vel.x = 0.0;
            }
        }
    }

    fn collide_vertical(&mut self, level: &Level, fx: &mut dyn EffectSink) {
        for platform in level.active_platforms() {
            if self.rect().intersects(&platform.rect) {
                if self.vel.y > 0.0 {
                    self.pos.y = platform.rect.y - self.height;
                    if platform.kind == PlatformKind::Trampoline {
                        self.vel.y = -TRAMPOLINE_BOUNCE;
                        self.grounded = false;
                        fx.play(SoundCue::Jump);
                    } else {
                        self.grounded = true;
                        self.vel.y = 0.0;
                    }
                    // Moving platforms carry whoever stands on them
                    if platform.kind == PlatformKind::Moving {
                        self.pos.x += platform.vx;
                    }
                } else if self.vel.y < 0.0 {
                    self.pos.y = platform.rect.bottom();
                    self.vel.y = 0.0;
                }
            }
        }
    }

    /// Apply incoming damage. Shield scales to 10%, bird mode to a further
    /// 20%. Health floors at zero; `died` is reported only on the
    /// alive -> dead transition. Kill crediting and weapon dropping are the
    /// orchestrator's job.
    pub fn take_damage(&mut self, amount: i32) -> DamageOutcome {
        if !self.alive {
            return DamageOutcome {
                applied: 0,
                died: false,
            };
        }
        let mut scaled = amount as f32;
        if self.shield_active {
            scaled *= SHIELD_DAMAGE_SCALE;
        }
        if self.is_bird {
            scaled *= BIRD_DAMAGE_SCALE;
        }
        let applied = (scaled.round() as i32).min(self.health);
        self.health -= applied;

        let died = self.health == 0 && applied > 0;
        if died {
            self.alive = false;
            self.wings = false;
            self.on_cloud = false;
            self.is_bird = false;
        }
        DamageOutcome { applied, died }
    }

    /// Become the bird boss: wings, elevated health pool, full heal
    pub fn become_bird(&mut self) {
        self.wings = true;
        self.is_bird = true;
        self.max_health = BIRD_MAX_HEALTH;
        self.health = self.max_health;
    }

    /// Recover from non-finite physics state by resetting to the spawn
    /// point with zero velocity. Returns true if a reset happened.
    pub fn sanitize(&mut self) -> bool {
        if self.pos.is_finite() && self.vel.is_finite() {
            return false;
        }
        self.pos = self.spawn;
        self.vel = Vec2::ZERO;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::NullSink;
    use crate::sim::input::InputKind;
    use crate::sim::level::Level;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn player() -> Player {
        Player::new(0, Vec2::new(100.0, 100.0), Controller::Human(InputKind::Universal))
    }

    fn flat_level() -> Level {
        let mut level = Level::new(1280.0, 720.0);
        level.generate(1, &mut Pcg32::seed_from_u64(7));
        level
    }

    #[test]
    fn test_damage_reduces_health() {
        let mut p = player();
        let out = p.take_damage(30);
        assert_eq!(out.applied, 30);
        assert!(!out.died);
        assert_eq!(p.health, 70);
    }

    #[test]
    fn test_shield_scales_damage_to_ten_percent() {
        let mut p = player();
        p.shield_active = true;
        let out = p.take_damage(100);
        assert_eq!(out.applied, 10);
        assert_eq!(p.health, 90);
    }

    #[test]
    fn test_bird_scales_damage_to_twenty_percent() {
        let mut p = player();
        p.become_bird();
        let out = p.take_damage(100);
        assert_eq!(out.applied, 20);
        assert_eq!(p.health, 280);
    }

    #[test]
    fn test_shielded_bird_takes_two_percent() {
        let mut p = player();
        p.become_bird();
        p.shield_active = true;
        let out = p.take_damage(100);
        assert_eq!(out.applied, 2);
        assert_eq!(p.health, 298);
    }

    #[test]
    fn test_health_never_goes_negative() {
        let mut p = player();
        let out = p.take_damage(100_000);
        assert_eq!(p.health, 0);
        assert!(out.died);
    }

    #[test]
    fn test_death_fires_once() {
        let mut p = player();
        assert!(p.take_damage(1000).died);
        // Already dead: no second death, no more damage
        let again = p.take_damage(1000);
        assert!(!again.died);
        assert_eq!(again.applied, 0);
        assert!(!p.alive);
    }

    #[test]
    fn test_death_clears_flight_flags() {
        let mut p = player();
        p.become_bird();
        p.take_damage(10_000);
        assert!(!p.wings && !p.is_bird && !p.on_cloud);
    }

    #[test]
    fn test_dead_player_stays_dead_until_round_reset() {
        let mut p = player();
        p.take_damage(1000);
        assert!(!p.alive);
        let level = flat_level();
        let mut fx = NullSink;
        p.update(&InputSnapshot::default(), &level, &mut fx);
        assert!(!p.alive);
        p.start_round(Vec2::new(100.0, 100.0));
        assert!(p.alive);
        assert_eq!(p.health, BASE_MAX_HEALTH);
    }

    #[test]
    fn test_bird_reset_restores_base_health_pool() {
        let mut p = player();
        p.become_bird();
        p.start_round(Vec2::ZERO);
        assert_eq!(p.max_health, BASE_MAX_HEALTH);
        assert_eq!(p.health, BASE_MAX_HEALTH);
        assert!(!p.is_bird);
    }

    #[test]
    fn test_kills_persist_across_round_reset() {
        let mut p = player();
        p.kills = 3;
        p.start_round(Vec2::ZERO);
        assert_eq!(p.kills, 3);
    }

    #[test]
    fn test_gravity_pulls_player_onto_platform() {
        let mut level = Level::new(1280.0, 720.0);
        level.platforms.push(crate::sim::level::Platform {
            rect: Rect::new(50.0, 620.0, 200.0, 40.0),
            kind: PlatformKind::Static,
            active: true,
            vx: 0.0,
            origin_x: 50.0,
            range: 0.0,
        });
        let plat = level.platforms[0].rect;
        let mut p = player();
        p.pos = Vec2::new(plat.x + 20.0, plat.y - 200.0);
        let mut fx = NullSink;
        for _ in 0..120 {
            p.update(&InputSnapshot::default(), &level, &mut fx);
        }
        assert!(p.grounded);
        assert_eq!(p.pos.y, plat.y - p.height);
        assert_eq!(p.vel.y, 0.0);
    }

    #[test]
    fn test_trampoline_launches_and_ungrounds() {
        let mut level = Level::new(1280.0, 720.0);
        level.platforms.push(crate::sim::level::Platform {
            rect: Rect::new(0.0, 600.0, 400.0, 20.0),
            kind: PlatformKind::Trampoline,
            active: true,
            vx: 0.0,
            origin_x: 0.0,
            range: 0.0,
        });
        let mut p = player();
        p.pos = Vec2::new(100.0, 600.0 - p.height - 1.0);
        p.vel.y = 5.0;
        let mut fx = NullSink;
        p.update(&InputSnapshot::default(), &level, &mut fx);
        assert_eq!(p.vel.y, -TRAMPOLINE_BOUNCE);
        assert!(!p.grounded);
    }

    #[test]
    fn test_double_jump_budget() {
        // Open air: nothing to land on mid-test
        let level = Level::new(1280.0, 720.0);
        let mut fx = NullSink;
        let mut p = player();
        p.grounded = true;
        p.jump_count = 0;

        let jump = InputSnapshot {
            jump: true,
            ..Default::default()
        };
        let release = InputSnapshot::default();

        p.update(&jump, &level, &mut fx);
        assert_eq!(p.jump_count, 1);
        p.update(&release, &level, &mut fx);
        p.update(&jump, &level, &mut fx);
        assert_eq!(p.jump_count, 2);
        p.update(&release, &level, &mut fx);
        let vy_before = p.vel.y;
        p.update(&jump, &level, &mut fx);
        // Third jump denied: vy only changed by gravity
        assert_eq!(p.jump_count, 2);
        assert!(p.vel.y >= vy_before);
    }

    #[test]
    fn test_held_jump_does_not_retrigger() {
        let level = Level::new(1280.0, 720.0);
        let mut fx = NullSink;
        let mut p = player();
        p.grounded = true;
        let jump = InputSnapshot {
            jump: true,
            ..Default::default()
        };
        p.update(&jump, &level, &mut fx);
        assert_eq!(p.jump_count, 1);
        p.update(&jump, &level, &mut fx);
        p.update(&jump, &level, &mut fx);
        assert_eq!(p.jump_count, 1);
    }

    #[test]
    fn test_prone_shrinks_hitbox_and_anchors_feet() {
        let mut fx = NullSink;
        let mut p = player();
        p.grounded = true;
        let feet_before = p.pos.y + p.height;

        let down = InputSnapshot {
            y: 1.0,
            ..Default::default()
        };
        p.apply_input(&down, &mut fx);
        assert!(p.prone);
        assert_eq!(p.height, PRONE_HEIGHT);
        assert_eq!(p.pos.y + p.height, feet_before);
        assert_eq!(p.vel.x, 0.0);

        p.apply_input(&InputSnapshot::default(), &mut fx);
        assert!(!p.prone);
        assert_eq!(p.height, PLAYER_HEIGHT);
        assert_eq!(p.pos.y + p.height, feet_before);
    }

    #[test]
    fn test_flight_reflects_at_world_edges() {
        let level = flat_level();
        let mut fx = NullSink;
        let mut p = player();
        p.on_cloud = true;
        p.pos = Vec2::new(2.0, 300.0);
        p.vel = Vec2::new(-6.0, 0.0);
        p.update(&InputSnapshot::default(), &level, &mut fx);
        assert_eq!(p.pos.x, 0.0);
        assert!(p.vel.x > 0.0);
    }

    #[test]
    fn test_flight_speed_capped() {
        let mut p = player();
        p.on_cloud = true;
        let mut fx = NullSink;
        let push = InputSnapshot {
            x: 1.0,
            jump: true,
            ..Default::default()
        };
        for _ in 0..100 {
            p.apply_input(&push, &mut fx);
        }
        assert!(p.vel.length() <= FLY_MAX_SPEED + 1e-3);
    }

    #[test]
    fn test_sanitize_recovers_nan_position() {
        let mut p = player();
        p.pos = Vec2::new(f32::NAN, 50.0);
        p.vel = Vec2::new(3.0, f32::INFINITY);
        assert!(p.sanitize());
        assert_eq!(p.pos, p.spawn);
        assert_eq!(p.vel, Vec2::ZERO);
        assert!(!p.sanitize());
    }

    #[test]
    fn test_begin_attack_selects_intent() {
        let mut p = player();
        p.begin_attack();
        assert!(p.wants_punch && !p.wants_attack && !p.wants_explode);
        assert_eq!(p.attack_cooldown, ATTACK_COOLDOWN_TICKS);

        let mut armed = player();
        armed.weapon = Some(1);
        armed.begin_attack();
        assert!(armed.wants_attack && !armed.wants_punch);

        let mut bird = player();
        bird.become_bird();
        bird.begin_attack();
        assert!(bird.wants_explode);
    }

    proptest! {
        #[test]
        fn prop_health_stays_in_bounds(
            amounts in proptest::collection::vec(0i32..5000, 0..40),
            shield in proptest::bool::ANY,
            bird in proptest::bool::ANY,
        ) {
            let mut p = player();
            if bird {
                p.become_bird();
            }
            p.shield_active = shield;
            for a in amounts {
                p.take_damage(a);
                prop_assert!(p.health >= 0);
                prop_assert!(p.health <= p.max_health);
            }
        }
    }
}
