//! Bot controller
//!
//! A bot is not a separate entity type: it synthesizes the same normalized
//! [`InputSnapshot`] a human source produces, and the shared player update
//! consumes it. The brain sees the world through cheap observation structs
//! collected by the orchestrator before the mutable player pass.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::input::InputSnapshot;
use super::level::Level;
use super::player::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Ticks between decisions; the bot replays neutral input in between
    pub fn reaction_ticks(&self) -> u32 {
        match self {
            Difficulty::Easy => 20,
            Difficulty::Medium => 10,
            Difficulty::Hard => 5,
        }
    }

    /// Chance to attack per decision when in range
    pub fn attack_probability(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.05,
            Difficulty::Medium => 0.1,
            Difficulty::Hard => 1.0,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// What the brain needs to know about its own body this tick
#[derive(Debug, Clone, Copy)]
pub struct BotBody {
    pub pos: Vec2,
    pub vel: Vec2,
    pub grounded: bool,
    pub wings: bool,
    pub armed: bool,
}

/// One opponent as seen by a bot
#[derive(Debug, Clone, Copy)]
pub struct PlayerObs {
    pub id: PlayerId,
    pub pos: Vec2,
    pub alive: bool,
    /// An attack intent is pending resolution this tick
    pub attack_pending: bool,
}

/// One weapon pickup as seen by a bot
#[derive(Debug, Clone, Copy)]
pub struct WeaponObs {
    pub pos: Vec2,
    /// Active and unclaimed
    pub free: bool,
}

/// Per-bot decision state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotBrain {
    pub difficulty: Difficulty,
    /// Ticks until the next decision
    reaction_timer: u32,
    /// Most recent combat target
    pub target: Option<PlayerId>,
}

impl BotBrain {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            reaction_timer: 0,
            target: None,
        }
    }

    /// Produce this tick's input. Between decisions the bot holds neutral
    /// input, which lets ground friction bleed off its speed naturally.
    pub fn decide(
        &mut self,
        me: PlayerId,
        body: &BotBody,
        players: &[PlayerObs],
        weapons: &[WeaponObs],
        level: &Level,
        rng: &mut Pcg32,
    ) -> InputSnapshot {
        if self.reaction_timer > 0 {
            self.reaction_timer -= 1;
            return InputSnapshot::default();
        }

        self.target = nearest_opponent(me, body.pos, players);
        let mut input = InputSnapshot::default();

        if let Some(target) = self.target.and_then(|id| players.iter().find(|p| p.id == id)) {
            let dx = target.pos.x - body.pos.x;
            let dy = target.pos.y - body.pos.y;
            let dist = (dx * dx + dy * dy).sqrt();

            if dx.abs() > 50.0 {
                input.x = dx.signum();
            }

            // Jump over obstacles and up to higher targets
            let wants_jump = dy < -50.0
                || self.obstacle_ahead(body, input.x, level, rng);
            if wants_jump && (body.grounded || body.wings) {
                input.jump = true;
            }

            // Flight-capable bots dive toward low targets
            if body.wings && dy > 50.0 {
                input.y = 1.0;
            }

            if dist < 100.0 && rng.random_bool(self.difficulty.attack_probability()) {
                input.attack = true;
            }

            if self.difficulty != Difficulty::Easy && target.attack_pending && dist < 150.0 {
                input.shield = true;
            }
        }

        // Unarmed: steer toward the nearest free weapon instead
        if !body.armed {
            let nearest = weapons
                .iter()
                .filter(|w| w.free)
                .map(|w| (w.pos, w.pos.distance(body.pos)))
                .min_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((wpos, wdist)) = nearest {
                if wdist < 300.0 {
                    input.x = (wpos.x - body.pos.x).signum();
                    if wpos.y < body.pos.y - 50.0 && (body.grounded || body.wings) {
                        input.jump = true;
                    }
                }
            }
        }

        self.reaction_timer = self.difficulty.reaction_ticks();
        input
    }

    /// Short forward probe: is there a platform wall at head height one
    /// body-length ahead? Also jumps randomly when stuck in place.
    fn obstacle_ahead(&self, body: &BotBody, dir: f32, level: &Level, rng: &mut Pcg32) -> bool {
        let probe = Vec2::new(body.pos.x + dir * 50.0, body.pos.y);
        for platform in level.active_platforms() {
            if probe.x > platform.rect.x
                && probe.x < platform.rect.right()
                && probe.y > platform.rect.y
                && probe.y < platform.rect.bottom()
            {
                return true;
            }
        }
        // Anti-stuck: barely moving with a live target
        if body.vel.x.abs() < 0.5 && self.target.is_some() {
            return rng.random_bool(0.05);
        }
        false
    }
}

/// Nearest living player that isn't `me`, by straight-line distance
fn nearest_opponent(me: PlayerId, pos: Vec2, players: &[PlayerObs]) -> Option<PlayerId> {
    players
        .iter()
        .filter(|p| p.id != me && p.alive)
        .map(|p| (p.id, p.pos.distance(pos)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}
