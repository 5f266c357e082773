//! Match state and the round/level lifecycle
//!
//! Everything the orchestrator mutates lives here: players, weapons,
//! projectiles, the level, and the round bookkeeping. All of it is owned by
//! a single [`GameState`] and touched only inside a tick boundary.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bot::{BotBrain, Difficulty};
use super::input::{Controller, InputKind};
use super::level::Level;
use super::player::{Player, PlayerId};
use super::weapon::{Projectile, Weapon, WeaponId, WeaponKind};
use crate::consts::*;
use crate::fx::{EffectSink, SoundCue};

/// Top-level phase of the application state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Main menu; no simulation runs
    Menu,
    /// Controller-join lobby accumulating players
    Lobby,
    /// Active gameplay
    Playing,
    /// Simulation frozen, render continues
    Paused,
    /// Match ended; back to menu on request
    GameOver,
}

/// How a match was started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    /// One human against a bot; a bot win replays the level
    Pve,
    /// Two keyboards on one machine
    PvpLocal,
    /// Gamepad lobby, up to four players
    PvpController,
}

/// Cosmetic effect particles. Each variant carries only what its renderer
/// needs; none of this feeds back into the simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Particle {
    Spark { pos: Vec2, vel: Vec2, life: u32, color: u32 },
    /// Ice fragments with their own gravity
    Shard { pos: Vec2, vel: Vec2, life: u32 },
    /// Laser flash, anchored at the muzzle
    Beam { pos: Vec2, length: f32, facing: i8, life: u32 },
    Cloud { pos: Vec2, vel: Vec2, life: u32 },
}

impl Particle {
    /// Advance one tick; returns false when expired
    pub fn step(&mut self) -> bool {
        match self {
            Particle::Spark { pos, vel, life, .. } | Particle::Cloud { pos, vel, life } => {
                *pos += *vel;
                *life = life.saturating_sub(1);
                *life > 0
            }
            Particle::Shard { pos, vel, life } => {
                *pos += *vel;
                vel.y += 0.2;
                *life = life.saturating_sub(1);
                *life > 0
            }
            Particle::Beam { life, .. } => {
                *life = life.saturating_sub(1);
                *life > 0
            }
        }
    }
}

/// A delayed effect, counted down in ticks and validated against the round
/// generation it was scheduled in. Events from a superseded round are
/// dropped instead of firing into state they no longer match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub ticks_left: u32,
    pub round_gen: u64,
    pub action: ScheduledAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledAction {
    /// Round ended: advance to the next level, or replay it after a PvE
    /// loss
    RoundTransition,
    /// Magic-stick scale pulse wears off
    EndScalePulse { player: PlayerId },
}

/// Complete match state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    pub mode: MatchMode,

    pub players: Vec<Player>,
    pub weapons: Vec<Weapon>,
    pub projectiles: Vec<Projectile>,
    #[serde(skip)]
    pub particles: Vec<Particle>,

    pub level: Level,
    pub level_num: u32,

    /// Ticks since the last random weapon drop
    pub weapon_timer: u32,
    pub round_over: bool,
    pub winner: Option<PlayerId>,
    /// Crown holder: most recent round winner, cleared the moment they die
    pub king: Option<PlayerId>,
    /// Frame-stride gate: while set, only every 4th frame simulates
    pub slow_motion: bool,
    pub frame_count: u64,

    /// Bumped at every level start; stamps scheduled events
    pub round_gen: u64,
    pub scheduled: Vec<ScheduledEvent>,

    next_weapon_id: WeaponId,

    /// Most recent recovered tick fault, surfaced by the render layer
    pub diagnostic: Option<String>,
}

impl GameState {
    pub fn new(width: f32, height: f32, seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Menu,
            mode: MatchMode::Pve,
            players: Vec::new(),
            weapons: Vec::new(),
            projectiles: Vec::new(),
            particles: Vec::new(),
            level: Level::new(width, height),
            level_num: 1,
            weapon_timer: 0,
            round_over: false,
            winner: None,
            king: None,
            slow_motion: false,
            frame_count: 0,
            round_gen: 0,
            scheduled: Vec::new(),
            next_weapon_id: 1,
            diagnostic: None,
        }
    }

    pub fn next_weapon_id(&mut self) -> WeaponId {
        let id = self.next_weapon_id;
        self.next_weapon_id += 1;
        id
    }

    /// Spawn positions stagger along the top of the arena
    fn spawn_point(&self, slot: usize) -> Vec2 {
        Vec2::new(100.0 + slot as f32 * 100.0, 100.0)
    }

    /// Begin a match from the menu
    pub fn start_match(&mut self, mode: MatchMode, difficulty: Difficulty, fx: &mut dyn EffectSink) {
        self.mode = mode;
        self.players.clear();
        self.weapons.clear();
        self.projectiles.clear();
        self.particles.clear();
        self.level_num = 1;
        self.king = None;

        match mode {
            MatchMode::Pve => {
                self.players.push(Player::new(
                    0,
                    self.spawn_point(0),
                    Controller::Human(InputKind::Universal),
                ));
                self.players.push(Player::new(
                    1,
                    Vec2::new(self.level.width - 100.0, 100.0),
                    Controller::Bot(BotBrain::new(difficulty)),
                ));
                self.phase = GamePhase::Playing;
                self.start_level(fx);
            }
            MatchMode::PvpLocal => {
                self.players.push(Player::new(
                    0,
                    self.spawn_point(0),
                    Controller::Human(InputKind::KeyboardWasd),
                ));
                self.players.push(Player::new(
                    1,
                    Vec2::new(self.level.width - 100.0, 100.0),
                    Controller::Human(InputKind::KeyboardArrows),
                ));
                self.phase = GamePhase::Playing;
                self.start_level(fx);
            }
            MatchMode::PvpController => {
                // Players join one by one; the level starts on the ready
                // signal handled by the tick loop
                self.phase = GamePhase::Lobby;
            }
        }
    }

    /// (Re)initialize the current level and reset the round. Kill counters
    /// persist; everything else about a player resets.
    pub fn start_level(&mut self, fx: &mut dyn EffectSink) {
        self.round_gen += 1;
        let level_num = self.level_num;
        self.level.generate(level_num, &mut self.rng);

        self.weapons.clear();
        self.projectiles.clear();
        self.weapon_timer = 0;
        self.round_over = false;
        self.slow_motion = false;
        self.winner = None;
        self.frame_count = 0;
        self.scheduled.retain(|e| e.round_gen == self.round_gen);

        for slot in 0..self.players.len() {
            let spawn = self.spawn_point(slot);
            self.players[slot].start_round(spawn);
        }

        // Crystal levels open with the bird crystal descending from above
        // the center; normal levels wait for the periodic spawner
        if self.level.is_crystal_level() {
            let x = self.level.width / 2.0 - WEAPON_SIZE / 2.0;
            let id = self.next_weapon_id();
            self.weapons
                .push(Weapon::new(id, Vec2::new(x, -100.0), WeaponKind::BirdCrystal));
            fx.play(SoundCue::CrystalDescends);
            log::info!("level {level_num}: the crystal descends");
        } else {
            log::info!("level {level_num} start");
        }
    }

    /// Periodic weapon drop. On crystal levels this re-spawns the crystal
    /// (if lost and nobody is a bird) instead of a random weapon.
    pub fn spawn_random_weapon(&mut self, fx: &mut dyn EffectSink) {
        let crystal_exists = self
            .weapons
            .iter()
            .any(|w| w.kind == WeaponKind::BirdCrystal);
        let bird_exists = self.players.iter().any(|p| p.is_bird);

        if self.level.is_crystal_level() && !crystal_exists && !bird_exists {
            let x = self.level.width / 2.0 - WEAPON_SIZE / 2.0;
            let id = self.next_weapon_id();
            self.weapons
                .push(Weapon::new(id, Vec2::new(x, -100.0), WeaponKind::BirdCrystal));
            fx.play(SoundCue::Powerup);
            return;
        }

        let kind = WeaponKind::SPAWNABLE[self.rng.random_range(0..WeaponKind::SPAWNABLE.len())];
        let x = self.rng.random_range(50.0..self.level.width - 50.0);
        let id = self.next_weapon_id();
        self.weapons.push(Weapon::new(id, Vec2::new(x, -50.0), kind));
        fx.play(SoundCue::Powerup);
    }

    /// Queue a delayed action against the current round generation
    pub fn schedule(&mut self, ticks: u32, action: ScheduledAction) {
        self.scheduled.push(ScheduledEvent {
            ticks_left: ticks,
            round_gen: self.round_gen,
            action,
        });
    }

    pub fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.alive)
    }

    /// Weapon lookup by id
    pub fn weapon(&self, id: WeaponId) -> Option<&Weapon> {
        self.weapons.iter().find(|w| w.id == id)
    }

    pub fn weapon_mut(&mut self, id: WeaponId) -> Option<&mut Weapon> {
        self.weapons.iter_mut().find(|w| w.id == id)
    }

    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            GamePhase::Playing => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Playing,
            other => other,
        };
    }

    /// Abandon the match and return to the menu. The only terminal
    /// transition; nothing about a failed tick ends a match.
    pub fn quit_to_menu(&mut self) {
        self.phase = GamePhase::Menu;
        self.players.clear();
        self.weapons.clear();
        self.projectiles.clear();
        self.particles.clear();
        self.scheduled.clear();
        self.king = None;
        self.diagnostic = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::{NullSink, RecordingSink};

    fn state(seed: u64) -> GameState {
        GameState::new(1280.0, 720.0, seed)
    }

    #[test]
    fn test_new_state_is_in_menu() {
        let s = state(1);
        assert_eq!(s.phase, GamePhase::Menu);
        assert!(s.players.is_empty());
    }

    #[test]
    fn test_pve_match_spawns_human_and_bot() {
        let mut s = state(1);
        s.start_match(MatchMode::Pve, Difficulty::Hard, &mut NullSink);
        assert_eq!(s.phase, GamePhase::Playing);
        assert_eq!(s.players.len(), 2);
        assert!(!s.players[0].controller.is_bot());
        assert!(s.players[1].controller.is_bot());
    }

    #[test]
    fn test_controller_mode_enters_lobby() {
        let mut s = state(1);
        s.start_match(MatchMode::PvpController, Difficulty::Medium, &mut NullSink);
        assert_eq!(s.phase, GamePhase::Lobby);
        assert!(s.players.is_empty());
    }

    #[test]
    fn test_level_five_spawns_exactly_one_crystal_at_center() {
        let mut s = state(9);
        s.start_match(MatchMode::Pve, Difficulty::Medium, &mut NullSink);
        s.level_num = 5;
        let mut fx = RecordingSink::default();
        s.start_level(&mut fx);

        assert_eq!(s.level.material, crate::sim::Material::Magic);
        let crystals: Vec<_> = s
            .weapons
            .iter()
            .filter(|w| w.kind == WeaponKind::BirdCrystal)
            .collect();
        assert_eq!(crystals.len(), 1);
        assert_eq!(crystals[0].pos.x, 1280.0 / 2.0 - WEAPON_SIZE / 2.0);
        assert!(crystals[0].pos.y < 0.0);
        assert!(fx.cues.contains(&SoundCue::CrystalDescends));
    }

    #[test]
    fn test_normal_level_spawns_no_weapons_at_start() {
        let mut s = state(9);
        s.start_match(MatchMode::Pve, Difficulty::Medium, &mut NullSink);
        assert!(s.weapons.is_empty());
    }

    #[test]
    fn test_round_reset_clears_state_but_keeps_kills() {
        let mut s = state(2);
        s.start_match(MatchMode::Pve, Difficulty::Medium, &mut NullSink);
        s.players[0].kills = 2;
        s.players[1].take_damage(10_000);
        s.round_over = true;
        s.slow_motion = true;

        s.level_num = 2;
        s.start_level(&mut NullSink);
        assert!(!s.round_over);
        assert!(!s.slow_motion);
        assert!(s.players[1].alive);
        assert_eq!(s.players[0].kills, 2);
        assert_eq!(s.frame_count, 0);
    }

    #[test]
    fn test_stale_scheduled_events_dropped_on_level_start() {
        let mut s = state(3);
        s.start_match(MatchMode::Pve, Difficulty::Medium, &mut NullSink);
        s.schedule(100, ScheduledAction::RoundTransition);
        assert_eq!(s.scheduled.len(), 1);
        s.start_level(&mut NullSink);
        assert!(s.scheduled.is_empty());
    }

    #[test]
    fn test_spawner_rolls_only_spawnable_kinds() {
        let mut s = state(4);
        s.start_match(MatchMode::Pve, Difficulty::Medium, &mut NullSink);
        for _ in 0..50 {
            s.spawn_random_weapon(&mut NullSink);
        }
        assert!(s.weapons.iter().all(|w| w.kind != WeaponKind::BirdCrystal));
    }

    #[test]
    fn test_spawner_restores_lost_crystal_on_crystal_level() {
        let mut s = state(5);
        s.start_match(MatchMode::Pve, Difficulty::Medium, &mut NullSink);
        s.level_num = 5;
        s.start_level(&mut NullSink);
        s.weapons.clear();
        s.spawn_random_weapon(&mut NullSink);
        assert_eq!(s.weapons.len(), 1);
        assert_eq!(s.weapons[0].kind, WeaponKind::BirdCrystal);
    }

    #[test]
    fn test_spawner_skips_crystal_while_a_bird_lives() {
        let mut s = state(6);
        s.start_match(MatchMode::Pve, Difficulty::Medium, &mut NullSink);
        s.level_num = 5;
        s.start_level(&mut NullSink);
        s.weapons.clear();
        s.players[0].become_bird();
        s.spawn_random_weapon(&mut NullSink);
        assert!(s.weapons.iter().all(|w| w.kind != WeaponKind::BirdCrystal));
    }

    #[test]
    fn test_pause_toggle_round_trips() {
        let mut s = state(7);
        s.start_match(MatchMode::Pve, Difficulty::Medium, &mut NullSink);
        s.toggle_pause();
        assert_eq!(s.phase, GamePhase::Paused);
        s.toggle_pause();
        assert_eq!(s.phase, GamePhase::Playing);
    }

    #[test]
    fn test_quit_returns_to_menu_and_clears_world() {
        let mut s = state(8);
        s.start_match(MatchMode::Pve, Difficulty::Medium, &mut NullSink);
        s.quit_to_menu();
        assert_eq!(s.phase, GamePhase::Menu);
        assert!(s.players.is_empty() && s.weapons.is_empty());
    }
}
