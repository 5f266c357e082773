//! Fixed timestep simulation tick
//!
//! The orchestrator: polls input (or bot decisions), advances every entity
//! once, resolves combat into deferred hit events, manages weapon spawning
//! and the round lifecycle. One call per display refresh; pausing skips the
//! call entirely on the platform side or is gated here by phase.

use glam::Vec2;
use rand::Rng;

use super::bot::{BotBody, PlayerObs, WeaponObs};
use super::combat::{self, HitEvent, Knockback};
use super::input::{Controller, InputKind, InputSource};
use super::player::Player;
use super::state::{GamePhase, GameState, Particle, ScheduledAction};
use super::weapon::{Projectile, ProjectileKind, WeaponKind};
use crate::consts::*;
use crate::fx::{EffectSink, SoundCue};

/// Advance the match by one frame
pub fn tick(state: &mut GameState, input: &dyn InputSource, fx: &mut dyn EffectSink) {
    if input.pause_requested() {
        state.toggle_pause();
    }

    match state.phase {
        GamePhase::Menu | GamePhase::GameOver | GamePhase::Paused => return,
        GamePhase::Lobby => {
            lobby_tick(state, input, fx);
            return;
        }
        GamePhase::Playing => {}
    }

    state.frame_count += 1;

    // Delayed effects count every rendered frame, so the round transition
    // lands on schedule even while slow motion stretches the simulation
    run_scheduled(state, fx);

    // Slow motion is a frame-stride gate: render every frame, simulate one
    // in four
    if state.slow_motion && state.frame_count % SLOWMO_STRIDE != 0 {
        return;
    }

    check_round_end(state, fx);

    // The crown never outlives its holder
    if let Some(king) = state.king {
        if !state.players.get(king).map(|p| p.alive).unwrap_or(false) {
            state.king = None;
        }
    }

    // Periodic weapon drop
    state.weapon_timer += 1;
    if state.weapon_timer > WEAPON_SPAWN_INTERVAL_TICKS {
        state.weapon_timer = 0;
        state.spawn_random_weapon(fx);
    }

    state.level.step();

    update_players(state, input, fx);
    resolve_weapon_pickups(state, fx);
    follow_carried_weapons(state);

    let mut hits: Vec<HitEvent> = Vec::new();
    process_attacks(state, &mut hits, fx);
    bird_contact_damage(state, &mut hits, fx);
    fall_out_damage(state, &mut hits);

    // Free weapons fall; spent ones vanish
    for w in &mut state.weapons {
        w.fall(&state.level);
    }
    state.weapons.retain(|w| w.active);

    for p in &mut state.projectiles {
        p.step();
    }
    hits.extend(combat::resolve_projectiles(
        &mut state.projectiles,
        &state.players,
    ));
    state.projectiles.retain(|p| p.active);

    apply_hits(state, hits, fx);

    // Local recovery from accumulated float error
    for p in &mut state.players {
        if p.sanitize() {
            log::warn!("player {} reset after non-finite physics state", p.id);
        }
    }

    state.particles.retain_mut(|p| p.step());
}

/// Controller lobby: accumulate joiners, start on the ready signal
fn lobby_tick(state: &mut GameState, input: &dyn InputSource, fx: &mut dyn EffectSink) {
    for slot in 0..LOBBY_SLOTS {
        let snap = input.snapshot(slot as usize, InputKind::Gamepad(slot));
        if !snap.join {
            continue;
        }
        let taken = state.players.iter().any(|p| {
            matches!(p.controller, Controller::Human(InputKind::Gamepad(s)) if s == slot)
        });
        if !taken {
            let id = state.players.len();
            let spawn = Vec2::new(100.0 + id as f32 * 50.0, 100.0);
            state
                .players
                .push(Player::new(id, spawn, Controller::Human(InputKind::Gamepad(slot))));
            fx.play(SoundCue::Powerup);
            log::info!("player {} joined on gamepad {slot}", id + 1);
        }
    }

    // Any joined player pressing attack starts the match
    let ready = state.players.iter().any(|p| match p.controller {
        Controller::Human(kind) => input.snapshot(p.id, kind).attack,
        Controller::Bot(_) => false,
    });
    if !state.players.is_empty() && ready {
        state.phase = GamePhase::Playing;
        state.start_level(fx);
        fx.play(SoundCue::Jump);
    }
}

/// Count down scheduled events; fire the ones stamped with the live round
fn run_scheduled(state: &mut GameState, fx: &mut dyn EffectSink) {
    let current_gen = state.round_gen;
    let mut due = Vec::new();
    state.scheduled.retain_mut(|e| {
        if e.round_gen != current_gen {
            // Scheduled against a round that no longer exists
            return false;
        }
        e.ticks_left -= 1;
        if e.ticks_left == 0 {
            due.push(e.action);
            false
        } else {
            true
        }
    });

    for action in due {
        match action {
            ScheduledAction::RoundTransition => {
                // A PvE round the human didn't win replays the level;
                // anything else advances
                let is_pve = state.players.iter().any(|p| p.controller.is_bot());
                let human_won = state
                    .winner
                    .and_then(|w| state.players.get(w))
                    .map(|p| !p.controller.is_bot())
                    .unwrap_or(false);
                if !is_pve || human_won {
                    state.level_num += 1;
                }
                state.start_level(fx);
            }
            ScheduledAction::EndScalePulse { player } => {
                if let Some(p) = state.players.get_mut(player) {
                    p.scale = 1.0;
                }
            }
        }
    }
}

/// Round ends when at most one of several players is left, or the sole
/// player dies
fn check_round_end(state: &mut GameState, fx: &mut dyn EffectSink) {
    if state.round_over {
        return;
    }
    let alive: Vec<_> = state.alive_players().map(|p| p.id).collect();
    let ended = (alive.len() <= 1 && state.players.len() > 1)
        || (state.players.len() == 1 && alive.is_empty());
    if !ended {
        return;
    }

    state.round_over = true;
    state.slow_motion = true;
    state.winner = alive.first().copied();

    if let Some(winner) = state.winner {
        state.king = Some(winner);
        fx.play(SoundCue::Victory);
        let center = state.players[winner].center();
        spark_burst(state, center, 20, 2);
        log::info!("round over: player {} wins", winner + 1);
    } else {
        log::info!("round over: draw");
    }

    state.schedule(ROUND_TRANSITION_TICKS, ScheduledAction::RoundTransition);
}

/// Poll inputs and run every living player's body update
fn update_players(state: &mut GameState, input: &dyn InputSource, fx: &mut dyn EffectSink) {
    // Observation pass for the bots, before any mutable borrow
    let obs: Vec<PlayerObs> = state
        .players
        .iter()
        .map(|p| PlayerObs {
            id: p.id,
            pos: p.pos,
            alive: p.alive,
            attack_pending: p.wants_attack || p.wants_punch || p.wants_explode,
        })
        .collect();
    let weapon_obs: Vec<WeaponObs> = state
        .weapons
        .iter()
        .map(|w| WeaponObs {
            pos: w.pos,
            free: w.active && w.owner.is_none(),
        })
        .collect();

    for i in 0..state.players.len() {
        if !state.players[i].alive {
            continue;
        }
        let body = {
            let p = &state.players[i];
            BotBody {
                pos: p.pos,
                vel: p.vel,
                grounded: p.grounded,
                wings: p.wings,
                armed: p.weapon.is_some(),
            }
        };
        let snap = match &mut state.players[i].controller {
            Controller::Human(kind) => {
                let kind = *kind;
                input.snapshot(i, kind)
            }
            Controller::Bot(brain) => {
                brain.decide(i, &body, &obs, &weapon_obs, &state.level, &mut state.rng)
            }
        };
        state.players[i].update(&snap, &state.level, fx);
    }
}

/// First unarmed player to overlap a free weapon claims it
fn resolve_weapon_pickups(state: &mut GameState, fx: &mut dyn EffectSink) {
    for i in 0..state.players.len() {
        if !state.players[i].alive || state.players[i].weapon.is_some() {
            continue;
        }
        let player_rect = state.players[i].rect();
        let claimed = state
            .weapons
            .iter_mut()
            .find(|w| w.active && w.owner.is_none() && w.rect().intersects(&player_rect))
            .map(|w| {
                w.owner = Some(i);
                (w.id, w.kind)
            });
        let Some((wid, kind)) = claimed else { continue };

        state.players[i].weapon = Some(wid);
        match kind {
            WeaponKind::BirdCrystal => {
                state.players[i].become_bird();
                fx.play(SoundCue::Powerup);
                log::info!("player {} becomes the bird", i + 1);
            }
            WeaponKind::MagicStick => {
                state.players[i].on_cloud = true;
                fx.play(SoundCue::Powerup);
            }
            _ => {}
        }
    }
}

/// Carried weapons ride the holder's hand; dangling ids are dropped
fn follow_carried_weapons(state: &mut GameState) {
    for i in 0..state.players.len() {
        let Some(wid) = state.players[i].weapon else {
            continue;
        };
        let hand = state.players[i].hand_pos();
        match state.weapons.iter_mut().find(|w| w.id == wid) {
            Some(w) => w.pos = hand,
            None => state.players[i].weapon = None,
        }
    }
}

/// Turn pending attack intents into hit events, projectiles, and effects
fn process_attacks(state: &mut GameState, hits: &mut Vec<HitEvent>, fx: &mut dyn EffectSink) {
    let mut spawned: Vec<Projectile> = Vec::new();

    for i in 0..state.players.len() {
        if !state.players[i].alive {
            continue;
        }

        if state.players[i].wants_punch {
            state.players[i].wants_punch = false;
            hits.extend(combat::resolve_melee(
                i,
                &state.players,
                PUNCH_RANGE,
                PUNCH_DAMAGE,
            ));
            fx.play(SoundCue::Attack);

            // Bare fists crack ice
            let (pos, facing) = {
                let p = &state.players[i];
                (p.pos, p.facing as f32)
            };
            let point = Vec2::new(pos.x + facing * PUNCH_RANGE, pos.y + 20.0);
            if let Some(rect) = state.level.break_at(point) {
                shard_burst(state, rect);
                fx.play(SoundCue::Shatter);
            }
        }

        if state.players[i].wants_attack {
            state.players[i].wants_attack = false;
            let Some(wid) = state.players[i].weapon else {
                continue;
            };
            let kind = state.weapons.iter().find(|w| w.id == wid).map(|w| w.kind);

            match kind {
                Some(WeaponKind::MagicStick) => {
                    hits.extend(combat::resolve_beam(i, &state.players));
                    let (muzzle, facing) = {
                        let p = &state.players[i];
                        let c = p.center();
                        (Vec2::new(c.x + p.facing as f32 * 20.0, c.y), p.facing)
                    };
                    state.particles.push(Particle::Beam {
                        pos: muzzle,
                        length: BEAM_LENGTH,
                        facing,
                        life: 10,
                    });
                    state.players[i].vel.y = -STICK_LIFT;
                    state.players[i].scale = 1.5;
                    state.schedule(SCALE_PULSE_TICKS, ScheduledAction::EndScalePulse { player: i });
                    cloud_puffs(state, i);
                    fx.play(SoundCue::Shoot);
                    spend_durability(state, i, wid);
                }
                Some(WeaponKind::Dagger) => {
                    let (pos, facing) = {
                        let p = &state.players[i];
                        (p.pos, p.facing)
                    };
                    state.players[i].vel.x = facing as f32 * DAGGER_DASH;
                    spawned.push(Projectile::new(
                        Vec2::new(pos.x + facing as f32 * 30.0, pos.y + 20.0),
                        facing,
                        ProjectileKind::Shockwave,
                        i,
                    ));
                    fx.play(SoundCue::Attack);
                    spend_durability(state, i, wid);
                }
                Some(WeaponKind::Shooter) => {
                    let (pos, facing) = {
                        let p = &state.players[i];
                        (p.pos, p.facing)
                    };
                    spawned.push(Projectile::new(pos, facing, ProjectileKind::Bullet, i));
                    state.players[i].vel.x = -facing as f32 * SHOOTER_RECOIL;
                    let muzzle = Vec2::new(pos.x + facing as f32 * 30.0, pos.y);
                    let jitter = state.rng.random_range(-1.0..1.0);
                    state.particles.push(Particle::Spark {
                        pos: muzzle,
                        vel: Vec2::new(facing as f32 * 5.0, jitter),
                        life: 10,
                        color: 1,
                    });
                    fx.play(SoundCue::Shoot);
                    spend_durability(state, i, wid);
                }
                Some(WeaponKind::Sword) => {
                    hits.extend(combat::resolve_melee(
                        i,
                        &state.players,
                        SWORD_RANGE,
                        SWORD_DAMAGE,
                    ));
                    fx.play(SoundCue::Attack);
                    spend_durability(state, i, wid);
                }
                // The crystal's power is passive; a stale id just detaches
                Some(WeaponKind::BirdCrystal) => {}
                None => state.players[i].weapon = None,
            }
        }

        if state.players[i].wants_explode {
            state.players[i].wants_explode = false;
            hits.extend(combat::resolve_detonation(i, &state.players));
            let center = state.players[i].center();
            spark_burst(state, center, 20, 3);
            fx.play(SoundCue::Shoot);
        }
    }

    state.projectiles.extend(spawned);
}

/// Birds burn anyone they touch, a little every tick
fn bird_contact_damage(state: &mut GameState, hits: &mut Vec<HitEvent>, fx: &mut dyn EffectSink) {
    let n = state.players.len();
    for i in 0..n {
        if !state.players[i].alive || !state.players[i].is_bird {
            continue;
        }
        let bird_rect = state.players[i].rect();
        for j in 0..n {
            if j == i || !state.players[j].alive {
                continue;
            }
            if bird_rect.intersects(&state.players[j].rect()) {
                hits.push(HitEvent {
                    target: j,
                    amount: BIRD_CONTACT_DAMAGE,
                    attacker: Some(i),
                    knockback: Knockback::None,
                });
                if state.frame_count % 10 == 0 {
                    let pos = state.players[j].center();
                    spark_burst(state, pos, 6, 0);
                    fx.play(SoundCue::Hit);
                }
            }
        }
    }
}

/// Dropping far below the arena is lethal, no attacker credited
fn fall_out_damage(state: &mut GameState, hits: &mut Vec<HitEvent>) {
    let floor = state.level.height + FALL_MARGIN;
    for p in &state.players {
        if p.alive && p.pos.y > floor {
            hits.push(HitEvent {
                target: p.id,
                amount: FALL_DAMAGE,
                attacker: None,
                knockback: Knockback::None,
            });
        }
    }
}

/// Apply the tick's damage events: scale through the target's defenses,
/// set knockback, and settle deaths (kill credit, weapon drop, crown loss)
fn apply_hits(state: &mut GameState, hits: Vec<HitEvent>, fx: &mut dyn EffectSink) {
    for hit in hits {
        if hit.target >= state.players.len() {
            // Internal inconsistency: keep playing, but say so visibly
            state.diagnostic = Some(format!("hit event on unknown player {}", hit.target));
            log::error!("hit event on unknown player {}", hit.target);
            continue;
        }
        let target = &mut state.players[hit.target];
        if !target.alive {
            continue;
        }

        let outcome = target.take_damage(hit.amount);
        match hit.knockback {
            Knockback::X(vx) => target.vel.x = vx,
            Knockback::Xy(v) => target.vel = v,
            Knockback::None => {}
        }
        if outcome.applied > 0 {
            fx.play(SoundCue::Hit);
        }
        if !outcome.died {
            continue;
        }

        let death_pos = target.pos;
        let dropped = target.weapon.take();

        if let Some(attacker) = hit.attacker {
            if attacker != hit.target {
                if let Some(a) = state.players.get_mut(attacker) {
                    a.kills += 1;
                }
            }
        }
        if let Some(wid) = dropped {
            if let Some(w) = state.weapons.iter_mut().find(|w| w.id == wid) {
                w.drop_at(death_pos);
            }
        }
        if state.king == Some(hit.target) {
            state.king = None;
        }
        spark_burst(state, death_pos, 20, 0);
        log::info!("player {} is down", hit.target + 1);
    }
}

/// Decrement a weapon's durability; worn-out weapons detach and vanish
fn spend_durability(state: &mut GameState, player: usize, wid: u32) {
    let mut worn_out = None;
    if let Some(w) = state.weapons.iter_mut().find(|w| w.id == wid) {
        if w.consume() {
            w.active = false;
            worn_out = Some(w.kind);
        }
    }
    if let Some(kind) = worn_out {
        state.players[player].weapon = None;
        if kind == WeaponKind::MagicStick {
            state.players[player].on_cloud = false;
        }
    }
}

fn spark_burst(state: &mut GameState, pos: Vec2, count: usize, color: u32) {
    for _ in 0..count {
        let vel = Vec2::new(
            state.rng.random_range(-5.0..5.0),
            state.rng.random_range(-5.0..5.0),
        );
        state.particles.push(Particle::Spark {
            pos,
            vel,
            life: 60,
            color,
        });
    }
}

fn shard_burst(state: &mut GameState, rect: super::geom::Rect) {
    for _ in 0..10 {
        let pos = Vec2::new(
            rect.x + state.rng.random_range(0.0..rect.w),
            rect.y + state.rng.random_range(0.0..rect.h),
        );
        let vel = Vec2::new(
            state.rng.random_range(-2.5..2.5),
            state.rng.random_range(-2.5..2.5),
        );
        state.particles.push(Particle::Shard { pos, vel, life: 60 });
    }
}

/// Puffs under the stick wielder's feet
fn cloud_puffs(state: &mut GameState, player: usize) {
    let base = state.players[player].pos;
    for _ in 0..5 {
        let pos = Vec2::new(
            base.x + state.rng.random_range(-10.0..10.0),
            base.y + 20.0 + state.rng.random_range(-5.0..5.0),
        );
        let vel = Vec2::new(state.rng.random_range(-1.0..1.0), state.rng.random_range(0.0..2.0));
        state.particles.push(Particle::Cloud { pos, vel, life: 60 });
    }
}
