//! Combat resolution
//!
//! Attacks never mutate players directly. Each resolver produces
//! [`HitEvent`]s against a read-only player slice; the orchestrator applies
//! them after all borrows end, crediting kills and dropping weapons there.

use glam::Vec2;

use super::geom::Rect;
use super::player::{Player, PlayerId};
use super::weapon::Projectile;
use crate::consts::*;

/// Knockback applied together with damage, always as a velocity *set*
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Knockback {
    None,
    /// Replace horizontal velocity only (projectile hits)
    X(f32),
    /// Replace both axes (melee, detonation)
    Xy(Vec2),
}

/// One pending damage application
#[derive(Debug, Clone, Copy)]
pub struct HitEvent {
    pub target: PlayerId,
    pub amount: i32,
    /// Credited with the kill if the target dies; None for world damage
    pub attacker: Option<PlayerId>,
    pub knockback: Knockback,
}

/// Melee hitbox extending `range` from the attacker's facing edge
pub fn melee_hitbox(attacker: &Player, range: f32) -> Rect {
    let r = attacker.rect();
    let x = if attacker.facing == 1 {
        r.right()
    } else {
        r.x - range
    };
    Rect::new(x, r.y, range, r.h)
}

/// Punch or sword swing: hit every other living player in the box
pub fn resolve_melee(
    attacker: PlayerId,
    players: &[Player],
    range: f32,
    damage: i32,
) -> Vec<HitEvent> {
    let hitbox = melee_hitbox(&players[attacker], range);
    let facing = players[attacker].facing as f32;
    players
        .iter()
        .filter(|p| p.id != attacker && p.alive && hitbox.intersects(&p.rect()))
        .map(|p| HitEvent {
            target: p.id,
            amount: damage,
            attacker: Some(attacker),
            knockback: Knockback::Xy(Vec2::new(facing * MELEE_KNOCKBACK_X, -MELEE_KNOCKBACK_Y)),
        })
        .collect()
}

/// Instant full-length beam hitbox along the attacker's facing direction
pub fn beam_hitbox(attacker: &Player) -> Rect {
    let c = attacker.center();
    let start_x = c.x + attacker.facing as f32 * 20.0;
    let x = if attacker.facing == 1 {
        start_x
    } else {
        start_x - BEAM_LENGTH
    };
    Rect::new(x, c.y - BEAM_HEIGHT / 2.0, BEAM_LENGTH, BEAM_HEIGHT)
}

/// Magic-stick laser: flat damage, no travel time, no knockback
pub fn resolve_beam(attacker: PlayerId, players: &[Player]) -> Vec<HitEvent> {
    let hitbox = beam_hitbox(&players[attacker]);
    players
        .iter()
        .filter(|p| p.id != attacker && p.alive && hitbox.intersects(&p.rect()))
        .map(|p| HitEvent {
            target: p.id,
            amount: BEAM_DAMAGE,
            attacker: Some(attacker),
            knockback: Knockback::None,
        })
        .collect()
}

/// Bird self-detonation: area damage with radial knockback away from the
/// bird's position
pub fn resolve_detonation(bird: PlayerId, players: &[Player]) -> Vec<HitEvent> {
    let center = players[bird].center();
    let origin = players[bird].pos;
    players
        .iter()
        .filter(|p| p.id != bird && p.alive && p.center().distance(center) < DETONATION_RADIUS)
        .map(|p| {
            let angle = (p.pos.y - origin.y).atan2(p.pos.x - origin.x);
            HitEvent {
                target: p.id,
                amount: DETONATION_DAMAGE,
                attacker: Some(bird),
                knockback: Knockback::Xy(
                    Vec2::new(angle.cos(), angle.sin()) * DETONATION_KNOCKBACK,
                ),
            }
        })
        .collect()
}

/// Projectile-vs-player pass: each projectile dies on its first hit against
/// a living non-owner. Returns the hits to apply.
pub fn resolve_projectiles(projectiles: &mut [Projectile], players: &[Player]) -> Vec<HitEvent> {
    let mut hits = Vec::new();
    for proj in projectiles.iter_mut() {
        if !proj.active {
            continue;
        }
        let hitbox = proj.rect();
        for p in players {
            if p.id == proj.owner || !p.alive || !hitbox.intersects(&p.rect()) {
                continue;
            }
            hits.push(HitEvent {
                target: p.id,
                amount: PROJECTILE_DAMAGE,
                attacker: Some(proj.owner),
                knockback: Knockback::X(proj.dir as f32 * PROJECTILE_KNOCKBACK),
            });
            proj.active = false;
            break;
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::input::{Controller, InputKind};
    use crate::sim::weapon::ProjectileKind;

    fn player_at(id: PlayerId, x: f32, y: f32) -> Player {
        Player::new(id, Vec2::new(x, y), Controller::Human(InputKind::Universal))
    }

    #[test]
    fn test_melee_hitbox_extends_from_facing_edge() {
        let mut p = player_at(0, 100.0, 100.0);
        p.facing = 1;
        let hb = melee_hitbox(&p, PUNCH_RANGE);
        assert_eq!(hb.x, 100.0 + PLAYER_WIDTH);
        assert_eq!(hb.w, PUNCH_RANGE);

        p.facing = -1;
        let hb = melee_hitbox(&p, PUNCH_RANGE);
        assert_eq!(hb.x, 100.0 - PUNCH_RANGE);
    }

    #[test]
    fn test_punch_hits_target_in_range() {
        let attacker = player_at(0, 100.0, 100.0);
        // Just inside the 40-unit reach past the attacker's right edge
        let target = player_at(1, 100.0 + PLAYER_WIDTH + 20.0, 100.0);
        let hits = resolve_melee(0, &[attacker, target], PUNCH_RANGE, PUNCH_DAMAGE);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, 1);
        assert_eq!(hits[0].amount, PUNCH_DAMAGE);
        assert_eq!(
            hits[0].knockback,
            Knockback::Xy(Vec2::new(MELEE_KNOCKBACK_X, -MELEE_KNOCKBACK_Y))
        );
    }

    #[test]
    fn test_punch_misses_behind_and_far() {
        let attacker = player_at(0, 100.0, 100.0);
        let behind = player_at(1, 20.0, 100.0);
        let far = player_at(2, 400.0, 100.0);
        let hits = resolve_melee(0, &[attacker, behind, far], PUNCH_RANGE, PUNCH_DAMAGE);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_melee_skips_dead_targets() {
        let attacker = player_at(0, 100.0, 100.0);
        let mut target = player_at(1, 150.0, 100.0);
        target.alive = false;
        let hits = resolve_melee(0, &[attacker, target], PUNCH_RANGE, PUNCH_DAMAGE);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_beam_reaches_across_the_arena() {
        let attacker = player_at(0, 100.0, 100.0);
        let target = player_at(1, 450.0, 100.0);
        let hits = resolve_beam(0, &[attacker, target]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].amount, BEAM_DAMAGE);
        assert_eq!(hits[0].knockback, Knockback::None);
    }

    #[test]
    fn test_beam_respects_facing() {
        let mut attacker = player_at(0, 500.0, 100.0);
        attacker.facing = -1;
        let east = player_at(1, 700.0, 100.0);
        let west = player_at(2, 200.0, 100.0);
        let hits = resolve_beam(0, &[attacker, east, west]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, 2);
    }

    #[test]
    fn test_detonation_hits_within_radius_with_radial_knockback() {
        let mut bird = player_at(0, 500.0, 300.0);
        bird.become_bird();
        let near = player_at(1, 580.0, 300.0);
        let far = player_at(2, 900.0, 300.0);
        let hits = resolve_detonation(0, &[bird, near, far]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, 1);
        assert_eq!(hits[0].amount, DETONATION_DAMAGE);
        // Target is due east: knockback points east
        match hits[0].knockback {
            Knockback::Xy(v) => {
                assert!(v.x > 0.0);
                assert!((v.length() - DETONATION_KNOCKBACK).abs() < 1e-3);
            }
            other => panic!("expected radial knockback, got {other:?}"),
        }
    }

    #[test]
    fn test_projectile_hits_once_and_dies() {
        let owner = player_at(0, 0.0, 0.0);
        let target = player_at(1, 300.0, 100.0);
        let mut projs = vec![Projectile::new(
            Vec2::new(310.0, 130.0),
            1,
            ProjectileKind::Bullet,
            0,
        )];
        let hits = resolve_projectiles(&mut projs, &[owner, target]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, 1);
        assert_eq!(hits[0].amount, PROJECTILE_DAMAGE);
        assert!(!projs[0].active);

        // A dead projectile cannot hit again
        let hits = resolve_projectiles(&mut projs, &[player_at(0, 0.0, 0.0), player_at(1, 300.0, 100.0)]);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_projectile_never_hits_its_owner() {
        let owner = player_at(0, 300.0, 100.0);
        let mut projs = vec![Projectile::new(
            Vec2::new(310.0, 130.0),
            1,
            ProjectileKind::Shockwave,
            0,
        )];
        let hits = resolve_projectiles(&mut projs, &[owner]);
        assert!(hits.is_empty());
        assert!(projs[0].active);
    }
}
