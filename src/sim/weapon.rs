//! Weapon pickups and projectiles
//!
//! Weapons are free-floating items until picked up; ownership is a
//! non-owning player id resolved by lookup, never a structural reference.
//! Projectiles are independent ballistic objects that die on expiry or on
//! their first non-owner hit.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::Rect;
use super::level::Level;
use super::player::PlayerId;
use crate::consts::*;

pub type WeaponId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Nimbus staff: grants cloud flight on pickup, fires the laser beam
    MagicStick,
    /// Shockwave blade with a forward dash
    Dagger,
    /// Pistol: slow bullet, slight recoil
    Shooter,
    /// Long melee reach
    Sword,
    /// Converts the holder into the bird boss
    BirdCrystal,
}

impl WeaponKind {
    /// The four kinds the periodic spawner rolls between
    pub const SPAWNABLE: [WeaponKind; 4] = [
        WeaponKind::MagicStick,
        WeaponKind::Dagger,
        WeaponKind::Shooter,
        WeaponKind::Sword,
    ];

    /// Crystals never wear out
    pub fn infinite_durability(&self) -> bool {
        matches!(self, WeaponKind::BirdCrystal)
    }

    fn fall_speed(&self) -> f32 {
        match self {
            // The crystal descends slowly for drama
            WeaponKind::BirdCrystal => CRYSTAL_FALL_SPEED,
            _ => WEAPON_FALL_SPEED,
        }
    }
}

/// A weapon pickup, free-floating or carried
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weapon {
    pub id: WeaponId,
    pub pos: Vec2,
    pub kind: WeaponKind,
    pub durability: u32,
    pub active: bool,
    /// Holder's id; resolved by lookup each tick, never owning
    pub owner: Option<PlayerId>,
}

impl Weapon {
    pub fn new(id: WeaponId, pos: Vec2, kind: WeaponKind) -> Self {
        Self {
            id,
            pos,
            kind,
            durability: WEAPON_DURABILITY,
            active: true,
            owner: None,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, WEAPON_SIZE, WEAPON_SIZE)
    }

    /// Free-fall one tick: drop until resting on a platform top or the
    /// floor margin. Carried weapons are positioned by their holder instead.
    pub fn fall(&mut self, level: &Level) {
        if !self.active || self.owner.is_some() {
            return;
        }
        self.pos.y += self.kind.fall_speed();

        for platform in level.active_platforms() {
            if self.rect().intersects(&platform.rect) {
                self.pos.y = platform.rect.y - WEAPON_SIZE;
            }
        }
        let floor = level.height - WEAPON_FLOOR_MARGIN;
        if self.pos.y > floor {
            self.pos.y = floor - WEAPON_SIZE;
        }
    }

    /// Spend one use. Returns true when the weapon is now worn out and
    /// should detach (never for the crystal).
    pub fn consume(&mut self) -> bool {
        if self.kind.infinite_durability() {
            return false;
        }
        self.durability = self.durability.saturating_sub(1);
        self.durability == 0
    }

    /// Drop back to the world at `pos`, ownerless and active
    pub fn drop_at(&mut self, pos: Vec2) {
        self.owner = None;
        self.active = true;
        self.pos = pos;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Slow pistol round
    Bullet,
    /// Fast crescent wave from the dagger
    Shockwave,
}

impl ProjectileKind {
    pub fn speed(&self) -> f32 {
        match self {
            ProjectileKind::Bullet => BULLET_SPEED,
            ProjectileKind::Shockwave => SHOCKWAVE_SPEED,
        }
    }

    pub fn size(&self) -> f32 {
        match self {
            ProjectileKind::Bullet => BULLET_SIZE,
            ProjectileKind::Shockwave => SHOCKWAVE_SIZE,
        }
    }
}

/// A ballistic object in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    /// Horizontal travel direction, +1 or -1
    pub dir: i8,
    pub kind: ProjectileKind,
    /// Remaining lifetime in ticks
    pub life: u32,
    pub active: bool,
    /// Shooter's id, for damage attribution and self-hit exclusion
    pub owner: PlayerId,
}

impl Projectile {
    pub fn new(pos: Vec2, dir: i8, kind: ProjectileKind, owner: PlayerId) -> Self {
        Self {
            pos,
            dir,
            kind,
            life: PROJECTILE_LIFE_TICKS,
            active: true,
            owner,
        }
    }

    /// Hitbox centered on the projectile position
    pub fn rect(&self) -> Rect {
        let s = self.kind.size();
        Rect::new(self.pos.x - s / 2.0, self.pos.y - s / 2.0, s, s)
    }

    /// Advance one tick; expires when lifetime runs out
    pub fn step(&mut self) {
        self.pos.x += self.kind.speed() * self.dir as f32;
        self.life = self.life.saturating_sub(1);
        if self.life == 0 {
            self.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::{Platform, PlatformKind};

    #[test]
    fn test_consume_wears_out_normal_weapons() {
        let mut w = Weapon::new(1, Vec2::ZERO, WeaponKind::Sword);
        for _ in 0..WEAPON_DURABILITY - 1 {
            assert!(!w.consume());
        }
        assert!(w.consume());
        assert_eq!(w.durability, 0);
    }

    #[test]
    fn test_crystal_never_wears_out() {
        let mut w = Weapon::new(1, Vec2::ZERO, WeaponKind::BirdCrystal);
        for _ in 0..1000 {
            assert!(!w.consume());
        }
        assert_eq!(w.durability, WEAPON_DURABILITY);
    }

    #[test]
    fn test_free_weapon_falls_and_rests_on_platform() {
        let mut level = Level::new(1280.0, 720.0);
        level.platforms.push(Platform {
            rect: Rect::new(50.0, 620.0, 200.0, 40.0),
            kind: PlatformKind::Static,
            active: true,
            vx: 0.0,
            origin_x: 50.0,
            range: 0.0,
        });
        let plat = level.platforms[0].rect;

        let mut w = Weapon::new(1, Vec2::new(plat.x + 50.0, plat.y - 200.0), WeaponKind::Sword);
        for _ in 0..200 {
            w.fall(&level);
        }
        assert_eq!(w.pos.y, plat.y - WEAPON_SIZE);
    }

    #[test]
    fn test_free_weapon_stops_at_floor_margin() {
        let level = Level::new(1280.0, 720.0);
        let mut w = Weapon::new(1, Vec2::new(600.0, 0.0), WeaponKind::Dagger);
        for _ in 0..500 {
            w.fall(&level);
        }
        assert!(w.pos.y <= level.height - WEAPON_FLOOR_MARGIN);
    }

    #[test]
    fn test_carried_weapon_does_not_fall() {
        let level = Level::new(1280.0, 720.0);
        let mut w = Weapon::new(1, Vec2::new(100.0, 100.0), WeaponKind::Sword);
        w.owner = Some(0);
        w.fall(&level);
        assert_eq!(w.pos, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_projectile_expires_after_lifetime() {
        let mut p = Projectile::new(Vec2::ZERO, 1, ProjectileKind::Bullet, 0);
        for _ in 0..PROJECTILE_LIFE_TICKS - 1 {
            p.step();
            assert!(p.active);
        }
        p.step();
        assert!(!p.active);
    }

    #[test]
    fn test_projectile_speeds_differ() {
        let mut bullet = Projectile::new(Vec2::ZERO, 1, ProjectileKind::Bullet, 0);
        let mut wave = Projectile::new(Vec2::ZERO, -1, ProjectileKind::Shockwave, 0);
        bullet.step();
        wave.step();
        assert_eq!(bullet.pos.x, BULLET_SPEED);
        assert_eq!(wave.pos.x, -SHOCKWAVE_SPEED);
    }
}
