//! Level generation and the platform model
//!
//! A level is a flat list of axis-aligned platforms generated from one of
//! several layout archetypes, plus a cosmetic backdrop derived from the
//! material. The level exclusively owns its platforms and mutates them
//! (oscillation, breaking) each tick.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geom::Rect;
use crate::consts::*;

/// Platform surface material. Cosmetic except for Ice, which makes
/// platforms breakable by melee hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Material {
    Dirt,
    Stone,
    Magic,
    Cloud,
    Ice,
}

impl Material {
    /// Tag consumed by the render layer's texture lookup
    pub fn as_str(&self) -> &'static str {
        match self {
            Material::Dirt => "dirt",
            Material::Stone => "stone",
            Material::Magic => "magic",
            Material::Cloud => "cloud",
            Material::Ice => "ice",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlatformKind {
    #[default]
    Static,
    Moving,
    Trampoline,
}

/// A single platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub rect: Rect,
    pub kind: PlatformKind,
    /// False once broken; inactive platforms are ignored by collision
    pub active: bool,
    /// Current horizontal velocity (moving platforms only)
    pub vx: f32,
    /// Oscillation anchor
    pub origin_x: f32,
    /// Oscillation half-width around the anchor
    pub range: f32,
}

impl Platform {
    fn new(x: f32, y: f32, w: f32, h: f32, kind: PlatformKind) -> Self {
        Self {
            rect: Rect::new(x, y, w, h),
            kind,
            active: true,
            vx: if kind == PlatformKind::Moving {
                MOVING_PLATFORM_SPEED
            } else {
                0.0
            },
            origin_x: x,
            range: MOVING_PLATFORM_RANGE,
        }
    }

    /// Advance oscillation one tick, reversing exactly at the range bounds
    fn step(&mut self) {
        if self.kind != PlatformKind::Moving || !self.active {
            return;
        }
        self.rect.x += self.vx;
        let min = self.origin_x - self.range;
        let max = self.origin_x + self.range;
        if self.rect.x >= max {
            self.rect.x = max;
            self.vx = -self.vx.abs();
        } else if self.rect.x <= min {
            self.rect.x = min;
            self.vx = self.vx.abs();
        }
    }
}

/// A cosmetic background star (magic/stone/ice skies)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Star {
    pub pos: Vec2,
    pub size: f32,
    pub alpha: f32,
}

/// A cosmetic parallax mountain silhouette
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mountain {
    pub points: Vec<Vec2>,
    /// Depth layer index, 0 = farthest
    pub layer: u32,
}

/// The arena: dimensions, material, and every platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub width: f32,
    pub height: f32,
    pub level_num: u32,
    pub material: Material,
    pub platforms: Vec<Platform>,
    /// Cosmetic backdrop, regenerated with the level
    pub stars: Vec<Star>,
    pub mountains: Vec<Mountain>,
}

impl Level {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            level_num: 1,
            material: Material::Dirt,
            platforms: Vec::new(),
            stars: Vec::new(),
            mountains: Vec::new(),
        }
    }

    /// Whether this level number hosts the bird crystal
    pub fn is_crystal_level(&self) -> bool {
        self.level_num % CRYSTAL_LEVEL_INTERVAL == 0
    }

    /// Generate the layout for `level_num`. Deterministic for a given RNG
    /// state; every 5th level forces the magic material.
    pub fn generate(&mut self, level_num: u32, rng: &mut Pcg32) {
        self.level_num = level_num;
        self.platforms.clear();

        self.material = if level_num % CRYSTAL_LEVEL_INTERVAL == 0 {
            Material::Magic
        } else {
            match rng.random_range(0..4) {
                0 => Material::Dirt,
                1 => Material::Stone,
                2 => Material::Cloud,
                _ => Material::Ice,
            }
        };

        let (w, h) = (self.width, self.height);

        // Guaranteed spawn footing, bottom-left and bottom-right
        self.push(50.0, h - 100.0, 200.0, 40.0, PlatformKind::Static);
        self.push(w - 250.0, h - 100.0, 200.0, 40.0, PlatformKind::Static);

        let roll: f32 = rng.random();
        if roll < 0.15 {
            self.gen_arena_box();
        } else if roll < 0.3 {
            self.gen_islands(rng);
        } else if roll < 0.45 {
            self.gen_tower();
        } else if roll < 0.6 {
            self.gen_trampoline_park();
        } else if roll < 0.75 {
            self.gen_pit();
        } else {
            self.gen_scatter(rng);
        }

        self.generate_backdrop(rng);
    }

    /// Walled box with centered floating steps
    fn gen_arena_box(&mut self) {
        let (w, h) = (self.width, self.height);
        self.push(0.0, h - 50.0, w, 50.0, PlatformKind::Static);
        self.push(0.0, 0.0, 50.0, h, PlatformKind::Static);
        self.push(w - 50.0, 0.0, 50.0, h, PlatformKind::Static);
        for i in 1..4 {
            self.push(
                w / 2.0 - 100.0,
                h - (i as f32 * 150.0),
                200.0,
                20.0,
                PlatformKind::Static,
            );
        }
    }

    /// Rows of floating islands
    fn gen_islands(&mut self, rng: &mut Pcg32) {
        let (w, h) = (self.width, self.height);
        for i in 0..4 {
            let y = h - 100.0 - (i as f32 * 150.0);
            let count = rng.random_range(2..=3);
            let spacing = w / count as f32;
            for j in 0..count {
                let pw = rng.random_range(150.0..300.0);
                let x = (j as f32 * spacing) + spacing / 2.0 - pw / 2.0
                    + rng.random_range(-50.0..50.0);
                self.push(x, y, pw, 30.0, PlatformKind::Static);
            }
        }
    }

    /// Zig-zag vertical climb to a summit
    fn gen_tower(&mut self) {
        let (w, h) = (self.width, self.height);
        self.push(0.0, h - 50.0, w, 50.0, PlatformKind::Static);
        let mut y = h - 150.0;
        let mut x = 100.0;
        for _ in 0..6 {
            self.push(x, y, 150.0, 20.0, PlatformKind::Static);
            x = if x == 100.0 { w - 250.0 } else { 100.0 };
            y -= 120.0;
        }
        self.push(w / 2.0 - 100.0, 150.0, 200.0, 20.0, PlatformKind::Static);
    }

    /// Floor plus bouncy pads and two side ledges
    fn gen_trampoline_park(&mut self) {
        let (w, h) = (self.width, self.height);
        self.push(0.0, h - 50.0, w, 50.0, PlatformKind::Static);
        self.push(200.0, h - 150.0, 100.0, 20.0, PlatformKind::Trampoline);
        self.push(w - 300.0, h - 150.0, 100.0, 20.0, PlatformKind::Trampoline);
        self.push(w / 2.0 - 50.0, h - 300.0, 100.0, 20.0, PlatformKind::Trampoline);
        self.push(0.0, h / 2.0, 150.0, 20.0, PlatformKind::Static);
        self.push(w - 150.0, h / 2.0, 150.0, 20.0, PlatformKind::Static);
    }

    /// Two cliffs over a pit; a moving bridge and rescue trampolines
    fn gen_pit(&mut self) {
        let (w, h) = (self.width, self.height);
        self.push(0.0, h - 200.0, 300.0, 200.0, PlatformKind::Static);
        self.push(w - 300.0, h - 200.0, 300.0, 200.0, PlatformKind::Static);
        self.push(w / 2.0 - 50.0, h - 200.0, 100.0, 20.0, PlatformKind::Moving);
        self.push(350.0, h - 50.0, 100.0, 20.0, PlatformKind::Trampoline);
        self.push(w - 450.0, h - 50.0, 100.0, 20.0, PlatformKind::Trampoline);
    }

    /// Structured random walk across the arena
    fn gen_scatter(&mut self, rng: &mut Pcg32) {
        let (w, h) = (self.width, self.height);
        let mut x = 0.0;
        let mut y = h - 100.0;
        while x < w {
            let pw = rng.random_range(100.0..300.0);
            let kind_roll: f32 = rng.random();
            let kind = if kind_roll < 0.2 {
                PlatformKind::Moving
            } else if kind_roll < 0.3 {
                PlatformKind::Trampoline
            } else {
                PlatformKind::Static
            };
            self.push(x, y, pw, 40.0, kind);

            x += pw + rng.random_range(50.0..150.0);
            y += rng.random_range(-100.0..100.0);
            if y > h - 50.0 {
                y = h - 150.0;
            }
            if y < 200.0 {
                y = 200.0;
            }
        }
    }

    /// Stars for dark skies, mountain silhouettes for outdoor levels.
    /// Purely cosmetic; the render layer draws these verbatim.
    fn generate_backdrop(&mut self, rng: &mut Pcg32) {
        self.stars.clear();
        if matches!(
            self.material,
            Material::Magic | Material::Stone | Material::Ice
        ) {
            for _ in 0..100 {
                self.stars.push(Star {
                    pos: Vec2::new(
                        rng.random_range(0.0..self.width),
                        rng.random_range(0.0..self.height),
                    ),
                    size: rng.random_range(0.0..2.0),
                    alpha: rng.random(),
                });
            }
        }

        self.mountains.clear();
        if self.material != Material::Magic {
            for layer in 0..3 {
                let mut points = vec![Vec2::new(0.0, self.height)];
                let mut x = 0.0;
                while x <= self.width + 200.0 {
                    let peak = rng.random_range(50.0..200.0) + layer as f32 * 50.0;
                    points.push(Vec2::new(x, self.height - peak));
                    x += rng.random_range(50.0..200.0);
                }
                points.push(Vec2::new(self.width, self.height));
                self.mountains.push(Mountain { points, layer });
            }
        }
    }

    fn push(&mut self, x: f32, y: f32, w: f32, h: f32, kind: PlatformKind) {
        self.platforms.push(Platform::new(x, y, w, h, kind));
    }

    /// Advance moving platforms one tick
    pub fn step(&mut self) {
        for p in &mut self.platforms {
            p.step();
        }
    }

    /// Break the single active platform containing `point`. Only ice
    /// platforms shatter; on other materials this is a no-op. Returns the
    /// broken platform's rect for shard effects.
    pub fn break_at(&mut self, point: Vec2) -> Option<Rect> {
        if self.material != Material::Ice {
            return None;
        }
        let p = self
            .platforms
            .iter_mut()
            .find(|p| p.active && p.rect.contains_point(point))?;
        p.active = false;
        Some(p.rect)
    }

    /// Active platforms only, for collision queries
    pub fn active_platforms(&self) -> impl Iterator<Item = &Platform> {
        self.platforms.iter().filter(|p| p.active)
    }
}
