use std::ops::{AddAssign, Sub};

use crate::config;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Rotates the vector to `angle`, keeping its current length.
    pub fn set_angle(&mut self, angle: f32) {
        let length = self.length();
        self.x = angle.cos() * length;
        self.y = angle.sin() * length;
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Scales the vector to `length`, keeping its current direction. The zero
    /// vector points along +x.
    pub fn set_length(&mut self, length: f32) {
        let angle = self.angle();
        self.x = angle.cos() * length;
        self.y = angle.sin() * length;
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Grayscale display color, 0 is black and 255 is white.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shade(pub u8);

impl Shade {
    pub const WHITE: Shade = Shade(255);
}

#[derive(Clone, Debug)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub color: Shade,
    /// Zero for orbiting bodies. Only the central body carries mass.
    pub mass: f32,
}

impl Body {
    pub fn new(
        pos: Vec2,
        radius: f32,
        color: Shade,
        speed: f32,
        direction: f32,
        orbit_offset: f32,
    ) -> Self {
        let mut vel = Vec2::ZERO;
        vel.set_length(speed);
        vel.set_angle(direction);
        Self {
            pos: Vec2::new(pos.x + orbit_offset, pos.y),
            vel,
            radius,
            color,
            mass: 0.0,
        }
    }

    /// A motionless gravity source.
    pub fn central(pos: Vec2, radius: f32, color: Shade, mass: f32) -> Self {
        let mut body = Self::new(pos, radius, color, 0.0, 0.0, 0.0);
        body.mass = mass;
        body
    }

    pub fn is_fixed(&self) -> bool {
        self.mass > 0.0
    }

    pub fn update(&mut self) {
        self.pos += self.vel;
    }

    pub fn angle_to(&self, other: &Body) -> f32 {
        (other.pos - self.pos).angle()
    }

    pub fn distance_to(&self, other: &Body) -> f32 {
        (other.pos - self.pos).length()
    }

    /// Inverse-square pull toward `source` with unit G and unit self-mass.
    pub fn gravitate_to(&mut self, source: &Body) {
        let distance = self.distance_to(source).max(config::MIN_GRAVITY_DISTANCE);
        let mut gravity = Vec2::ZERO;
        gravity.set_length(source.mass / (distance * distance));
        gravity.set_angle(self.angle_to(source));
        self.vel += gravity;
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SimStats {
    pub body_count: usize,
    pub max_bodies: usize,
    pub clear_each_frame: bool,
    pub steps: u64,
}
