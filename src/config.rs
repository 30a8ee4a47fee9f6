use std::{fmt, fs, path::Path, time::Duration};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const TARGET_FPS: f32 = 120.0;
pub const MAX_BODIES: usize = 2000;

pub const CENTRAL_RADIUS: f32 = 100.0;
pub const CENTRAL_MASS: f32 = 15000.0;

pub const SPAWN_SPEED_MIN: f32 = 8.0;
pub const SPAWN_SPEED_MAX: f32 = 12.0;
pub const ORBIT_OFFSET_PER_SPEED: f32 = 25.0;
pub const SPAWN_DIRECTION: f32 = -std::f32::consts::FRAC_PI_2;
pub const SPAWN_RADIUS: f32 = 5.0;

/// World units per canvas pixel.
pub const WORLD_SCALE: f32 = 8.0;

pub const MIN_GRAVITY_DISTANCE: f32 = 1.0;

/// Event poll timeout of the terminal loop, roughly one display refresh.
pub const REFRESH_MS: u64 = 4;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub fps: f32,
    pub max_bodies: usize,
    pub central_radius: f32,
    pub central_mass: f32,
    pub spawn_speed_min: f32,
    pub spawn_speed_max: f32,
    pub orbit_offset_per_speed: f32,
    /// Radians, -pi/2 points up the screen.
    pub spawn_direction: f32,
    pub spawn_radius: f32,
    pub scale: f32,
    pub clear_each_frame: bool,
    /// Fixed RNG seed; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fps: TARGET_FPS,
            max_bodies: MAX_BODIES,
            central_radius: CENTRAL_RADIUS,
            central_mass: CENTRAL_MASS,
            spawn_speed_min: SPAWN_SPEED_MIN,
            spawn_speed_max: SPAWN_SPEED_MAX,
            orbit_offset_per_speed: ORBIT_OFFSET_PER_SPEED,
            spawn_direction: SPAWN_DIRECTION,
            spawn_radius: SPAWN_RADIUS,
            scale: WORLD_SCALE,
            clear_each_frame: true,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    NonPositiveFps(f32),
    /// `1 / fps` does not fit in a `Duration`.
    FrameInterval(f32),
    ZeroMaxBodies,
    SpeedRange { min: f32, max: f32 },
    NonPositiveRadius(f32),
    NonPositiveScale(f32),
    NegativeMass(f32),
    NonFinite(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonPositiveFps(fps) => write!(f, "fps must be positive, got {fps}"),
            ConfigError::FrameInterval(fps) => {
                write!(f, "fps {fps} gives a frame interval out of range")
            }
            ConfigError::ZeroMaxBodies => {
                write!(f, "max_bodies must leave room for the central body")
            }
            ConfigError::SpeedRange { min, max } => {
                write!(f, "spawn speed range {min}..{max} is empty")
            }
            ConfigError::NonPositiveRadius(r) => write!(f, "radius must be positive, got {r}"),
            ConfigError::NonPositiveScale(s) => write!(f, "scale must be positive, got {s}"),
            ConfigError::NegativeMass(m) => write!(f, "central mass must not be negative, got {m}"),
            ConfigError::NonFinite(field) => write!(f, "{field} must be finite"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl SimConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(ConfigError::NonPositiveFps(self.fps));
        }
        self.frame_interval()?;
        if self.max_bodies == 0 {
            return Err(ConfigError::ZeroMaxBodies);
        }
        let (min, max) = (self.spawn_speed_min, self.spawn_speed_max);
        if !(min.is_finite() && max.is_finite() && (max - min).is_finite() && min < max) {
            return Err(ConfigError::SpeedRange {
                min: self.spawn_speed_min,
                max: self.spawn_speed_max,
            });
        }
        for radius in [self.central_radius, self.spawn_radius] {
            if !(radius > 0.0) {
                return Err(ConfigError::NonPositiveRadius(radius));
            }
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ConfigError::NonPositiveScale(self.scale));
        }
        if !(self.central_mass >= 0.0) {
            return Err(ConfigError::NegativeMass(self.central_mass));
        }
        for (field, value) in [
            ("central_mass", self.central_mass),
            ("central_radius", self.central_radius),
            ("spawn_radius", self.spawn_radius),
            ("orbit_offset_per_speed", self.orbit_offset_per_speed),
            ("spawn_direction", self.spawn_direction),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite(field));
            }
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f32(1.0 / self.fps).map_err(|_| ConfigError::FrameInterval(self.fps))
    }
}
