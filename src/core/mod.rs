use std::time::{Duration, Instant};

use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    config::{ConfigError, SimConfig},
    render::{self, Canvas},
    types::{Body, Shade, SimStats, Vec2},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// Set by a resize; the next tick puts the loop back to `Running`.
    Reset,
}

/// Self-throttling against a refresh signal that may fire faster than the
/// target rate.
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    interval: Duration,
    last: Instant,
}

impl FrameClock {
    pub fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last: start,
        }
    }

    pub fn ready(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last) > self.interval
    }

    pub fn mark(&mut self, now: Instant) {
        self.last = now;
    }
}

pub struct Simulation {
    bodies: Vec<Body>,
    max_bodies: usize,
    center: Vec2,
    clear_each_frame: bool,
    clock: FrameClock,
    state: LoopState,
    canvas: Canvas,
    rng: StdRng,
    spawn: SpawnParams,
    steps: u64,
}

#[derive(Clone, Copy, Debug)]
struct SpawnParams {
    speed_min: f32,
    speed_max: f32,
    offset_per_speed: f32,
    direction: f32,
    radius: f32,
}

impl Simulation {
    /// `width` and `height` are the surface size in pixels.
    pub fn new(
        config: &SimConfig,
        width: u16,
        height: u16,
        start: Instant,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let canvas = Canvas::new(width, height, config.scale);
        let center = half(canvas.world_size());
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let central = Body::central(
            center,
            config.central_radius,
            Shade::WHITE,
            config.central_mass,
        );
        let mut bodies = Vec::with_capacity(config.max_bodies);
        bodies.push(central);

        Ok(Self {
            bodies,
            max_bodies: config.max_bodies,
            center,
            clear_each_frame: config.clear_each_frame,
            clock: FrameClock::new(config.frame_interval()?, start),
            state: LoopState::Running,
            canvas,
            rng,
            spawn: SpawnParams {
                speed_min: config.spawn_speed_min,
                speed_max: config.spawn_speed_max,
                offset_per_speed: config.orbit_offset_per_speed,
                direction: config.spawn_direction,
                radius: config.spawn_radius,
            },
            steps: 0,
        })
    }

    /// Called on every refresh. Returns true when a step ran.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.state == LoopState::Reset {
            debug!("loop restarted");
            self.state = LoopState::Running;
        }
        if !self.clock.ready(now) {
            return false;
        }
        if self.clear_each_frame {
            self.canvas.clear();
        }
        self.step();
        self.clock.mark(now);
        true
    }

    pub fn toggle_clear_each_frame(&mut self) {
        self.clear_each_frame = !self.clear_each_frame;
        info!("clear each frame: {}", self.clear_each_frame);
    }

    /// Resizes the surface to `width` x `height` pixels and recenters. The
    /// bodies and the frame clock are left untouched.
    pub fn handle_resize(&mut self, width: u16, height: u16) {
        self.state = LoopState::Reset;
        self.canvas.resize(width, height);
        self.center = half(self.canvas.world_size());
        info!(
            "resized to {}x{} px, center ({:.1}, {:.1})",
            width, height, self.center.x, self.center.y
        );
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn clear_each_frame(&self) -> bool {
        self.clear_each_frame
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn stats(&self) -> SimStats {
        SimStats {
            body_count: self.bodies().len(),
            max_bodies: self.max_bodies,
            clear_each_frame: self.clear_each_frame(),
            steps: self.steps,
        }
    }

    fn step(&mut self) {
        if self.bodies.len() < self.max_bodies {
            self.spawn_body();
            if self.bodies.len() == self.max_bodies {
                info!("body cap of {} reached", self.max_bodies);
            }
        }

        if let Some((central, orbiting)) = self.bodies.split_first_mut() {
            for body in orbiting.iter_mut().filter(|b| !b.is_fixed()) {
                body.gravitate_to(central);
                body.update();
            }
        }

        render::draw(&self.bodies, &mut self.canvas);
        self.steps += 1;
    }

    fn spawn_body(&mut self) {
        let Some(central) = self.bodies.first() else {
            return;
        };
        let origin = central.pos;
        let speed = self
            .rng
            .gen_range(self.spawn.speed_min..self.spawn.speed_max);
        let color = Shade(self.rng.gen_range(0..255));
        let body = Body::new(
            origin,
            self.spawn.radius,
            color,
            speed,
            self.spawn.direction,
            speed * self.spawn.offset_per_speed,
        );
        self.bodies.push(body);
    }
}

fn half(size: Vec2) -> Vec2 {
    Vec2::new(size.x / 2.0, size.y / 2.0)
}
