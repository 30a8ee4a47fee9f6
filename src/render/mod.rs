use crate::types::{Body, Shade, Vec2};

/// Persistent pixel surface. Pixels stay painted until `clear` or `resize`,
/// which is what lets orbits leave trails.
#[derive(Debug)]
pub struct Canvas {
    width: u16,
    height: u16,
    scale: f32,
    pixels: Vec<Option<Shade>>,
}

impl Canvas {
    /// Panics unless `scale` is positive and finite. `SimConfig::validate`
    /// rejects such scales before a simulation builds its canvas.
    pub fn new(width: u16, height: u16, scale: f32) -> Self {
        assert!(
            scale.is_finite() && scale > 0.0,
            "scale must be positive and finite"
        );
        let mut canvas = Self {
            width,
            height,
            scale,
            pixels: Vec::new(),
        };
        canvas.resize(width, height);
        canvas
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let len = (width as usize).saturating_mul(height as usize);
        self.pixels.resize(len, None);
        self.clear();
    }

    pub fn clear(&mut self) {
        self.pixels.fill(None);
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Surface extent in world units.
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.scale,
            self.height as f32 * self.scale,
        )
    }

    pub fn get(&self, x: u16, y: u16) -> Option<Shade> {
        debug_assert!(x < self.width && y < self.height, "get() out of bounds");
        self.pixels[(y as usize) * (self.width as usize) + (x as usize)]
    }

    fn set(&mut self, x: i32, y: i32, shade: Shade) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.pixels[idx] = Some(shade);
    }

    /// Paints every pixel whose center falls inside the disc. The pixel under
    /// the disc center is always painted so sub-pixel bodies stay visible.
    pub fn fill_disc(&mut self, center: Vec2, radius: f32, shade: Shade) {
        if !(center.x.is_finite() && center.y.is_finite()) {
            return;
        }
        let cx = center.x / self.scale;
        let cy = center.y / self.scale;
        let r = radius / self.scale;
        let r_sq = r * r;

        let x0 = ((cx - r).floor() as i32).max(0);
        let x1 = ((cx + r).ceil() as i32).min(self.width as i32 - 1);
        let y0 = ((cy - r).floor() as i32).max(0);
        let y1 = ((cy + r).ceil() as i32).min(self.height as i32 - 1);
        for y in y0..=y1 {
            let dy = y as f32 + 0.5 - cy;
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - cx;
                if dx * dx + dy * dy <= r_sq {
                    self.set(x, y, shade);
                }
            }
        }
        self.set(cx.floor() as i32, cy.floor() as i32, shade);
    }
}

pub fn draw(bodies: &[Body], canvas: &mut Canvas) {
    for body in bodies {
        canvas.fill_disc(body.pos, body.radius, body.color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painted(canvas: &Canvas) -> usize {
        let mut count = 0;
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                if canvas.get(x, y).is_some() {
                    count += 1;
                }
            }
        }
        count
    }

    mod canvas {
        use super::*;

        #[test]
        fn creates_with_correct_dimensions() {
            let canvas = Canvas::new(80, 48, 1.0);
            assert_eq!(canvas.width(), 80);
            assert_eq!(canvas.height(), 48);
            assert_eq!(painted(&canvas), 0);
        }

        #[test]
        fn world_size_applies_scale() {
            let canvas = Canvas::new(160, 96, 8.0);
            assert_eq!(canvas.world_size(), Vec2::new(1280.0, 768.0));
        }

        #[test]
        #[should_panic(expected = "scale must be positive and finite")]
        fn panics_with_zero_scale() {
            Canvas::new(10, 10, 0.0);
        }

        #[test]
        fn resize_changes_dimensions_and_clears() {
            let mut canvas = Canvas::new(10, 10, 1.0);
            canvas.fill_disc(Vec2::new(5.0, 5.0), 3.0, Shade(40));
            canvas.resize(20, 15);
            assert_eq!(canvas.width(), 20);
            assert_eq!(canvas.height(), 15);
            assert_eq!(painted(&canvas), 0);
        }

        #[test]
        fn clear_empties_every_pixel() {
            let mut canvas = Canvas::new(10, 10, 1.0);
            canvas.fill_disc(Vec2::new(5.0, 5.0), 4.0, Shade(40));
            assert!(painted(&canvas) > 0);
            canvas.clear();
            assert_eq!(painted(&canvas), 0);
        }

        #[test]
        fn zero_dimensions_tolerate_drawing() {
            let mut canvas = Canvas::new(0, 0, 1.0);
            canvas.fill_disc(Vec2::ZERO, 5.0, Shade(1));
            assert_eq!(painted(&canvas), 0);
        }
    }

    mod fill_disc {
        use super::*;

        #[test]
        fn covers_pixels_inside_radius() {
            let mut canvas = Canvas::new(20, 20, 1.0);
            canvas.fill_disc(Vec2::new(10.0, 10.0), 3.0, Shade(200));
            assert_eq!(canvas.get(10, 10), Some(Shade(200)));
            assert_eq!(canvas.get(7, 10), Some(Shade(200)));
            assert_eq!(canvas.get(11, 11), Some(Shade(200)));
            assert_eq!(canvas.get(14, 10), None);
            assert_eq!(canvas.get(7, 7), None);
        }

        #[test]
        fn scale_shrinks_disc_on_screen() {
            let mut canvas = Canvas::new(20, 20, 10.0);
            canvas.fill_disc(Vec2::new(100.0, 100.0), 30.0, Shade(9));
            assert_eq!(canvas.get(10, 10), Some(Shade(9)));
            assert_eq!(canvas.get(8, 10), Some(Shade(9)));
            assert_eq!(canvas.get(14, 10), None);
        }

        #[test]
        fn tiny_disc_paints_its_pixel() {
            let mut canvas = Canvas::new(10, 10, 8.0);
            canvas.fill_disc(Vec2::new(43.0, 21.0), 1.0, Shade(3));
            assert_eq!(canvas.get(5, 2), Some(Shade(3)));
            assert_eq!(painted(&canvas), 1);
        }

        #[test]
        fn clips_at_edges() {
            let mut canvas = Canvas::new(10, 10, 1.0);
            canvas.fill_disc(Vec2::new(0.0, 0.0), 3.0, Shade(1));
            canvas.fill_disc(Vec2::new(-50.0, 500.0), 3.0, Shade(1));
            assert_eq!(canvas.get(0, 0), Some(Shade(1)));
            assert_eq!(canvas.get(9, 9), None);
        }

        #[test]
        fn non_finite_center_is_ignored() {
            let mut canvas = Canvas::new(10, 10, 1.0);
            canvas.fill_disc(Vec2::new(f32::NAN, 3.0), 3.0, Shade(1));
            assert_eq!(painted(&canvas), 0);
        }

        #[test]
        fn later_disc_overwrites_earlier() {
            let mut canvas = Canvas::new(10, 10, 1.0);
            canvas.fill_disc(Vec2::new(5.0, 5.0), 2.0, Shade(10));
            canvas.fill_disc(Vec2::new(5.0, 5.0), 1.0, Shade(20));
            assert_eq!(canvas.get(5, 5), Some(Shade(20)));
            assert_eq!(canvas.get(3, 5), Some(Shade(10)));
        }
    }

    mod draw_fn {
        use super::*;

        #[test]
        fn empty_body_list_leaves_canvas_blank() {
            let mut canvas = Canvas::new(20, 20, 1.0);
            draw(&[], &mut canvas);
            assert_eq!(painted(&canvas), 0);
        }

        #[test]
        fn draws_each_body_with_its_color() {
            let mut canvas = Canvas::new(40, 20, 1.0);
            let bodies = vec![
                Body::central(Vec2::new(10.0, 10.0), 2.0, Shade::WHITE, 1.0),
                Body::new(Vec2::new(30.0, 10.0), 1.0, Shade(77), 0.0, 0.0, 0.0),
            ];
            draw(&bodies, &mut canvas);
            assert_eq!(canvas.get(10, 10), Some(Shade::WHITE));
            assert_eq!(canvas.get(30, 10), Some(Shade(77)));
        }
    }
}
