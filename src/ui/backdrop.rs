use ratatui::{
    Frame,
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::canvas::{Canvas, Points},
};
use std::f64::consts::TAU;
use std::time::Instant;

/// Decoration drawn behind the catalog header. Implementations see only
/// the clock, never catalog state.
pub trait Backdrop {
    fn draw(&self, frame: &mut Frame, area: Rect);
}

const KNOT_P: f64 = 2.0;
const KNOT_Q: f64 = 3.0;
const KNOT_SAMPLES: usize = 360;
const PARTICLES: usize = 240;
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;
const FIELD_RADIUS: f64 = 3.4;

/// A (2,3) torus knot turning over a slowly counter-rotating spiral of
/// particles, with a light point orbiting both.
pub struct TorusKnotBackdrop {
    started: Instant,
}

impl TorusKnotBackdrop {
    pub fn new() -> Self {
        Self { started: Instant::now() }
    }
}

impl Default for TorusKnotBackdrop {
    fn default() -> Self {
        Self::new()
    }
}

/// Projected knot outline at `t` seconds, rotating about the vertical axis.
pub fn knot_points(t: f64) -> Vec<(f64, f64)> {
    let (sin_a, cos_a) = (0.5 * t).sin_cos();
    (0..KNOT_SAMPLES)
        .map(|i| {
            let phi = TAU * i as f64 / KNOT_SAMPLES as f64;
            let r = (KNOT_Q * phi).cos() + 2.0;
            let x = r * (KNOT_P * phi).cos();
            let y = r * (KNOT_P * phi).sin();
            let z = -(KNOT_Q * phi).sin();
            (x * cos_a + z * sin_a, y)
        })
        .collect()
}

/// Golden-angle spiral particle field at `t` seconds.
pub fn particle_points(t: f64) -> Vec<(f64, f64)> {
    let spin = -0.1 * t;
    (0..PARTICLES)
        .map(|i| {
            let radius = FIELD_RADIUS * ((i as f64 + 0.5) / PARTICLES as f64).sqrt();
            let angle = i as f64 * GOLDEN_ANGLE + spin;
            (radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Position of the orbiting light at `t` seconds.
pub fn light_point(t: f64) -> (f64, f64) {
    let (s, c) = (0.5 * t).sin_cos();
    (3.0 * c, 1.5 * s)
}

impl Backdrop for TorusKnotBackdrop {
    fn draw(&self, frame: &mut Frame, area: Rect) {
        if area.width < 4 || area.height < 2 {
            return;
        }
        let t = self.started.elapsed().as_secs_f64();

        // Terminal cells are about twice as tall as wide.
        let aspect = (area.width as f64 / (area.height as f64 * 2.0)).max(1.0);
        let half_height = FIELD_RADIUS + 0.2;
        let half_width = half_height * aspect;

        let particles = particle_points(t);
        let knot = knot_points(t);
        let light = [light_point(t)];

        let canvas = Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([-half_width, half_width])
            .y_bounds([-half_height, half_height])
            .paint(move |ctx| {
                ctx.draw(&Points {
                    coords: &particles,
                    color: Color::DarkGray,
                });
                ctx.layer();
                ctx.draw(&Points {
                    coords: &knot,
                    color: Color::Cyan,
                });
                ctx.layer();
                ctx.draw(&Points {
                    coords: &light,
                    color: Color::Yellow,
                });
            });
        frame.render_widget(canvas, area);
    }
}
