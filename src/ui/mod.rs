use std::{
    io,
    time::{Duration, Instant},
};

use anyhow::Context;
use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event as CrosstermEvent, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use crate::{
    config::{self, SimConfig},
    core::Simulation,
    render::Canvas,
    types::{Shade, SimStats},
};

pub fn run(sim_config: &SimConfig) -> anyhow::Result<()> {
    install_panic_hook();
    let guard = TerminalGuard::enter()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, sim_config);
    drop(guard);
    info!("terminal restored");
    result
}

/// Raw mode and the alternate screen for as long as the guard lives.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> anyhow::Result<Self> {
        enable_raw_mode().context("enabling raw mode")?;
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen, Hide).context("entering alternate screen")?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        default_hook(panic_info);
    }));
}

/// Best effort: runs from `Drop` and the panic hook, where errors have
/// nowhere to go.
fn restore_terminal() {
    if let Err(err) = disable_raw_mode() {
        warn!("disabling raw mode: {err}");
    }
    if let Err(err) = restore_screen(&mut io::stdout()) {
        warn!("leaving alternate screen: {err}");
    }
}

fn restore_screen<W: io::Write>(out: &mut W) -> io::Result<()> {
    execute!(out, LeaveAlternateScreen, Show)
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, sim_config: &SimConfig) -> anyhow::Result<()> {
    let (width, height) = canvas_size(terminal.size()?);
    let mut sim = Simulation::new(sim_config, width, height, Instant::now())?;
    info!(
        "surface {}x{} px, center {:?}, step every {:?}",
        width,
        height,
        sim.center(),
        sim_config.frame_interval()?
    );

    let refresh = Duration::from_millis(config::REFRESH_MS);
    let mut hud = Hud::new();
    let mut dirty = true;

    loop {
        if event::poll(refresh)? {
            match event::read()? {
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('c') | KeyCode::Char(' ') => sim.toggle_clear_each_frame(),
                    _ => {}
                },
                CrosstermEvent::Resize(cols, rows) => {
                    let (width, height) = canvas_size(Rect::new(0, 0, cols, rows));
                    sim.handle_resize(width, height);
                    dirty = true;
                }
                _ => {}
            }
        }

        if sim.tick(Instant::now()) {
            hud.count_step();
            dirty = true;
        }

        if dirty {
            let stats = sim.stats();
            let steps_per_sec = hud.sample();
            terminal.draw(|frame| draw_frame(frame, sim.canvas(), stats, steps_per_sec))?;
            dirty = false;
        }
    }
}

fn layout(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

fn viewport_block() -> Block<'static> {
    Block::default().borders(Borders::ALL).title("Orbits")
}

/// Canvas pixels for a terminal of `area`: each viewport cell holds two
/// pixels stacked vertically.
fn canvas_size(area: Rect) -> (u16, u16) {
    let inner = viewport_block().inner(layout(area)[1]);
    (inner.width, inner.height.saturating_mul(2))
}

fn draw_frame(frame: &mut Frame, canvas: &Canvas, stats: SimStats, steps_per_sec: f32) {
    let [header_area, viewport_area, footer_area] = layout(frame.size());

    let header = Paragraph::new(format!(
        "bodies: {}/{} | clear each frame: {} | step: {} | steps/s: {:.1}",
        stats.body_count,
        stats.max_bodies,
        if stats.clear_each_frame { "on" } else { "off" },
        stats.steps,
        steps_per_sec
    ))
    .block(Block::default().borders(Borders::ALL).title("orbitfall"));
    frame.render_widget(header, header_area);

    let viewport = Paragraph::new(canvas_lines(canvas)).block(viewport_block());
    frame.render_widget(viewport, viewport_area);

    let footer = Paragraph::new("c/space: toggle clear | q: quit")
        .block(Block::default().borders(Borders::ALL).title("Controls"));
    frame.render_widget(footer, footer_area);
}

fn canvas_lines(canvas: &Canvas) -> Vec<Line<'static>> {
    let rows = canvas.height().div_ceil(2);
    (0..rows)
        .map(|row| {
            let top_y = row * 2;
            let spans: Vec<Span> = (0..canvas.width())
                .map(|x| {
                    let top = canvas.get(x, top_y);
                    let bottom = if top_y + 1 < canvas.height() {
                        canvas.get(x, top_y + 1)
                    } else {
                        None
                    };
                    half_block(top, bottom)
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn half_block(top: Option<Shade>, bottom: Option<Shade>) -> Span<'static> {
    match (top, bottom) {
        (None, None) => Span::raw(" "),
        (Some(top), None) => Span::styled("▀", Style::default().fg(shade_color(top))),
        (None, Some(bottom)) => Span::styled("▄", Style::default().fg(shade_color(bottom))),
        (Some(top), Some(bottom)) => Span::styled(
            "▀",
            Style::default().fg(shade_color(top)).bg(shade_color(bottom)),
        ),
    }
}

fn shade_color(shade: Shade) -> Color {
    Color::Rgb(shade.0, shade.0, shade.0)
}

/// Measured steps per second, resampled once a second.
struct Hud {
    steps: u32,
    since: Instant,
    rate: f32,
}

impl Hud {
    fn new() -> Self {
        Self {
            steps: 0,
            since: Instant::now(),
            rate: 0.0,
        }
    }

    fn count_step(&mut self) {
        self.steps += 1;
    }

    fn sample(&mut self) -> f32 {
        let elapsed = self.since.elapsed();
        if elapsed >= Duration::from_secs(1) {
            self.rate = self.steps as f32 / elapsed.as_secs_f32();
            self.steps = 0;
            self.since = Instant::now();
        }
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec2;
    use ratatui::backend::TestBackend;

    mod canvas_size_fn {
        use super::*;

        #[test]
        fn subtracts_header_footer_and_borders() {
            // 24 rows: 3 header, 3 footer, 18 viewport, 16 inside the border
            assert_eq!(canvas_size(Rect::new(0, 0, 80, 24)), (78, 32));
        }

        #[test]
        fn tiny_terminal_does_not_underflow() {
            let (w, h) = canvas_size(Rect::new(0, 0, 1, 1));
            assert_eq!(w, 0);
            assert_eq!(h, 0);
        }
    }

    mod canvas_lines_fn {
        use super::*;

        #[test]
        fn packs_two_pixel_rows_per_line() {
            let canvas = Canvas::new(4, 5, 1.0);
            let lines = canvas_lines(&canvas);
            assert_eq!(lines.len(), 3);
            assert!(lines.iter().all(|line| line.spans.len() == 4));
        }

        #[test]
        fn blank_canvas_renders_spaces() {
            let canvas = Canvas::new(3, 2, 1.0);
            let lines = canvas_lines(&canvas);
            assert!(lines[0].spans.iter().all(|span| span.content == " "));
        }

        #[test]
        fn painted_pixel_uses_half_block() {
            let mut canvas = Canvas::new(4, 4, 1.0);
            canvas.fill_disc(Vec2::new(1.2, 0.2), 0.1, Shade(128));
            let lines = canvas_lines(&canvas);
            let span = &lines[0].spans[1];
            assert_eq!(span.content, "▀");
            assert_eq!(span.style.fg, Some(Color::Rgb(128, 128, 128)));
            assert_eq!(span.style.bg, None);
        }
    }

    mod half_block_fn {
        use super::*;

        #[test]
        fn bottom_only_uses_lower_block() {
            let span = half_block(None, Some(Shade(9)));
            assert_eq!(span.content, "▄");
            assert_eq!(span.style.fg, Some(Color::Rgb(9, 9, 9)));
        }

        #[test]
        fn both_pixels_use_fg_and_bg() {
            let span = half_block(Some(Shade(1)), Some(Shade(2)));
            assert_eq!(span.style.fg, Some(Color::Rgb(1, 1, 1)));
            assert_eq!(span.style.bg, Some(Color::Rgb(2, 2, 2)));
        }
    }

    mod restore_screen_fn {
        use super::*;

        #[test]
        fn leaves_alternate_screen_and_shows_cursor() {
            let mut out = Vec::new();
            restore_screen(&mut out).unwrap();
            let written = String::from_utf8(out).unwrap();
            assert!(written.contains("\x1b[?1049l"));
            assert!(written.contains("\x1b[?25h"));
        }
    }

    mod draw_frame_fn {
        use super::*;

        fn row_text(terminal: &Terminal<TestBackend>, y: u16) -> String {
            let buffer = terminal.backend().buffer();
            (0..buffer.area.width)
                .map(|x| buffer.get(x, y).symbol().to_string())
                .collect()
        }

        #[test]
        fn renders_stats_and_controls() {
            let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
            let canvas = Canvas::new(78, 32, 1.0);
            let stats = SimStats {
                body_count: 12,
                max_bodies: 2000,
                clear_each_frame: false,
                steps: 11,
            };
            terminal
                .draw(|frame| draw_frame(frame, &canvas, stats, 119.5))
                .unwrap();

            let header = row_text(&terminal, 1);
            assert!(header.contains("bodies: 12/2000"));
            assert!(header.contains("clear each frame: off"));
            assert!(header.contains("step: 11 |"));
            assert!(header.contains("steps/s: 119.5"));
            assert!(row_text(&terminal, 22).contains("q: quit"));
        }
    }
}
