//! Terminal display and input handling
//!
//! The terminal stands in for a window: the RGBA frame is drawn with upper
//! half-block characters, two pixel rows per text row, and key presses are
//! mapped to camera movement.

use crate::scene::Camera;
use crate::tiles::PixelBuffer;
use crate::vector::Vec3;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::io::{self, stdout, BufWriter, Stdout, Write};
use std::time::{Duration, Instant};

/// Camera translation per key press
pub const MOVE_STEP: f32 = 0.1;

/// Camera rotation per key press, in radians
pub const TURN_STEP: f32 = MOVE_STEP * 0.25;

/// Terminal display handler with buffered output
pub struct TerminalDisplay {
    width: u16,
    height: u16,
    buffer: BufWriter<Stdout>,
}

impl TerminalDisplay {
    pub fn new() -> io::Result<Self> {
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;
        terminal::enable_raw_mode()?;
        execute!(stdout, terminal::Clear(terminal::ClearType::All))?;

        let (width, height) = terminal::size()?;

        Ok(Self {
            width,
            // Leave room for the status line
            height: height.saturating_sub(1),
            buffer: BufWriter::new(stdout),
        })
    }

    /// Text columns and rows available for the frame
    pub fn get_size(&self) -> (usize, usize) {
        (self.width as usize, self.height as usize)
    }

    /// Re-read the terminal size; true if it changed
    pub fn check_resize(&mut self) -> bool {
        if let Ok((width, height)) = terminal::size() {
            let height = height.saturating_sub(1);
            if width != self.width || height != self.height {
                self.width = width;
                self.height = height;
                return true;
            }
        }
        false
    }

    /// Draw a frame scaled to the terminal, followed by a status line
    pub fn present(&mut self, frame: &PixelBuffer, status: &str) -> io::Result<()> {
        let (cols, rows) = self.get_size();
        let content = to_halfblock(frame, cols, rows);

        // hide cursor, disable line wrap
        write!(self.buffer, "\x1b[?25l\x1b[?7l")?;
        for (i, line) in content.lines().enumerate() {
            write!(self.buffer, "\x1b[{};1H{}", i + 1, line)?;
        }
        write!(self.buffer, "\x1b[0m\x1b[J")?;
        write!(self.buffer, "\x1b[{};1H\x1b[K{}", rows + 1, status)?;
        write!(self.buffer, "\x1b[?25h\x1b[?7h")?;
        self.buffer.flush()
    }

    /// Drain pending key presses without blocking longer than `timeout`
    pub fn poll_keys(&self, timeout: Duration) -> io::Result<Vec<KeyEvent>> {
        let mut keys = Vec::new();
        let mut wait = timeout;
        while event::poll(wait)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Release {
                    keys.push(key);
                }
            }
            wait = Duration::ZERO;
        }
        Ok(keys)
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = self.buffer.flush();
        let _ = execute!(stdout(), LeaveAlternateScreen);
    }
}

/// Render an RGBA frame as `rows` lines of `cols` half-block characters,
/// sampling the nearest pixel for each half cell
pub fn to_halfblock(frame: &PixelBuffer, cols: usize, rows: usize) -> String {
    let mut out = String::with_capacity(cols * rows * 40);
    if cols == 0 || rows == 0 || frame.width() == 0 || frame.height() == 0 {
        return out;
    }

    let sub_rows = rows * 2;
    let sample = |col: usize, sub_row: usize| {
        let x = col * frame.width() / cols;
        let y = sub_row * frame.height() / sub_rows;
        frame.pixel(x, y)
    };

    for row in 0..rows {
        for col in 0..cols {
            let top = sample(col, row * 2);
            let bottom = sample(col, row * 2 + 1);
            let _ = write!(
                out,
                "\x1b[38;2;{};{};{};48;2;{};{};{}m\u{2580}",
                top[0], top[1], top[2], bottom[0], bottom[1], bottom[2]
            );
        }
        out.push_str("\x1b[0m\n");
    }

    out
}

/// Key actions for the tracer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    None,
    Quit,
    Reset,
    Pause,
    Move(Vec3),
    /// Pitch and yaw deltas in radians
    Turn(f32, f32),
}

impl Action {
    /// Apply a movement action to the camera; other actions are ignored
    pub fn apply(&self, camera: &mut Camera) {
        match *self {
            Action::Move(delta) => camera.translate(delta),
            Action::Turn(pitch, yaw) => camera.rotate(pitch, yaw),
            _ => {}
        }
    }
}

/// Parse keyboard input into actions
pub fn parse_key_event(event: KeyEvent) -> Action {
    match event.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('r') => Action::Reset,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Char('a') => Action::Move(Vec3::new(-MOVE_STEP, 0.0, 0.0)),
        KeyCode::Char('d') => Action::Move(Vec3::new(MOVE_STEP, 0.0, 0.0)),
        KeyCode::Char('c') => Action::Move(Vec3::new(0.0, -MOVE_STEP, 0.0)),
        KeyCode::Char(' ') => Action::Move(Vec3::new(0.0, MOVE_STEP, 0.0)),
        KeyCode::Char('s') => Action::Move(Vec3::new(0.0, 0.0, -MOVE_STEP)),
        KeyCode::Char('w') => Action::Move(Vec3::new(0.0, 0.0, MOVE_STEP)),
        KeyCode::Up => Action::Turn(TURN_STEP, 0.0),
        KeyCode::Down => Action::Turn(-TURN_STEP, 0.0),
        KeyCode::Left => Action::Turn(0.0, -TURN_STEP),
        KeyCode::Right => Action::Turn(0.0, TURN_STEP),
        _ => Action::None,
    }
}

/// Frames per second averaged over the last few frames
#[derive(Debug)]
pub struct FpsCounter {
    last: Instant,
    samples: VecDeque<f32>,
    window: usize,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(5)
    }
}

impl FpsCounter {
    pub fn new(window: usize) -> Self {
        Self {
            last: Instant::now(),
            samples: VecDeque::with_capacity(window),
            window: window.max(1),
        }
    }

    /// Record a frame finishing now and return the running average
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last);
        self.last = now;
        self.record(elapsed)
    }

    /// Record a frame that took `elapsed` and return the running average
    pub fn record(&mut self, elapsed: Duration) -> f32 {
        let secs = elapsed.as_secs_f32();
        if secs > 0.0 {
            if self.samples.len() == self.window {
                self.samples.pop_front();
            }
            self.samples.push_back(1.0 / secs);
        }
        self.average()
    }

    pub fn average(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f32>() / self.samples.len() as f32
    }
}
