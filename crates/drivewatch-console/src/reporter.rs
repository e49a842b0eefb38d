/// Colored console reporter.
///
/// Each message is printed as `[LEVEL] message` in the level's color.
/// Actions, successes, errors and warnings are also mirrored into the
/// journal so the log file keeps a durable record of what happened to
/// each volume.
use colored::{Color, Colorize};
use drivewatch_core::report::{self, Level, Reporter};
use parking_lot::Mutex;
use std::io::{self, Write};

/// Console color for each level.
pub fn level_color(level: Level) -> Color {
    match level {
        Level::Info => Color::White,
        Level::Action => Color::Yellow,
        Level::Success => Color::Cyan,
        Level::Error => Color::Red,
        Level::Warning => Color::BrightGreen,
        Level::Input => Color::Green,
    }
}

pub struct ConsoleReporter<W = io::Stdout> {
    out: Mutex<W>,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn report(&self, level: Level, message: &str) {
        let line = format!("[{level}] {message}").color(level_color(level));
        {
            let mut out = self.out.lock();
            // A closed console must not take the watcher down with it.
            let _ = writeln!(out, "{line}");
            let _ = out.flush();
        }
        if level.is_journaled() {
            report::journal(level, message);
        }
    }
}
