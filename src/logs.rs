//! Log events emitted while loading, adjusting and composing scenes.

use std::io::{stderr, Error as IoError, Stderr, Write};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum LogEvent {
    Info(String),
    Warn(String),
    Status(String),
    Error(String),
    Done(String),
}

impl LogEvent {
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warn(_))
    }
}

/// Receives log events. Library code never prints on its own.
pub trait Logger {
    fn log(&mut self, event: LogEvent);
}

/// Collects events, mostly useful to inspect what a call reported.
impl Logger for Vec<LogEvent> {
    fn log(&mut self, event: LogEvent) {
        self.push(event);
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct Quiet;

impl Logger for Quiet {
    fn log(&mut self, _event: LogEvent) {}
}

/// Writes colored, labelled lines to a terminal.
#[derive(Debug)]
pub struct TermLogger<T: Write> {
    tty: T,
    time: Instant,
    status: bool,
}

impl TermLogger<Stderr> {
    pub fn new_stderr() -> Self {
        Self::new(stderr())
    }
}

impl<T: Write> TermLogger<T> {
    pub fn new(tty: T) -> Self {
        Self {
            tty,
            time: Instant::now(),
            status: false,
        }
    }

    fn write_event(&mut self, event: LogEvent) -> Result<(), IoError> {
        match event {
            LogEvent::Info(msg) => self.log_message("INFO", msg, termion::color::LightBlack),
            LogEvent::Warn(msg) => self.log_message("WARN", msg, termion::color::LightYellow),
            LogEvent::Error(msg) => self.log_message("FAIL", msg, termion::color::LightRed),
            LogEvent::Done(msg) => {
                let secs = self.time.elapsed().as_secs_f64();
                self.log_message("DONE", format!("{msg} ({secs:.2}s)"), termion::color::LightGreen)
            }
            LogEvent::Status(msg) => self.log_status(msg),
        }
    }

    fn log_message(
        &mut self,
        label: &'static str,
        msg: String,
        color: impl termion::color::Color,
    ) -> Result<(), IoError> {
        let msg = msg.replace('\t', "    ");
        let color = termion::color::Fg(color);
        let reset = termion::style::Reset;
        let clear = termion::clear::UntilNewline;
        if self.status {
            write!(self.tty, "\r")?;
            self.status = false;
        }
        writeln!(self.tty, "{color}[{label}] {reset}{msg}{clear}")?;
        self.tty.flush()
    }

    fn log_status(&mut self, msg: String) -> Result<(), IoError> {
        let color = termion::color::Fg(termion::color::Blue);
        let reset = termion::style::Reset;
        let clear = termion::clear::UntilNewline;
        write!(self.tty, "\r{color}[....] {reset}{msg}{clear}")?;
        self.status = true;
        self.tty.flush()
    }
}

impl<T: Write> Logger for TermLogger<T> {
    fn log(&mut self, event: LogEvent) {
        // a closed terminal is not worth failing a render over
        let _ = self.write_event(event);
    }
}
