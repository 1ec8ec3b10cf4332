use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use tracing::warn;

use crate::converter::report::ConversionSummary;
use crate::models::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    Searching,
    Done,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSearch {
    pub message: String,
    pub track: Track,
    pub status: SearchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Done {
    pub message: String,
    pub info: ConversionSummary,
}

/// Lifecycle events of one conversion, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Info(String),
    TrackSearch(TrackSearch),
    Error(String),
    Done(Done),
}

impl ProgressEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressEvent::Info(_) => "info",
            ProgressEvent::TrackSearch(_) => "track_search",
            ProgressEvent::Error(_) => "error",
            ProgressEvent::Done(_) => "done",
        }
    }

    /// JSON payload; free-text events encode as a JSON string.
    pub fn payload(&self) -> serde_json::Result<String> {
        match self {
            ProgressEvent::Info(text) | ProgressEvent::Error(text) => serde_json::to_string(text),
            ProgressEvent::TrackSearch(search) => serde_json::to_string(search),
            ProgressEvent::Done(done) => serde_json::to_string(done),
        }
    }
}

/// Receives events synchronously, in the order the converter produces them.
pub trait ProgressReporter: Send {
    fn emit(&mut self, event: ProgressEvent);
}

/// Drops every event; used when only the final result matters.
#[derive(Debug, Default)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn emit(&mut self, _event: ProgressEvent) {}
}

/// Writes `event: <kind>` / `data: <json>` pairs and flushes after each one.
///
/// Write failures (a disconnected client) are logged and otherwise ignored:
/// the conversion keeps running.
pub struct EventStreamReporter<W: Write + Send> {
    writer: W,
    disconnected: bool,
}

impl<W: Write + Send> EventStreamReporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            disconnected: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_event(&mut self, event: &ProgressEvent) -> std::io::Result<()> {
        let payload = event.payload()?;
        write!(self.writer, "event: {}\ndata: {}\n\n", event.kind(), payload)?;
        self.writer.flush()
    }
}

impl<W: Write + Send> ProgressReporter for EventStreamReporter<W> {
    fn emit(&mut self, event: ProgressEvent) {
        if self.disconnected {
            return;
        }
        if let Err(e) = self.write_event(&event) {
            warn!("Event stream closed, continuing without it: {}", e);
            self.disconnected = true;
        }
    }
}

/// Terminal output: a spinner while tracks are searched and a line per miss.
pub struct ConsoleReporter {
    pb: ProgressBar,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {pos} tracks {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(120));
        Self { pb }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleReporter {
    fn emit(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Info(text) => {
                self.pb.set_message(text.clone());
                self.pb.println(format!("  {}", text.cyan()));
            }
            ProgressEvent::TrackSearch(search) => match search.status {
                SearchStatus::Searching => self.pb.set_message(search.message),
                SearchStatus::Done => self.pb.inc(1),
                SearchStatus::Error => {
                    self.pb.inc(1);
                    self.pb.println(format!(
                        "  {} {} - {}",
                        "✗".red(),
                        search.track.title,
                        search.track.artists.join(", ")
                    ));
                }
            },
            ProgressEvent::Error(text) => {
                self.pb.println(format!("  {}", text.red()));
            }
            ProgressEvent::Done(done) => {
                self.pb.finish_and_clear();
                let message = if done.info.conversion_successful {
                    done.message.green()
                } else {
                    done.message.yellow()
                };
                println!("{}", message);
            }
        }
    }
}
