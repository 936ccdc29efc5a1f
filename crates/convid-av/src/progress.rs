//! ffmpeg progress output parsing.
//!
//! Understands the machine-readable `-progress` key=value stream and the
//! human-readable stderr lines (`Duration: ...` / `time=...`) so either
//! output can drive a percentage.

use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Duration:\s*(\d+:\d{2}:\d{2}(?:\.\d+)?)").expect("valid regex"))
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"time=\s*(\d+:\d{2}:\d{2}(?:\.\d+)?)").expect("valid regex"))
}

/// Parse `HH:MM:SS` with an optional fractional second part.
pub fn parse_timestamp(s: &str) -> Option<Duration> {
    let mut parts = s.trim().splitn(3, ':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    Some(Duration::from_secs(hours * 3600 + minutes * 60) + Duration::from_secs_f64(seconds))
}

/// Turns ffmpeg output lines into completion percentages.
#[derive(Debug, Clone, Default)]
pub struct ProgressParser {
    total: Option<Duration>,
    elapsed: Duration,
    finished: bool,
}

impl ProgressParser {
    /// Create a parser for a source of known (probed) duration.
    pub fn new(total: Option<Duration>) -> Self {
        Self {
            total: total.filter(|d| !d.is_zero()),
            elapsed: Duration::ZERO,
            finished: false,
        }
    }

    /// Whether ffmpeg reported `progress=end`.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Current completion in percent, capped at 100.
    pub fn percent(&self) -> Option<f64> {
        if self.finished {
            return Some(100.0);
        }
        let total = self.total?;
        Some((self.elapsed.as_secs_f64() / total.as_secs_f64() * 100.0).min(100.0))
    }

    /// Feed one output line; returns the new percentage when it changed.
    pub fn feed_line(&mut self, line: &str) -> Option<f64> {
        let line = line.trim();

        if let Some((key, value)) = line.split_once('=') {
            if matches!(key, "out_time_us" | "out_time_ms" | "out_time" | "progress") {
                return self.feed_key_value(key, value.trim());
            }
        }

        if self.total.is_none() {
            if let Some(caps) = duration_re().captures(line) {
                self.total = parse_timestamp(&caps[1]).filter(|d| !d.is_zero());
                return None;
            }
        }

        if let Some(caps) = time_re().captures(line) {
            if let Some(t) = parse_timestamp(&caps[1]) {
                return self.advance(t);
            }
        }

        None
    }

    fn feed_key_value(&mut self, key: &str, value: &str) -> Option<f64> {
        match key {
            // ffmpeg reports out_time_ms in microseconds as well.
            "out_time_us" | "out_time_ms" => {
                let micros: u64 = value.parse().ok()?;
                self.advance(Duration::from_micros(micros))
            }
            "out_time" => parse_timestamp(value).and_then(|t| self.advance(t)),
            "progress" if value == "end" => {
                self.finished = true;
                Some(100.0)
            }
            _ => None,
        }
    }

    fn advance(&mut self, elapsed: Duration) -> Option<f64> {
        if elapsed <= self.elapsed && !self.elapsed.is_zero() {
            return None;
        }
        self.elapsed = elapsed;
        self.percent()
    }
}
