//! Live Telemetry Files
//!
//! One file per concern, rewritten atomically every `interval_ticks`:
//!
//! | File | Content |
//! |------|---------|
//! | `ball_position.txt` | `(x, y, class)` per live object |
//! | `current_position.txt` | `(x, y)` of the agent |
//! | `time.txt` | simulated seconds |
//! | `waypoint_status.txt` | `idle`, `moving` or `reached` |
//! | `score.json` | the four counters and the total |
//!
//! Readers are soft and fall back to defaults.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::core::vec2::Vec2;
use crate::interchange::InterchangeError;
use crate::interchange::atomic::{read_soft, read_trimmed, write_atomic};
use crate::sim::motion::MotionStatus;
use crate::sim::state::{ObjectClass, ScoreState};
use crate::sim::waypoint::tuple_fields;

/// Live object positions.
pub const BALL_POSITION_FILE: &str = "ball_position.txt";
/// Agent position.
pub const CURRENT_POSITION_FILE: &str = "current_position.txt";
/// Simulated time.
pub const TIME_FILE: &str = "time.txt";
/// Motion status token.
pub const STATUS_FILE: &str = "waypoint_status.txt";
/// Score counters.
pub const SCORE_FILE: &str = "score.json";

/// Telemetry settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Write telemetry at all
    pub enabled: bool,
    /// Directory the files live in
    pub dir: PathBuf,
    /// Write every this many ticks (0 is treated as 1)
    pub interval_ticks: u32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("."),
            interval_ticks: 1,
        }
    }
}

/// Score as published in `score.json`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreReport {
    /// Weighted total
    pub score: u32,
    /// Ping balls hit
    pub ping_hit: u32,
    /// Steel balls hit
    pub steel_hit: u32,
    /// Steel balls stored
    pub steel_stored: u32,
    /// Ping balls stored
    pub ping_stored: u32,
}

impl From<ScoreState> for ScoreReport {
    fn from(score: ScoreState) -> Self {
        Self {
            score: score.total(),
            ping_hit: score.ping_hit,
            steel_hit: score.steel_hit,
            steel_stored: score.steel_stored,
            ping_stored: score.ping_stored,
        }
    }
}

/// Everything written in one telemetry pass.
#[derive(Clone, Debug)]
pub struct TelemetrySnapshot {
    /// Simulated seconds
    pub time: f64,
    /// Agent position
    pub agent: Vec2,
    /// Motion status
    pub status: MotionStatus,
    /// Live objects
    pub objects: Vec<(Vec2, ObjectClass)>,
    /// Counters
    pub score: ScoreState,
}

// =============================================================================
// FORMATTING
// =============================================================================

/// `(x, y, class)` lines for every live object.
pub fn format_ball_lines(objects: &[(Vec2, ObjectClass)]) -> String {
    let mut out = String::with_capacity(objects.len() * 32);
    for (position, class) in objects {
        let _ = writeln!(out, "({:.6}, {:.6}, {})", position.x, position.y, class);
    }
    out
}

/// `(x, y)` line for the agent.
pub fn format_position(position: Vec2) -> String {
    format!("({:.6}, {:.6})\n", position.x, position.y)
}

/// Simulated time line.
pub fn format_time(seconds: f64) -> String {
    format!("{:.3}\n", seconds)
}

// =============================================================================
// WRITER
// =============================================================================

/// Periodic telemetry writer. Failures are logged and skipped.
pub struct TelemetryWriter {
    config: TelemetryConfig,
    ticks_since_write: u32,
    failures: u64,
}

impl TelemetryWriter {
    /// Writer for `config`.
    pub fn new(config: TelemetryConfig) -> Self {
        Self {
            config,
            ticks_since_write: 0,
            failures: 0,
        }
    }

    /// Directory the files live in.
    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// Writes that failed so far.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Count one tick and write if the interval has elapsed.
    ///
    /// Returns whether a write pass ran.
    pub fn on_tick(&mut self, snapshot: &TelemetrySnapshot) -> bool {
        if !self.config.enabled {
            return false;
        }
        self.ticks_since_write += 1;
        if self.ticks_since_write < self.config.interval_ticks.max(1) {
            return false;
        }
        self.ticks_since_write = 0;
        self.write_all(snapshot);
        true
    }

    /// Write every file now.
    pub fn write_all(&mut self, snapshot: &TelemetrySnapshot) {
        if !self.config.enabled {
            return;
        }
        let mut files = vec![
            (BALL_POSITION_FILE, format_ball_lines(&snapshot.objects)),
            (CURRENT_POSITION_FILE, format_position(snapshot.agent)),
            (TIME_FILE, format_time(snapshot.time)),
            (STATUS_FILE, format!("{}\n", snapshot.status.as_token())),
        ];
        match serde_json::to_string_pretty(&ScoreReport::from(snapshot.score)) {
            Ok(json) => files.push((SCORE_FILE, json)),
            Err(e) => self.record(SCORE_FILE, Err(e.into())),
        }

        for (name, contents) in files {
            let result = write_atomic(&self.config.dir.join(name), &contents);
            self.record(name, result);
        }
    }

    /// Write only the status file (used when the status flips between passes).
    pub fn write_status(&mut self, status: MotionStatus) {
        if !self.config.enabled {
            return;
        }
        let result = write_atomic(&self.config.dir.join(STATUS_FILE), &format!("{}\n", status.as_token()));
        self.record(STATUS_FILE, result);
    }

    fn record(&mut self, name: &str, result: Result<(), InterchangeError>) {
        if let Err(e) = result {
            self.failures += 1;
            if self.failures == 1 {
                warn!(file = name, error = %e, "telemetry write failed");
            } else {
                debug!(file = name, error = %e, "telemetry write failed");
            }
        }
    }
}

// =============================================================================
// READERS
// =============================================================================

/// A line of `ball_position.txt`.
#[derive(Clone, Debug, PartialEq)]
pub struct BallReading {
    /// Object position
    pub position: Vec2,
    /// Class token as written (`ping` when absent)
    pub class: String,
}

/// Parse `ball_position.txt` text, skipping malformed lines.
pub fn parse_ball_lines(text: &str) -> Vec<BallReading> {
    text.lines()
        .filter_map(|line| {
            let fields = tuple_fields(line)?;
            if fields.len() < 2 {
                return None;
            }
            let x: f64 = fields[0].parse().ok()?;
            let y: f64 = fields[1].parse().ok()?;
            let class = fields
                .get(2)
                .filter(|c| !c.is_empty())
                .map_or_else(|| ObjectClass::Ping.as_str().to_string(), |c| c.to_string());
            Some(BallReading {
                position: Vec2::new(x, y),
                class,
            })
        })
        .collect()
}

/// Parse an `(x, y)` line.
pub fn parse_position(text: &str) -> Option<Vec2> {
    let fields = tuple_fields(text)?;
    if fields.len() < 2 {
        return None;
    }
    let x: f64 = fields[0].parse().ok()?;
    let y: f64 = fields[1].parse().ok()?;
    Some(Vec2::new(x, y))
}

/// Live objects; empty on any failure.
pub fn read_ball_positions(dir: &Path) -> Vec<BallReading> {
    read_soft(&dir.join(BALL_POSITION_FILE))
        .map(|text| parse_ball_lines(&text))
        .unwrap_or_default()
}

/// Agent position, if the file holds one.
pub fn read_current_position(dir: &Path) -> Option<Vec2> {
    read_trimmed(&dir.join(CURRENT_POSITION_FILE)).and_then(|text| parse_position(&text))
}

/// Simulated time; `0.0` on any failure.
pub fn read_time(dir: &Path) -> f64 {
    read_trimmed(&dir.join(TIME_FILE))
        .and_then(|text| text.parse().ok())
        .unwrap_or(0.0)
}

/// Status token; `idle` when missing or blank.
pub fn read_status(dir: &Path) -> String {
    read_trimmed(&dir.join(STATUS_FILE)).unwrap_or_else(|| MotionStatus::Idle.as_token().to_string())
}

/// Score counters; zeros on any failure.
pub fn read_score(dir: &Path) -> ScoreReport {
    read_soft(&dir.join(SCORE_FILE))
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_default()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interchange::atomic::test_dir::TestDir;

    fn snapshot() -> TelemetrySnapshot {
        TelemetrySnapshot {
            time: 1.536,
            agent: Vec2::new(-0.8, 0.0),
            status: MotionStatus::Moving,
            objects: vec![
                (Vec2::new(0.1, -0.2), ObjectClass::Ping),
                (Vec2::new(0.5, 0.25), ObjectClass::Steel),
            ],
            score: ScoreState { ping_hit: 0, steel_hit: 0, steel_stored: 3, ping_stored: 2 },
        }
    }

    fn writer(dir: &TestDir, interval_ticks: u32) -> TelemetryWriter {
        TelemetryWriter::new(TelemetryConfig {
            enabled: true,
            dir: dir.path().to_path_buf(),
            interval_ticks,
        })
    }

    #[test]
    fn test_line_formats() {
        assert_eq!(
            format_ball_lines(&snapshot().objects),
            "(0.100000, -0.200000, ping)\n(0.500000, 0.250000, steel)\n"
        );
        assert_eq!(format_position(Vec2::new(-0.8, 0.0)), "(-0.800000, 0.000000)\n");
        assert_eq!(format_time(1.536), "1.536\n");
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = TestDir::new("telemetry");
        let mut writer = writer(&dir, 1);
        assert!(writer.on_tick(&snapshot()));

        let balls = read_ball_positions(dir.path());
        assert_eq!(balls.len(), 2);
        assert_eq!(balls[1].class, "steel");
        assert_eq!(read_current_position(dir.path()), Some(Vec2::new(-0.8, 0.0)));
        assert!((read_time(dir.path()) - 1.536).abs() < 1e-9);
        assert_eq!(read_status(dir.path()), "moving");

        let score = read_score(dir.path());
        assert_eq!(score.score, 3);
        assert_eq!(score.ping_stored, 2);
        assert_eq!(writer.failures(), 0);
    }

    #[test]
    fn test_interval() {
        let dir = TestDir::new("interval");
        let mut writer = writer(&dir, 3);
        let writes: Vec<bool> = (0..6).map(|_| writer.on_tick(&snapshot())).collect();
        assert_eq!(writes, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn test_disabled_writes_nothing() {
        let dir = TestDir::new("disabled");
        let mut writer = TelemetryWriter::new(TelemetryConfig {
            enabled: false,
            dir: dir.path().to_path_buf(),
            interval_ticks: 1,
        });
        assert!(!writer.on_tick(&snapshot()));
        assert!(!dir.join(TIME_FILE).exists());
    }

    #[test]
    fn test_failures_are_counted_not_fatal() {
        let dir = TestDir::new("failing");
        let mut writer = TelemetryWriter::new(TelemetryConfig {
            enabled: true,
            dir: dir.join("missing"),
            interval_ticks: 1,
        });
        assert!(writer.on_tick(&snapshot()));
        assert_eq!(writer.failures(), 5);
    }

    #[test]
    fn test_soft_reader_defaults() {
        let dir = TestDir::new("defaults");
        assert!(read_ball_positions(dir.path()).is_empty());
        assert_eq!(read_current_position(dir.path()), None);
        assert_eq!(read_time(dir.path()), 0.0);
        assert_eq!(read_status(dir.path()), "idle");
        assert_eq!(read_score(dir.path()), ScoreReport::default());

        write_atomic(&dir.join(TIME_FILE), "not a number").unwrap();
        assert_eq!(read_time(dir.path()), 0.0);
    }

    #[test]
    fn test_ball_parser_is_lenient() {
        let balls = parse_ball_lines("(0.1, 0.2)\ngarbage\n\n(0.3, x, steel)\n0.4, 0.5, steel\n");
        assert_eq!(balls.len(), 2);
        assert_eq!(balls[0].class, "ping");
        assert_eq!(balls[1].position, Vec2::new(0.4, 0.5));
    }
}
