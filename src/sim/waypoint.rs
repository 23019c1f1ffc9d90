//! Waypoints
//!
//! Text form of a navigation target, `(x, y, heading_or_none)`, shared by the
//! injection file and the policy tool, plus the default patrol route.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::vec2::Vec2;
use crate::sim::motion::MotionTask;

/// Heading token meaning "face the target first".
pub const NO_HEADING: &str = "None";

/// Reasons a waypoint line is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WaypointParseError {
    /// Nothing but whitespace.
    #[error("empty waypoint line")]
    Empty,

    /// Not `(x, y)` or `(x, y, heading)`.
    #[error("expected 2 or 3 fields, found {0}")]
    FieldCount(usize),

    /// A field is not a number.
    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    /// NaN or infinite coordinate.
    #[error("non-finite value `{0}`")]
    NonFinite(String),
}

/// A parsed target with an optional final heading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Target position
    pub target: Vec2,
    /// Final heading, radians
    pub heading: Option<f64>,
}

impl Waypoint {
    /// Waypoint without a final heading.
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            target: Vec2::new(x, y),
            heading: None,
        }
    }

    /// Motion task with default speeds.
    pub fn to_task(self) -> MotionTask {
        MotionTask {
            target: self.target,
            heading: self.heading,
            linear_speed: None,
            angular_speed: None,
        }
    }
}

impl From<Waypoint> for MotionTask {
    fn from(waypoint: Waypoint) -> Self {
        waypoint.to_task()
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.heading {
            Some(heading) => write!(f, "({:.6}, {:.6}, {:.6})", self.target.x, self.target.y, heading),
            None => write!(f, "({:.6}, {:.6}, {})", self.target.x, self.target.y, NO_HEADING),
        }
    }
}

impl FromStr for Waypoint {
    type Err = WaypointParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields = tuple_fields(line).ok_or(WaypointParseError::Empty)?;
        if !(2..=3).contains(&fields.len()) {
            return Err(WaypointParseError::FieldCount(fields.len()));
        }

        let x = parse_finite(fields[0])?;
        let y = parse_finite(fields[1])?;
        let heading = match fields.get(2) {
            Some(raw) if is_none_token(raw) => None,
            Some(raw) => Some(parse_finite(raw)?),
            None => None,
        };

        Ok(Self {
            target: Vec2::new(x, y),
            heading,
        })
    }
}

/// Parse every non-blank line. Stops at the first bad line.
pub fn parse_waypoints(text: &str) -> Result<Vec<Waypoint>, WaypointParseError> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// Split `(a, b, c)` or `a, b, c` into trimmed fields.
///
/// Returns `None` for a blank line.
pub fn tuple_fields(line: &str) -> Option<Vec<&str>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let inner = line
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(line);
    Some(inner.split(',').map(str::trim).collect())
}

fn is_none_token(raw: &str) -> bool {
    raw.is_empty() || raw.eq_ignore_ascii_case("none") || raw.eq_ignore_ascii_case("null")
}

fn parse_finite(raw: &str) -> Result<f64, WaypointParseError> {
    let value: f64 = raw
        .parse()
        .map_err(|_| WaypointParseError::InvalidNumber(raw.to_string()))?;
    if !value.is_finite() {
        return Err(WaypointParseError::NonFinite(raw.to_string()));
    }
    Ok(value)
}

/// Corners visited by the patrol, starting at the centre.
pub const PATROL_LOOP: [Waypoint; 5] = [
    Waypoint::new(0.0, 0.0),
    Waypoint::new(0.8, 0.8),
    Waypoint::new(0.8, -0.8),
    Waypoint::new(-0.8, -0.8),
    Waypoint::new(-0.8, 0.8),
];

/// Laps of [`PATROL_LOOP`] in the default route.
pub const PATROL_LAPS: usize = 5;

/// Centre, four corners, repeated, then back to the centre.
pub fn default_patrol_route() -> Vec<Waypoint> {
    let mut route: Vec<Waypoint> = PATROL_LOOP
        .iter()
        .copied()
        .cycle()
        .take(PATROL_LOOP.len() * PATROL_LAPS)
        .collect();
    route.push(Waypoint::new(0.0, 0.0));
    route
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_without_heading() {
        let wp: Waypoint = "(0.250000, -0.500000, None)".parse().unwrap();
        assert_eq!(wp.target, Vec2::new(0.25, -0.5));
        assert_eq!(wp.heading, None);

        let wp: Waypoint = "1, 2".parse().unwrap();
        assert_eq!(wp.target, Vec2::new(1.0, 2.0));
        assert_eq!(wp.heading, None);
    }

    #[test]
    fn test_parse_with_heading() {
        let wp: Waypoint = "  (0.1, 0.2, 1.5707963)  ".parse().unwrap();
        assert_eq!(wp.heading, Some(1.5707963));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!("".parse::<Waypoint>(), Err(WaypointParseError::Empty));
        assert_eq!("(1.0)".parse::<Waypoint>(), Err(WaypointParseError::FieldCount(1)));
        assert_eq!("(1, 2, 3, 4)".parse::<Waypoint>(), Err(WaypointParseError::FieldCount(4)));
        assert!(matches!("(x, 2)".parse::<Waypoint>(), Err(WaypointParseError::InvalidNumber(_))));
        assert!(matches!("(NaN, 2)".parse::<Waypoint>(), Err(WaypointParseError::NonFinite(_))));
        assert!(matches!("(1, 2, inf)".parse::<Waypoint>(), Err(WaypointParseError::NonFinite(_))));
    }

    #[test]
    fn test_display_matches_policy_format() {
        let wp = Waypoint::new(0.5, -0.25);
        assert_eq!(wp.to_string(), "(0.500000, -0.250000, None)");
        let parsed: Waypoint = wp.to_string().parse().unwrap();
        assert_eq!(parsed, wp);
    }

    #[test]
    fn test_parse_many_skips_blank_lines() {
        let text = "(0, 0, None)\n\n(0.8, 0.8, None)\n";
        let route = parse_waypoints(text).unwrap();
        assert_eq!(route.len(), 2);
        assert!(parse_waypoints("(0, 0)\nbad\n").is_err());
    }

    #[test]
    fn test_default_patrol_route() {
        let route = default_patrol_route();
        assert_eq!(route.len(), 26);
        assert_eq!(route[0], Waypoint::new(0.0, 0.0));
        assert_eq!(route[1], Waypoint::new(0.8, 0.8));
        assert_eq!(route[5], Waypoint::new(0.0, 0.0));
        assert_eq!(route[24], Waypoint::new(-0.8, 0.8));
        assert_eq!(route[25], Waypoint::new(0.0, 0.0));
        assert!(route.iter().all(|wp| wp.heading.is_none()));
    }
}
