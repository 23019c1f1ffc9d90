//! Scene Description Output
//!
//! Writes the initial ball layout as a simulator scene file: a group node
//! with one `PingBall { ... }` or `SteelBall { ... }` instance per object.
//! An existing file is moved aside to `<name>.bak_<YYYYmmdd-HHMMSS>` first.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Local};
use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::interchange::InterchangeError;
use crate::sim::placement::{Bounds, PlacementConfig, PlacementEngine, PlacementReport};
use crate::sim::state::ObjectClass;

/// Timestamp format of backup suffixes.
pub const BACKUP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Scene generator settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// File to write
    pub output: PathBuf,
    /// Name of the generated group node
    pub node_name: String,
    /// Ping balls, placed first
    pub ping_count: usize,
    /// Steel balls, placed after the ping balls
    pub steel_count: usize,
    /// Ping ball radius (m)
    pub ping_radius: f64,
    /// Steel ball radius (m)
    pub steel_radius: f64,
    /// Side of the square arena (m)
    pub arena_size: f64,
    /// Distance kept from the walls (m)
    pub wall_margin: f64,
    /// Extra clearance between balls (m)
    pub separation_margin: f64,
    /// Samples per placement tier
    pub max_attempts: u32,
    /// Spawn height (m)
    pub height: f64,
    /// Emit a random orientation per ball
    pub include_rotation: bool,
    /// Layout seed; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("UnibotsBallsRandom.proto"),
            node_name: "UnibotsBallsRandom".to_string(),
            ping_count: 16,
            steel_count: 24,
            ping_radius: 0.02,
            steel_radius: 0.01,
            arena_size: 2.0,
            wall_margin: 0.1,
            separation_margin: 0.0,
            max_attempts: 5000,
            height: 0.15,
            include_rotation: true,
            seed: None,
        }
    }
}

impl SceneConfig {
    /// Placement parameters for this scene.
    pub fn placement(&self) -> PlacementConfig {
        PlacementConfig {
            bounds: Bounds::square(self.arena_size / 2.0 - self.wall_margin),
            object_radius: self.ping_radius,
            separation_margin: self.separation_margin,
            max_tries: self.max_attempts,
            enforce_separation: true,
            exclusion_zones: Vec::new(),
            seed: self.seed,
            ..PlacementConfig::default()
        }
    }
}

/// One ball in the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    /// Ball class
    pub class: ObjectClass,
    /// Position on the floor plane
    pub position: Vec2,
    /// Spawn height
    pub z: f64,
    /// Axis-angle orientation
    pub rotation: Option<[f64; 4]>,
}

/// Node type instantiated for `class`.
pub fn node_type(class: ObjectClass) -> &'static str {
    match class {
        ObjectClass::Ping => "PingBall",
        ObjectClass::Steel => "SteelBall",
    }
}

/// Place every ball: ping first, then steel, in one run.
pub fn generate_scene(config: &SceneConfig) -> (Vec<SceneObject>, PlacementReport) {
    let placement = config.placement();
    let mut engine = PlacementEngine::new(&placement, placement.seed);
    engine.place_many(config.ping_count, config.ping_radius);
    engine.place_many(config.steel_count, config.steel_radius);
    let report = engine.finish();

    let mut orientation = DeterministicRng::new(report.seed.rotate_left(32));
    let objects = report
        .placements
        .iter()
        .map(|p| SceneObject {
            class: if p.index < config.ping_count { ObjectClass::Ping } else { ObjectClass::Steel },
            position: p.position,
            z: config.height,
            rotation: config.include_rotation.then(|| orientation.random_axis_angle()),
        })
        .collect();

    (objects, report)
}

/// Scene file text.
pub fn render_scene(objects: &[SceneObject], node_name: &str) -> String {
    let mut out = String::new();
    out.push_str("#VRML_SIM R2025a utf8\n");
    for class in [ObjectClass::Ping, ObjectClass::Steel] {
        let _ = writeln!(out, "EXTERNPROTO \"{}.proto\"", node_type(class));
    }
    let _ = write!(out, "\nPROTO {} [] {{\n  Group {{\n    children [\n\n", node_name);

    for object in objects {
        let _ = write!(
            out,
            "\n      {} {{ translation {:.6} {:.6} {}",
            node_type(object.class),
            object.position.x,
            object.position.y,
            object.z,
        );
        if let Some([ax, ay, az, angle]) = object.rotation {
            let _ = write!(out, " rotation {:.6} {:.6} {:.6} {:.6}", ax, ay, az, angle);
        }
        out.push_str(" }");
    }

    out.push_str("\n\n    ]\n  }\n}\n");
    out
}

/// Backup path for `path` at `now`.
pub fn backup_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.bak_{}", name, now.format(BACKUP_FORMAT)))
}

/// Move an existing file aside. Returns the backup path if there was one.
pub fn backup_existing(path: &Path, now: DateTime<Local>) -> Result<Option<PathBuf>, InterchangeError> {
    if !path.is_file() {
        return Ok(None);
    }
    let backup = backup_path(path, now);
    fs::rename(path, &backup).map_err(|e| InterchangeError::io(path, e))?;
    Ok(Some(backup))
}

/// What [`write_scene`] did.
#[derive(Debug)]
pub struct SceneSummary {
    /// File written
    pub output: PathBuf,
    /// Where the previous file went
    pub backup: Option<PathBuf>,
    /// Objects written
    pub objects: Vec<SceneObject>,
    /// Placement details
    pub report: PlacementReport,
}

/// Generate, back up any previous file, and write the scene.
pub fn write_scene(config: &SceneConfig) -> Result<SceneSummary, InterchangeError> {
    let (objects, report) = generate_scene(config);
    for degraded in report.degraded() {
        warn!(index = degraded.index, tier = ?degraded.tier, "ball placed without full separation");
    }

    if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| InterchangeError::io(parent, e))?;
    }
    let backup = backup_existing(&config.output, Local::now())?;
    if let Some(backup) = &backup {
        info!(backup = %backup.display(), "backed up existing scene");
    }

    let text = render_scene(&objects, &config.node_name);
    fs::write(&config.output, text).map_err(|e| InterchangeError::io(&config.output, e))?;
    info!(
        output = %config.output.display(),
        ping = config.ping_count,
        steel = config.steel_count,
        seed = report.seed,
        "scene written"
    );

    Ok(SceneSummary {
        output: config.output.clone(),
        backup,
        objects,
        report,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::interchange::atomic::test_dir::TestDir;

    fn seeded() -> SceneConfig {
        SceneConfig {
            seed: Some(42),
            ..SceneConfig::default()
        }
    }

    #[test]
    fn test_generate_counts_and_order() {
        let config = seeded();
        let (objects, report) = generate_scene(&config);
        assert_eq!(objects.len(), 40);
        assert!(objects[..16].iter().all(|o| o.class == ObjectClass::Ping));
        assert!(objects[16..].iter().all(|o| o.class == ObjectClass::Steel));
        assert!(!report.is_degraded());

        let bounds = config.placement().bounds;
        assert!(objects.iter().all(|o| bounds.contains(o.position) && o.z == 0.15));
        for o in &objects {
            let [ax, ay, az, angle] = o.rotation.unwrap();
            assert!(((ax * ax + ay * ay + az * az).sqrt() - 1.0).abs() < 1e-9);
            assert!((0.0..std::f64::consts::TAU).contains(&angle));
        }
    }

    #[test]
    fn test_seeded_scene_is_reproducible() {
        let config = seeded();
        let (a, _) = generate_scene(&config);
        let (b, _) = generate_scene(&config);
        assert_eq!(render_scene(&a, "N"), render_scene(&b, "N"));
    }

    #[test]
    fn test_render_format() {
        let objects = vec![
            SceneObject { class: ObjectClass::Ping, position: Vec2::new(0.1, -0.2), z: 0.15, rotation: None },
            SceneObject {
                class: ObjectClass::Steel,
                position: Vec2::new(0.5, 0.25),
                z: 0.15,
                rotation: Some([0.0, 1.0, 0.0, 1.5]),
            },
        ];
        let text = render_scene(&objects, "UnibotsBallsRandom");
        let expected = "#VRML_SIM R2025a utf8\n\
EXTERNPROTO \"PingBall.proto\"\n\
EXTERNPROTO \"SteelBall.proto\"\n\
\n\
PROTO UnibotsBallsRandom [] {\n  Group {\n    children [\n\n\
\n      PingBall { translation 0.100000 -0.200000 0.15 }\
\n      SteelBall { translation 0.500000 0.250000 0.15 rotation 0.000000 1.000000 0.000000 1.500000 }\
\n\n    ]\n  }\n}\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_backup_path() {
        let now = Local.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            backup_path(Path::new("/tmp/x/Balls.proto"), now),
            PathBuf::from("/tmp/x/Balls.proto.bak_20250304-050607")
        );
    }

    #[test]
    fn test_write_backs_up_previous() {
        let dir = TestDir::new("scene");
        let config = SceneConfig {
            output: dir.join("Balls.proto"),
            ..seeded()
        };

        let first = write_scene(&config).unwrap();
        assert!(first.backup.is_none());
        let second = write_scene(&config).unwrap();
        let backup = second.backup.unwrap();
        assert!(backup.exists());
        assert!(config.output.exists());
        assert!(backup.file_name().unwrap().to_string_lossy().starts_with("Balls.proto.bak_"));
    }
}
