/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or
/// incomplete. The result is one immutable record passed by reference
/// to every component constructor — there is no global mutable state.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::entity::Motion;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub world: WorldConfig,
    pub speed: SpeedConfig,
    pub anim: AnimConfig,
    pub map: MapConfig,
}

#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Tile edge in pixels; the actor sprite box is the same size.
    pub tile_size: i32,
    pub screen_tiles_x: i32,
    pub screen_tiles_y: i32,
    /// Terrain code rendered with the animated water cycle.
    pub water_code: u16,
}

impl WorldConfig {
    pub fn screen_w(&self) -> i32 {
        self.tile_size * self.screen_tiles_x
    }

    pub fn screen_h(&self) -> i32 {
        self.tile_size * self.screen_tiles_y
    }
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    /// Pixels per tick.
    pub walk_speed: i32,
    pub run_speed: i32,
}

#[derive(Clone, Debug)]
pub struct AnimConfig {
    /// Ticks per actor frame, by motion (higher = slower).
    pub idle_period: u32,
    pub idle_frames: usize,
    pub walk_period: u32,
    pub walk_frames: usize,
    pub run_period: u32,
    pub run_frames: usize,
    /// Ambient water cycle: wall-clock milliseconds per frame.
    pub water_frame_ms: u64,
    pub water_frames: usize,
}

impl AnimConfig {
    pub fn period(&self, motion: Motion) -> u32 {
        match motion {
            Motion::Idle => self.idle_period,
            Motion::Walking => self.walk_period,
            Motion::Running => self.run_period,
        }
    }

    pub fn frames(&self, motion: Motion) -> usize {
        match motion {
            Motion::Idle => self.idle_frames,
            Motion::Walking => self.walk_frames,
            Motion::Running => self.run_frames,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MapConfig {
    pub terrain: PathBuf,
    pub fences: PathBuf,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    world: TomlWorld,
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    anim: TomlAnim,
    #[serde(default)]
    map: TomlMap,
}

#[derive(Deserialize, Debug)]
struct TomlWorld {
    #[serde(default = "default_tile_size")]
    tile_size: i32,
    #[serde(default = "default_screen_tiles_x")]
    screen_tiles_x: i32,
    #[serde(default = "default_screen_tiles_y")]
    screen_tiles_y: i32,
    #[serde(default = "default_water_code")]
    water_code: u16,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_walk_speed")]
    walk_speed: i32,
    #[serde(default = "default_run_speed")]
    run_speed: i32,
}

#[derive(Deserialize, Debug)]
struct TomlAnim {
    #[serde(default = "default_idle_period")]
    idle_period: u32,
    #[serde(default = "default_idle_frames")]
    idle_frames: usize,
    #[serde(default = "default_walk_period")]
    walk_period: u32,
    #[serde(default = "default_walk_frames")]
    walk_frames: usize,
    #[serde(default = "default_run_period")]
    run_period: u32,
    #[serde(default = "default_run_frames")]
    run_frames: usize,
    #[serde(default = "default_water_frame_ms")]
    water_frame_ms: u64,
    #[serde(default = "default_water_frames")]
    water_frames: usize,
}

#[derive(Deserialize, Debug)]
struct TomlMap {
    #[serde(default = "default_terrain_path")]
    terrain: String,
    #[serde(default = "default_fences_path")]
    fences: String,
}

// ── Defaults ──

fn default_tile_size() -> i32 { 48 }
fn default_screen_tiles_x() -> i32 { 16 }
fn default_screen_tiles_y() -> i32 { 12 }
fn default_water_code() -> u16 { 12 }

fn default_tick_rate() -> u64 { 16 }   // ~60 Hz simulation
fn default_walk_speed() -> i32 { 2 }
fn default_run_speed() -> i32 { 8 }

fn default_idle_period() -> u32 { 20 }
fn default_idle_frames() -> usize { 4 }
fn default_walk_period() -> u32 { 10 }
fn default_walk_frames() -> usize { 6 }
fn default_run_period() -> u32 { 8 }
fn default_run_frames() -> usize { 8 }
fn default_water_frame_ms() -> u64 { 800 }
fn default_water_frames() -> usize { 4 }

fn default_terrain_path() -> String { "maps/terrain.txt".into() }
fn default_fences_path() -> String { "maps/fences.txt".into() }

impl Default for TomlWorld {
    fn default() -> Self {
        TomlWorld {
            tile_size: default_tile_size(),
            screen_tiles_x: default_screen_tiles_x(),
            screen_tiles_y: default_screen_tiles_y(),
            water_code: default_water_code(),
        }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            walk_speed: default_walk_speed(),
            run_speed: default_run_speed(),
        }
    }
}

impl Default for TomlAnim {
    fn default() -> Self {
        TomlAnim {
            idle_period: default_idle_period(),
            idle_frames: default_idle_frames(),
            walk_period: default_walk_period(),
            walk_frames: default_walk_frames(),
            run_period: default_run_period(),
            run_frames: default_run_frames(),
            water_frame_ms: default_water_frame_ms(),
            water_frames: default_water_frames(),
        }
    }
}

impl Default for TomlMap {
    fn default() -> Self {
        TomlMap {
            terrain: default_terrain_path(),
            fences: default_fences_path(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        GameConfig {
            world: WorldConfig {
                tile_size: toml_cfg.world.tile_size.max(1),
                screen_tiles_x: toml_cfg.world.screen_tiles_x.max(1),
                screen_tiles_y: toml_cfg.world.screen_tiles_y.max(1),
                water_code: toml_cfg.world.water_code,
            },
            speed: SpeedConfig {
                tick_rate_ms: toml_cfg.speed.tick_rate_ms.max(1),
                walk_speed: toml_cfg.speed.walk_speed,
                run_speed: toml_cfg.speed.run_speed,
            },
            anim: AnimConfig {
                idle_period: toml_cfg.anim.idle_period.max(1),
                idle_frames: toml_cfg.anim.idle_frames.max(1),
                walk_period: toml_cfg.anim.walk_period.max(1),
                walk_frames: toml_cfg.anim.walk_frames.max(1),
                run_period: toml_cfg.anim.run_period.max(1),
                run_frames: toml_cfg.anim.run_frames.max(1),
                water_frame_ms: toml_cfg.anim.water_frame_ms.max(1),
                water_frames: toml_cfg.anim.water_frames.max(1),
            },
            map: MapConfig {
                terrain: resolve_path(&toml_cfg.map.terrain, &search_dirs),
                fences: resolve_path(&toml_cfg.map.fences, &search_dirs),
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable (resolve symlinks)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Resolve a map path: absolute paths pass through, relative ones are
/// searched in the candidate directories, falling back to CWD-relative.
fn resolve_path(raw: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return path;
    }
    search_dirs
        .iter()
        .map(|d| d.join(raw))
        .find(|p| p.is_file())
        .unwrap_or(path)
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

// ── Unit tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.world.tile_size, 48);
        assert_eq!(cfg.speed.walk_speed, 2);
        assert_eq!(cfg.anim.water_frame_ms, 800);
        assert_eq!(cfg.map.terrain, "maps/terrain.txt");
    }

    #[test]
    fn partial_section_keeps_remaining_defaults() {
        let cfg: TomlConfig = toml::from_str("[speed]\nrun_speed = 6\n").unwrap();
        assert_eq!(cfg.speed.run_speed, 6);
        assert_eq!(cfg.speed.walk_speed, 2);
        assert_eq!(cfg.world.screen_tiles_x, 16);
    }

    #[test]
    fn screen_size_follows_tile_counts() {
        let world = WorldConfig {
            tile_size: 48,
            screen_tiles_x: 16,
            screen_tiles_y: 12,
            water_code: 12,
        };
        assert_eq!(world.screen_w(), 768);
        assert_eq!(world.screen_h(), 576);
    }
}
