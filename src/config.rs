//! User settings.
//!
//! Settings live in `config.json` under the platform config directory (see [`default_path`]).
//! Every field is optional; missing fields fall back to [`Config::default`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Learn OpenGL".to_owned(),
            width: 800,
            height: 600,
            fullscreen: false,
        }
    }
}

/// Paths to the two stages of one shader program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl ShaderPaths {
    fn in_dir(name: &str) -> Self {
        let dir = Path::new("shaders").join(name);
        Self {
            vertex: dir.join("vert.glsl"),
            fragment: dir.join("frag.glsl"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub triangles: ShaderPaths,
    pub textured: ShaderPaths,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            triangles: ShaderPaths::in_dir("triangles"),
            textured: ShaderPaths::in_dir("textured"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    pub first: PathBuf,
    pub second: PathBuf,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            first: PathBuf::from("assets/textures/container.png"),
            second: PathBuf::from("assets/textures/face.png"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub shaders: ShaderConfig,
    pub textures: TextureConfig,
    /// Movement speed in normalized device units per second.
    pub move_speed: f32,
    /// Change of the texture mix factor per second.
    pub mix_speed: f32,
    pub clear_color: [f32; 4],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            shaders: ShaderConfig::default(),
            textures: TextureConfig::default(),
            move_speed: 0.5,
            mix_speed: 0.5,
            clear_color: [0.2, 0.3, 0.3, 1.0],
        }
    }
}

/// Location of the config file when none is given on the command line.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("learngl").join("config.json"))
}

impl Config {
    /// Loads the config.
    ///
    /// An explicit `path` must exist. Without one, the default location is tried and a missing
    /// file there yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    log::debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        for (name, speed) in [("move_speed", self.move_speed), ("mix_speed", self.mix_speed)] {
            if !speed.is_finite() || speed < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {speed}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let (_dir, path) = write_config(r#"{ "window": { "width": 1024 }, "move_speed": 1.5 }"#);
        let config = Config::load(Some(path.as_path())).unwrap();

        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.move_speed, 1.5);
        assert_eq!(config.shaders, ShaderConfig::default());
        assert_eq!(config.clear_color, [0.2, 0.3, 0.3, 1.0]);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(dir.path().join("nope.json").as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let (_dir, path) = write_config("{ window: ");
        let err = Config::load(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn zero_sized_window_is_rejected() {
        let (_dir, path) = write_config(r#"{ "window": { "height": 0 } }"#);
        let err = Config::load(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn negative_speed_is_rejected() {
        let config = Config {
            mix_speed: -1.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn shader_paths_follow_directory_layout() {
        let shaders = ShaderConfig::default();
        assert_eq!(
            shaders.triangles.vertex,
            Path::new("shaders/triangles/vert.glsl")
        );
        assert_eq!(
            shaders.textured.fragment,
            Path::new("shaders/textured/frag.glsl")
        );
    }
}
