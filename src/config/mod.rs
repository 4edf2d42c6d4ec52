use crate::error::{Error, Result};
use crate::localizer::Offset;
use crate::projector::ProjectionOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_pretty() -> bool {
    true
}
fn default_verbose() -> bool {
    false
}

/// Settings read from `geoveil.toml`; CLI flags take precedence
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FileConfig {
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
    #[serde(default)]
    pub projection: ProjectionOptions,
    #[serde(default)]
    pub offset: Option<OffsetConfig>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            verbose: default_verbose(),
            pretty: default_pretty(),
            projection: ProjectionOptions::default(),
            offset: None,
        }
    }
}

/// Offset shared between `localize` and `restore` runs
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct OffsetConfig {
    pub lat: f64,
    pub lon: f64,
}

impl OffsetConfig {
    pub fn to_offset(self) -> Result<Offset> {
        Offset::new(self.lat, self.lon)
    }
}

impl FileConfig {
    /// First config found on the search path, skipping unreadable files
    pub fn load() -> Option<Self> {
        let (config, skipped) = Self::search();
        for (path, e) in skipped {
            log::warn!("failed to load config file {}: {}", path.display(), e);
        }
        config
    }

    /// Like [`FileConfig::load`], but hands the skipped files back to the
    /// caller instead of logging them
    pub fn search() -> (Option<Self>, Vec<(PathBuf, Error)>) {
        search_paths(&get_config_paths())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }
}

fn search_paths(paths: &[PathBuf]) -> (Option<FileConfig>, Vec<(PathBuf, Error)>) {
    let mut skipped = Vec::new();
    for path in paths.iter().filter(|path| path.exists()) {
        match FileConfig::from_path(path) {
            Ok(config) => {
                log::debug!("using config file {}", path.display());
                return (Some(config), skipped);
            }
            Err(e) => skipped.push((path.clone(), e)),
        }
    }
    (None, skipped)
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("geoveil.toml"));
    paths.push(PathBuf::from(".geoveil.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("geoveil").join("config.toml"));
        paths.push(config_dir.join("geoveil.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".geoveil.toml"));
        paths.push(home.join(".config").join("geoveil").join("config.toml"));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config, FileConfig::default());
        assert!(config.pretty);
        assert!(!config.verbose);
        assert!(config.offset.is_none());
        assert_eq!(config.projection, ProjectionOptions::default());
    }

    #[test]
    fn test_full_config() {
        let config: FileConfig = toml::from_str(
            r#"
            verbose = true
            pretty = false

            [projection]
            rotate_deg = 45.0
            scale_factor = 1.2
            recenter = false

            [offset]
            lat = 50.0
            lon = 20.0
            "#,
        )
        .unwrap();

        assert!(config.verbose);
        assert!(!config.pretty);
        assert_eq!(config.projection.rotate_deg, 45.0);
        assert_eq!(config.projection.scale_factor, 1.2);
        assert!(!config.projection.recenter);

        let offset = config.offset.unwrap().to_offset().unwrap();
        assert_eq!(offset.lat, 50.0);
        assert_eq!(offset.lon, 20.0);
    }

    #[test]
    fn test_partial_projection_table() {
        let config: FileConfig = toml::from_str("[projection]\nscale_factor = 0.5\n").unwrap();
        assert_eq!(config.projection.scale_factor, 0.5);
        assert_eq!(config.projection.rotate_deg, 0.0);
        assert!(config.projection.recenter);
    }

    #[test]
    fn test_out_of_range_offset() {
        let config: FileConfig = toml::from_str("[offset]\nlat = 95.0\nlon = 0.0\n").unwrap();
        assert!(config.offset.unwrap().to_offset().is_err());
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("geoveil.toml");
        std::fs::write(&good, "pretty = false\n").unwrap();
        assert!(!FileConfig::from_path(&good).unwrap().pretty);

        let bad = dir.path().join("broken.toml");
        std::fs::write(&bad, "pretty = \"maybe\"\n").unwrap();
        assert!(matches!(FileConfig::from_path(&bad), Err(Error::Config(_))));
        assert!(matches!(
            FileConfig::from_path(&dir.path().join("absent.toml")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_config_paths_start_in_working_dir() {
        let paths = get_config_paths();
        assert_eq!(paths[0], PathBuf::from("geoveil.toml"));
        assert_eq!(paths[1], PathBuf::from(".geoveil.toml"));
    }

    #[test]
    fn test_search_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("geoveil.toml");
        let good = dir.path().join("config.toml");
        std::fs::write(&broken, "verbose = [\n").unwrap();
        std::fs::write(&good, "pretty = false\n").unwrap();
        let paths = [dir.path().join("absent.toml"), broken.clone(), good];

        let (config, skipped) = search_paths(&paths);
        assert!(!config.unwrap().pretty);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].0, broken);
        assert!(matches!(skipped[0].1, Error::Config(_)));

        let (config, skipped) = search_paths(&paths[..1]);
        assert!(config.is_none());
        assert!(skipped.is_empty());
    }
}
