use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub tables: TableConfig,
    pub links: LinksConfig,
    pub page: PageConfig,
    pub font: FontConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Keep a single template row once when no suffixed variables expand it.
    /// When false such a table renders with no body rows.
    pub keep_unexpanded_row: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            keep_unexpanded_row: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    pub color: String,
    pub underline: bool,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            color: "#1a4f8b".to_string(),
            underline: true,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct PageConfig {
    pub numbers: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Set body text in `family` instead of Typst's serif default
    pub sans: bool,
    pub family: String,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            sans: false,
            family: "DejaVu Sans".to_string(),
        }
    }
}

impl Config {
    /// Load config from a TOML file, or return defaults if not found.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("ignoring invalid config {}: {}", path.display(), e);
                Self::compiled_default()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::compiled_default(),
            Err(e) => {
                tracing::warn!("cannot read config {}: {}", path.display(), e);
                Self::compiled_default()
            }
        }
    }

    /// The bundled `default_config.toml`, checked by the build script.
    pub fn compiled_default() -> Self {
        toml::from_str(DEFAULT_CONFIG).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiled_default_matches_default() {
        let config = Config::compiled_default();
        assert!(config.tables.keep_unexpanded_row);
        assert_eq!(config.links.color, "#1a4f8b");
        assert!(config.links.underline);
        assert!(!config.page.numbers);
        assert!(!config.font.sans);
        assert_eq!(config.font.family, "DejaVu Sans");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: Config = toml::from_str("[tables]\nkeep_unexpanded_row = false\n").unwrap();
        assert!(!config.tables.keep_unexpanded_row);
        assert!(config.links.underline);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = Config::load(Path::new("does/not/exist.toml"));
        assert!(config.tables.keep_unexpanded_row);
    }

    #[test]
    fn unreadable_path_uses_defaults() {
        // a directory exists but cannot be read as a file
        let config = Config::load(&std::env::temp_dir());
        assert!(config.tables.keep_unexpanded_row);
        assert!(!config.font.sans);
    }

    #[test]
    fn font_section() {
        let config: Config = toml::from_str("[font]\nsans = true\n").unwrap();
        assert!(config.font.sans);
        assert_eq!(config.font.family, "DejaVu Sans");
    }
}
