use crate::transform::CaseStyle;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub style: CaseStyle,
    pub separator: Option<String>,
    pub include_hidden: bool,
    pub filters: Vec<String>,
    pub picker: PickerConfig,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            style: CaseStyle::default(),
            separator: None,
            include_hidden: false,
            filters: Vec::new(),
            picker: PickerConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Loads `explicit` when given, otherwise the first existing default
    /// location. A default file is written when nothing exists yet.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let fallback = Self::default();
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var_os("RECASE_CONFIG").map(PathBuf::from));
        if let Some(path) = explicit {
            if path.exists() {
                return load_from_path(&path);
            }
            let _ = write_default_config(&path, &fallback);
            return Ok(fallback);
        }

        let paths = default_paths();
        for path in &paths {
            if path.exists() {
                return load_from_path(path);
            }
        }
        if let Some(path) = paths.first() {
            let _ = write_default_config(path, &fallback);
        }

        Ok(fallback)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PickerConfig {
    pub title: String,
    pub highlight: String,
    pub show_preview: bool,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            title: "recase: pick files to rename".to_string(),
            highlight: "yellow".to_string(),
            show_preview: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    Missing(PathBuf),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        Err(err) => return Err(ConfigError::Io(err)),
    };
    parse(path, &content)
}

fn parse(path: &Path, content: &str) -> Result<Config, ConfigError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Ok(toml::from_str(content)?),
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(content)?),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn write_default_config(path: &Path, config: &Config) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::to_string(config)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err.to_string()))?,
        _ => toml::to_string_pretty(config)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err.to_string()))?,
    };
    fs::write(path, content)
}

fn default_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(dir) = dirs::config_dir() {
        let base = dir.join("recase");
        paths.push(base.join("config.toml"));
        paths.push(base.join("config.yaml"));
        paths.push(base.join("config.yml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".recase.toml"));
        paths.push(home.join(".recase.yaml"));
        paths.push(home.join(".recase.yml"));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = parse(
            Path::new("config.toml"),
            "style = \"kebab\"\n[picker]\nhighlight = \"#ff8800\"\n",
        )
        .unwrap();
        assert_eq!(config.style, CaseStyle::Kebab);
        assert_eq!(config.picker.highlight, "#ff8800");
        assert!(config.picker.show_preview);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn yaml_is_accepted() {
        let config = parse(
            Path::new("config.yml"),
            "style: screaming\nfilters: [IMG, DSC]\ninclude_hidden: true\n",
        )
        .unwrap();
        assert_eq!(config.style, CaseStyle::Screaming);
        assert_eq!(config.filters, vec!["IMG", "DSC"]);
        assert!(config.include_hidden);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = parse(Path::new("config.ini"), "").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_explicit_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.style, CaseStyle::Snake);
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("style = \"snake\""));
        let reloaded = Config::load(Some(&path)).unwrap();
        assert_eq!(reloaded.picker.title, config.picker.title);
    }
}
