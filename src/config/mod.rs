use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_TEMPLATE: &str = "{date}_{id}_{channel}_{trim_start}_{trim_end}_{random_string}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub template: String,
    pub output_dir: PathBuf,
    pub unique: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            output_dir: PathBuf::from("."),
            unique: false,
        }
    }
}

impl Config {
    /// Reads a TOML config file, or returns the defaults when `path` is `None`.
    /// Keys missing from the file keep their default values.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults_without_file() {
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "template = \"{{channel}}/{{title}}\"").unwrap();
        writeln!(file, "unique = true").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.template, "{channel}/{title}");
        assert!(config.unique);
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "template = ").unwrap();

        assert!(Config::load(Some(file.path())).is_err());
    }
}
