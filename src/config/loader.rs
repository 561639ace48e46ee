use crate::config::schema::FetchConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use validator::Validate;

/// Values given on the command line; `None` leaves the config untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input: Option<String>,
    pub host: Option<String>,
    pub workers: Option<usize>,
    pub output: Option<String>,
    pub timeout_secs: Option<u64>,
    pub rate_limit: Option<u32>,
    pub name_format: Option<String>,
    pub test_limit: Option<usize>,
    pub max_retries: Option<u32>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads and validates a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<FetchConfig> {
        let config = Self::load_file(path.as_ref())?;
        Self::validate(config)
    }

    /// Builds the effective config: defaults, then the optional file, then overrides.
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<FetchConfig> {
        let base = match path {
            Some(path) => Self::load_file(path)?,
            None => FetchConfig::default(),
        };
        Self::validate(Self::merge(base, overrides))
    }

    fn validate(config: FetchConfig) -> Result<FetchConfig> {
        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<FetchConfig> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let config: FetchConfig = serde_json::from_str(&content)?;
                Ok(config)
            }
            Some("yaml") | Some("yml") => {
                let config: FetchConfig = serde_yaml::from_str(&content)?;
                Ok(config)
            }
            Some("toml") => {
                let config: FetchConfig = toml::from_str(&content)?;
                Ok(config)
            }
            _ => Err(Error::Config(format!(
                "Unsupported file extension: {}",
                path.display()
            ))),
        }
    }

    fn merge(mut config: FetchConfig, overrides: ConfigOverrides) -> FetchConfig {
        if let Some(input) = overrides.input {
            config.input = input;
        }
        if let Some(host) = overrides.host {
            config.host = host;
        }
        if let Some(workers) = overrides.workers {
            config.workers = workers;
        }
        if let Some(output) = overrides.output {
            config.output = output;
        }
        if let Some(timeout) = overrides.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(rate) = overrides.rate_limit {
            config.rate_limit = rate;
        }
        if let Some(format) = overrides.name_format {
            config.name_format = format;
        }
        if let Some(limit) = overrides.test_limit {
            config.test_limit = limit;
        }
        if let Some(retries) = overrides.max_retries {
            config.retry.max_retries = retries;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NameField;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_json_yaml_and_toml() {
        let dir = tempfile::tempdir().unwrap();

        let json = write(&dir, "fetch.json", r#"{"host": "https://archives.example.edu", "workers": 8}"#);
        let config = ConfigLoader::load(&json).unwrap();
        assert_eq!(config.host, "https://archives.example.edu");
        assert_eq!(config.workers, 8);
        assert_eq!(config.rate_limit, 4);

        let yaml = write(&dir, "fetch.yaml", "rate_limit: 10\nname_format: Title,CollectionIdentifier\nretry:\n  max_retries: 2\n");
        let config = ConfigLoader::load(&yaml).unwrap();
        assert_eq!(config.rate_limit, 10);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.initial_backoff_ms, 1_000);
        assert_eq!(
            config.name_format().unwrap().fields(),
            &[NameField::Title, NameField::Identifier]
        );

        let toml = write(&dir, "fetch.toml", "output = \"/tmp/ead\"\ntimeout_secs = 5\n");
        let config = ConfigLoader::load(&toml).unwrap();
        assert_eq!(config.output, "/tmp/ead");
        assert_eq!(config.timeout().as_secs(), 5);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "fetch.ini", "workers=2");
        assert!(matches!(ConfigLoader::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        for content in [
            r#"{"workers": 0}"#,
            r#"{"rate_limit": 0}"#,
            r#"{"timeout_secs": 0}"#,
            r#"{"host": "archives.example.edu"}"#,
            r#"{"name_format": "Title,Creator"}"#,
        ] {
            let path = write(&dir, "bad.json", content);
            assert!(
                matches!(ConfigLoader::load(&path), Err(Error::Validation(_))),
                "{} should fail validation",
                content
            );
        }
    }

    #[test]
    fn overrides_take_precedence_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "fetch.json", r#"{"workers": 8, "rate_limit": 2}"#);

        let overrides = ConfigOverrides {
            workers: Some(3),
            test_limit: Some(10),
            max_retries: Some(0),
            ..Default::default()
        };
        let config = ConfigLoader::resolve(Some(&path), overrides).unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.rate_limit, 2);
        assert_eq!(config.test_limit(), Some(10));
        assert_eq!(config.retry.max_retries, 0);
    }

    #[test]
    fn defaults_apply_without_file() {
        let config = ConfigLoader::resolve(None, ConfigOverrides::default()).unwrap();
        assert_eq!(config.input, "collections-table.csv");
        assert_eq!(config.host, "http://127.0.0.1");
        assert_eq!(config.workers, 2);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.test_limit(), None);
        assert!(config.name_format().unwrap().is_empty());
    }

    #[test]
    fn overrides_are_validated() {
        let overrides = ConfigOverrides {
            workers: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            ConfigLoader::resolve(None, overrides),
            Err(Error::Validation(_))
        ));
    }
}
