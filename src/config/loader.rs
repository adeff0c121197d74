//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::cli::Cli;
use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a TOML file without validating it.
pub fn read_config_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Build the process configuration: optional file, then environment and
/// flag overrides, then validation.
pub fn load(cli: &Cli) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => read_config_file(path)?,
        None => ProxyConfig::default(),
    };
    cli.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let file_name = format!("vhost-mirror-{}-{}", std::process::id(), name);
        let path = std::env::temp_dir().join(file_name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn load_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
        load(&Cli {
            config: Some(path.to_path_buf()),
            ..Cli::default()
        })
    }

    #[test]
    fn load_validates_file_contents() {
        let path = write_temp("missing-domain.toml", "[listener]\nport = 9000\n");
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("base domain is required"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_reports_parse_errors() {
        let path = write_temp("broken.toml", "[listener\n");
        assert!(matches!(load_file(&path), Err(ConfigError::Parse(_))));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = Path::new("/nonexistent/vhost-mirror.toml");
        assert!(matches!(load_file(path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn cli_alone_is_enough_without_file() {
        let cli = Cli {
            base_domain: Some("example.com".into()),
            ..Cli::default()
        };
        let config = load(&cli).unwrap();
        assert_eq!(config.routing.base_domain, "example.com");
        assert_eq!(config.listener.port, 8080);
    }

    #[test]
    fn cli_overrides_file_values() {
        let path = write_temp(
            "override.toml",
            "[routing]\nbase_domain = \"from-file.test\"\ndefault_dest_port = 8000\n",
        );
        let cli = Cli {
            config: Some(path.clone()),
            base_domain: Some("from-env.test".into()),
            ..Cli::default()
        };

        let config = load(&cli).unwrap();
        assert_eq!(config.routing.base_domain, "from-env.test");
        assert_eq!(config.routing.default_dest_port, 8000);
        let _ = fs::remove_file(path);
    }
}
