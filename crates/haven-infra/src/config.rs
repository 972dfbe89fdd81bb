//! Configuration loader for Haven.
//!
//! Reads `config.toml` from the data directory (`~/.haven/` in production)
//! and deserializes it into [`HavenConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::Path;

use haven_types::config::HavenConfig;
use secrecy::SecretString;

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`HavenConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
pub async fn load_config(data_dir: &Path) -> HavenConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return HavenConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return HavenConfig::default();
        }
    };

    match toml::from_str::<HavenConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            HavenConfig::default()
        }
    }
}

/// Read the assistant API key from the environment variable named in config.
///
/// Empty values count as unset.
pub fn read_api_key(env_var: &str) -> Option<SecretString> {
    std::env::var(env_var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use haven_types::config::AssistantProvider;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.assistant.provider, AssistantProvider::OpenaiCompatible);
        assert_eq!(config.server.port, 3000);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[assistant]
provider = "canned"

[server]
port = 8080
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.assistant.provider, AssistantProvider::Canned);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.realtime.feed_capacity, 1024);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn read_api_key_missing_var() {
        assert!(read_api_key("HAVEN_TEST_SURELY_UNSET_KEY_VAR").is_none());
    }
}
