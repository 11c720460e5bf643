//! Ambient configuration: where the signer keypair, the evidence log, and
//! issued certificates live, with environment-variable overrides layered
//! over platform data-directory defaults.

use crate::crypto::KeyPaths;
use config::{Config, Environment};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    keypair_dir: Option<String>,
    log_file: Option<String>,
    output_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub log_path: PathBuf,
    pub output_dir: PathBuf,
}

impl AppConfig {
    /// Resolve `VERIWIPE_*` environment overrides first, falling back to
    /// platform data directories (`directories::ProjectDirs`).
    pub fn load() -> anyhow::Result<Self> {
        let project_dirs = ProjectDirs::from("org", "veriwipe", "veriwipe")
            .ok_or_else(|| anyhow::anyhow!("could not determine a home directory"))?;
        let data_dir = project_dirs.data_dir().to_path_buf();

        let raw: RawConfig = Config::builder()
            .add_source(Environment::with_prefix("VERIWIPE"))
            .build()?
            .try_deserialize()
            .unwrap_or(RawConfig {
                keypair_dir: None,
                log_file: None,
                output_dir: None,
            });

        let keypair_dir = raw.keypair_dir.map(PathBuf::from).unwrap_or_else(|| data_dir.clone());

        Ok(Self {
            private_key_path: keypair_dir.join("signer.key"),
            public_key_path: keypair_dir.join("signer.pub"),
            log_path: raw
                .log_file
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("evidence_log.json")),
            output_dir: raw
                .output_dir
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("certificates")),
        })
    }

    pub fn key_paths(&self) -> KeyPaths {
        KeyPaths::new(self.private_key_path.clone(), self.public_key_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn env_overrides_take_precedence() {
        std::env::set_var("VERIWIPE_LOG_FILE", "/tmp/veriwipe-test-log.json");
        let config = AppConfig::load().unwrap();
        assert_eq!(
            config.log_path,
            PathBuf::from("/tmp/veriwipe-test-log.json")
        );
        std::env::remove_var("VERIWIPE_LOG_FILE");
    }
}
