//! Configuration loading for stashd.
//!
//! Configuration is read once at startup from a TOML file, with environment
//! variable overrides (`STASHD_` prefix, `__` as the section separator, e.g.
//! `STASHD_OSS__BUCKET`). A missing or invalid configuration file aborts
//! startup; the daemon never runs with defaulted credentials.

use anyhow::{Context, Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use std::path::Path;

/// One named directory configured for periodic backup.
///
/// An empty `path` is valid and causes the target to be skipped (not treated
/// as a failure).
#[derive(Debug, Clone, Deserialize)]
pub struct BackupTarget {
    pub name: String,
    #[serde(default)]
    pub path: String,
}

/// Which object-store driver uploads the archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    Oss,
}

impl Default for StorageDriver {
    fn default() -> Self {
        StorageDriver::Oss
    }
}

/// Aliyun OSS connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OssConfig {
    pub endpoint: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    pub bucket: String,
    /// Remote key prefix for uploaded archives.
    pub remote_dir: String,
}

/// DingTalk robot webhook settings. Notifications are sent only when `enable`
/// is set; `secret` switches the webhook to signed requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DingTalkConfig {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage_driver: StorageDriver,
    pub oss: OssConfig,
    #[serde(default)]
    pub backups: Vec<BackupTarget>,
    /// Backup period in whole days, string-encoded as in the config file.
    pub backup_period_days: String,
    #[serde(default)]
    pub dingtalk: DingTalkConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config: AppConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("STASHD_").split("__"))
            .extract()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;

        // Fail fast on a period that would never produce a usable trigger.
        config.period_days()?;

        Ok(config)
    }

    /// The configured backup period parsed to a positive day count.
    pub fn period_days(&self) -> Result<u32> {
        let days: u32 = self
            .backup_period_days
            .trim()
            .parse()
            .with_context(|| format!("invalid backup_period_days '{}'", self.backup_period_days))?;
        if days == 0 {
            bail!("backup_period_days must be at least 1");
        }
        Ok(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        backup_period_days = "7"

        [oss]
        endpoint = "oss-cn-hangzhou.aliyuncs.com"
        access_key_id = "id"
        access_key_secret = "secret"
        bucket = "logs"
        remote_dir = "backups"

        [[backups]]
        name = "app"
        path = "/var/log/app"

        [[backups]]
        name = "spare"
    "#;

    #[test]
    fn loads_full_config() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", CONFIG)?;
            let config = AppConfig::load(Path::new("config.toml")).unwrap();

            assert_eq!(config.storage_driver, StorageDriver::Oss);
            assert_eq!(config.oss.bucket, "logs");
            assert_eq!(config.backups.len(), 2);
            assert_eq!(config.backups[0].path, "/var/log/app");
            // Missing path deserializes to empty, which means "skip".
            assert_eq!(config.backups[1].path, "");
            assert_eq!(config.period_days().unwrap(), 7);
            assert!(!config.dingtalk.enable);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", CONFIG)?;
            jail.set_env("STASHD_OSS__BUCKET", "other-bucket");
            jail.set_env("STASHD_BACKUP_PERIOD_DAYS", "3");

            let config = AppConfig::load(Path::new("config.toml")).unwrap();
            assert_eq!(config.oss.bucket, "other-bucket");
            assert_eq!(config.period_days().unwrap(), 3);
            Ok(())
        });
    }

    #[test]
    fn missing_file_is_an_error() {
        figment::Jail::expect_with(|_jail| {
            assert!(AppConfig::load(Path::new("nope.toml")).is_err());
            Ok(())
        });
    }

    #[test]
    fn rejects_unparsable_period() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                &CONFIG.replace(r#"backup_period_days = "7""#, r#"backup_period_days = "weekly""#),
            )?;
            assert!(AppConfig::load(Path::new("config.toml")).is_err());
            Ok(())
        });
    }

    #[test]
    fn rejects_zero_period() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                &CONFIG.replace(r#"backup_period_days = "7""#, r#"backup_period_days = "0""#),
            )?;
            assert!(AppConfig::load(Path::new("config.toml")).is_err());
            Ok(())
        });
    }
}
