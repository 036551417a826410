use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_SERVICE_TYPE: &str = "_example._tcp.local.";
pub const DEFAULT_INSTANCE: &str = "MyServer";
pub const DEFAULT_PORT: u16 = 12345;
pub const DEFAULT_FIND_TIMEOUT_SECS: u64 = 10;

/// Session configuration: environment variables with built-in defaults,
/// overridable by CLI flags after loading.
#[derive(Debug, Clone)]
pub struct Config {
    pub service_type: String,
    pub instance: String,
    pub port: u16,
    pub dest_dir: PathBuf,
    pub find_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let service_type = std::env::var("LANBEAM_SERVICE_TYPE")
            .unwrap_or_else(|_| DEFAULT_SERVICE_TYPE.into());
        let instance =
            std::env::var("LANBEAM_INSTANCE").unwrap_or_else(|_| DEFAULT_INSTANCE.into());
        let port: u16 = match std::env::var("LANBEAM_PORT") {
            Ok(v) => v.parse().context("LANBEAM_PORT is not a valid port")?,
            Err(_) => DEFAULT_PORT,
        };
        let dest_dir: PathBuf = std::env::var("LANBEAM_DEST_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_dest_dir());
        let timeout_secs: u64 = match std::env::var("LANBEAM_FIND_TIMEOUT_SECS") {
            Ok(v) => v
                .parse()
                .context("LANBEAM_FIND_TIMEOUT_SECS is not a number")?,
            Err(_) => DEFAULT_FIND_TIMEOUT_SECS,
        };

        Ok(Self {
            service_type,
            instance,
            port,
            dest_dir,
            find_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Where received files land when nothing else is configured: the user's
/// Downloads directory, falling back to the working directory.
fn default_dest_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|home| PathBuf::from(home).join("Downloads"))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test drives all env cases sequentially; parallel tests mutating the
    // same process environment would race.
    #[test]
    fn env_overrides_and_defaults() {
        for var in [
            "LANBEAM_SERVICE_TYPE",
            "LANBEAM_INSTANCE",
            "LANBEAM_PORT",
            "LANBEAM_DEST_DIR",
            "LANBEAM_FIND_TIMEOUT_SECS",
        ] {
            std::env::remove_var(var);
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.service_type, "_example._tcp.local.");
        assert_eq!(config.instance, "MyServer");
        assert_eq!(config.port, 12345);
        assert_eq!(config.find_timeout, Duration::from_secs(10));

        std::env::set_var("LANBEAM_SERVICE_TYPE", "_other._tcp.local.");
        std::env::set_var("LANBEAM_PORT", "4242");
        std::env::set_var("LANBEAM_DEST_DIR", "/tmp/inbox");
        std::env::set_var("LANBEAM_FIND_TIMEOUT_SECS", "3");

        let config = Config::from_env().unwrap();
        assert_eq!(config.service_type, "_other._tcp.local.");
        assert_eq!(config.port, 4242);
        assert_eq!(config.dest_dir, PathBuf::from("/tmp/inbox"));
        assert_eq!(config.find_timeout, Duration::from_secs(3));

        std::env::set_var("LANBEAM_PORT", "not-a-port");
        assert!(Config::from_env().is_err());

        for var in [
            "LANBEAM_SERVICE_TYPE",
            "LANBEAM_PORT",
            "LANBEAM_DEST_DIR",
            "LANBEAM_FIND_TIMEOUT_SECS",
        ] {
            std::env::remove_var(var);
        }
    }
}
