//! Launch configuration.
//!
//! Assembled once at startup from the command line and a handful of
//! environment variables:
//!
//! - `FROMSCRATCH_ENV=development`: keep data in the `dev` subdirectory
//! - `FROMSCRATCH_UPDATE_URL`: base URL of the update host
//! - `FROMSCRATCH_DEBUG_LOG`: force debug logging (see [`crate::logging`])

use std::path::Path;

use crate::cli::LaunchArgs;
use crate::error::Result;
use crate::storage::DataLocation;

pub const APP_NAME: &str = "FromScratch";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_UPDATE_BASE_URL: &str = "https://fromscratch.rocks";

pub const ENV_MODE: &str = "FROMSCRATCH_ENV";
pub const ENV_UPDATE_URL: &str = "FROMSCRATCH_UPDATE_URL";

#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub location: DataLocation,
    pub development: bool,
    pub update_base_url: String,
    pub app_version: String,
    /// macOS gets vibrancy instead of a solid background.
    pub macos: bool,
}

impl LaunchConfig {
    /// Builds the configuration from parsed args and the process environment.
    pub fn from_env(args: &LaunchArgs) -> Result<Self> {
        let development = is_development(std::env::var(ENV_MODE).ok().as_deref());
        let location = DataLocation::from_environment(&args.portable_mode(), development)?;
        Ok(Self::new(
            location,
            development,
            std::env::var(ENV_UPDATE_URL).ok(),
        ))
    }

    pub fn new(location: DataLocation, development: bool, update_url: Option<String>) -> Self {
        let update_base_url = update_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_UPDATE_BASE_URL.to_string());
        Self {
            location,
            development,
            update_base_url,
            app_version: APP_VERSION.to_string(),
            macos: cfg!(target_os = "macos"),
        }
    }

    /// Test configuration rooted at `root`.
    pub fn with_root(root: &Path) -> Self {
        Self::new(DataLocation::with_root(root.to_path_buf()), false, None)
    }

    /// Full URL of the version descriptor, carrying the running version.
    pub fn update_url(&self) -> String {
        format!(
            "{}/latest.json?current={}",
            self.update_base_url,
            urlencoding::encode(&self.app_version)
        )
    }
}

fn is_development(mode: Option<&str>) -> bool {
    matches!(mode, Some(value) if value.eq_ignore_ascii_case("development"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_update_url_carries_current_version() {
        let mut config = LaunchConfig::with_root(Path::new("/tmp/fs"));
        config.app_version = "1.2.3".to_string();
        assert_eq!(
            config.update_url(),
            "https://fromscratch.rocks/latest.json?current=1.2.3"
        );
    }

    #[test]
    fn update_url_override_is_normalized() {
        let mut config = LaunchConfig::new(
            DataLocation::with_root("/tmp/fs".into()),
            false,
            Some(" http://localhost:8080/ ".to_string()),
        );
        config.app_version = "2.0.0-beta 1".to_string();
        assert_eq!(
            config.update_url(),
            "http://localhost:8080/latest.json?current=2.0.0-beta%201"
        );
    }

    #[test]
    fn blank_override_falls_back_to_default() {
        let config = LaunchConfig::new(
            DataLocation::with_root("/tmp/fs".into()),
            false,
            Some("   ".to_string()),
        );
        assert_eq!(config.update_base_url, DEFAULT_UPDATE_BASE_URL);
    }

    #[test]
    fn development_mode_detection() {
        assert!(is_development(Some("development")));
        assert!(is_development(Some("Development")));
        assert!(!is_development(Some("production")));
        assert!(!is_development(None));
    }
}
