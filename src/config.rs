//! Runtime settings
//!
//! Parses the optional `cniwright.toml` file using serde

use crate::error::{Error, Result};
use crate::sys;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default settings file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "cniwright.toml";

/// Load settings from a file
pub fn load(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let settings: Settings = toml::from_str(&content)?;
    settings.validate()?;

    Ok(settings)
}

/// Load settings, falling back to defaults when `path` is the default file and absent
pub fn load_or_default(path: &Path) -> Result<Settings> {
    if path == Path::new(DEFAULT_CONFIG_FILE) && !path.exists() {
        return Ok(Settings::default());
    }
    load(path)
}

/// Settings describing the host the engine runs on
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// The engine does not own the default network namespace
    pub rootless: bool,

    /// Override for the CNI runtime directory
    pub cni_runtime_dir: Option<PathBuf>,

    /// Override for the namespace holding the engine's bridges
    pub detached_netns: Option<PathBuf>,
}

impl Settings {
    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.detached_netns.is_some() && !self.rootless {
            return Err(Error::ConfigValidation(
                "detached_netns requires rootless = true".into(),
            ));
        }
        Ok(())
    }

    /// Directory holding CNI runtime sockets
    pub fn cni_runtime_dir(&self) -> Result<PathBuf> {
        match &self.cni_runtime_dir {
            Some(dir) => Ok(dir.clone()),
            None => sys::cni_runtime_dir(self.rootless),
        }
    }

    /// Namespace to enter before touching host interfaces
    pub fn detached_netns(&self) -> Result<Option<PathBuf>> {
        match &self.detached_netns {
            Some(path) => Ok(Some(path.clone())),
            None => sys::detached_netns(self.rootless),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let settings: Settings = toml::from_str(
            r#"
rootless = true
cni_runtime_dir = "/tmp/cni"
detached_netns = "/run/user/1000/containerd-rootless/netns"
"#,
        )
        .unwrap();

        assert!(settings.validate().is_ok());
        assert_eq!(settings.cni_runtime_dir().unwrap(), PathBuf::from("/tmp/cni"));
        assert_eq!(
            settings.detached_netns().unwrap(),
            Some(PathBuf::from("/run/user/1000/containerd-rootless/netns"))
        );
    }

    #[test]
    fn test_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.cni_runtime_dir().unwrap(), PathBuf::from("/run/cni"));
        assert_eq!(settings.detached_netns().unwrap(), None);
    }

    #[test]
    fn test_netns_requires_rootless() {
        let settings: Settings = toml::from_str(r#"detached_netns = "/proc/1/ns/net""#).unwrap();
        assert!(matches!(settings.validate(), Err(Error::ConfigValidation(_))));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<Settings>("rootles = true").is_err());
    }

    #[test]
    fn test_missing_default_file() {
        let settings = load_or_default(Path::new(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(settings, Settings::default());

        let missing = std::env::temp_dir().join("cniwright-config-missing.toml");
        assert!(matches!(load_or_default(&missing), Err(Error::ConfigRead { .. })));
    }
}
