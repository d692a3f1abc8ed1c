//! Mount options and loadable configuration.
//!
//! Configuration is read from an optional TOML file named by `HOSTFS_CONFIG`
//! and then adjusted by `HOSTFS_*` environment overrides.

use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{HostFsError, HostFsResult};

/// Environment variable naming a TOML configuration file.
pub const CONFIG_ENV: &str = "HOSTFS_CONFIG";

static GLOBAL: Lazy<Result<HostFsConfig, String>> = Lazy::new(|| {
    HostFsConfig::from_env().map_err(|err| match err {
        HostFsError::Config { message } => message,
        other => other.to_string(),
    })
});

/// Options applied when creating a bind mount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindOptions {
    /// Remount the binding read-only.
    pub readonly: bool,
    /// Also bind submounts of the source.
    pub recursive: bool,
    /// Make the new mount private (no propagation).
    pub private: bool,
}

/// Flags passed to the OS unmount primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnmountFlags {
    /// Force unmount.
    pub force: bool,
    /// Lazy unmount (detach).
    pub detach: bool,
}

/// Mount behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MountConfig {
    /// Options for every bind mount.
    pub bind: BindOptions,
    /// Flags for every unmount.
    pub unmount: UnmountFlags,
    /// Check every target child of a batch mount before binding any source.
    pub preflight: bool,
}

/// Top-level hostfs configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostFsConfig {
    /// Mount behaviour.
    pub mount: MountConfig,
}

impl HostFsConfig {
    /// Process-wide configuration, loaded from the environment on first use.
    ///
    /// # Errors
    ///
    /// Returns [`HostFsError::Config`] on every call if the configuration
    /// file or an override was invalid when first loaded.
    pub fn global() -> HostFsResult<&'static Self> {
        (*GLOBAL).as_ref().map_err(|message| HostFsError::Config {
            message: message.clone(),
        })
    }

    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`HostFsError::Config`] if the document is malformed.
    pub fn from_toml_str(content: &str) -> HostFsResult<Self> {
        toml::from_str(content).map_err(|e| HostFsError::Config {
            message: format!("Failed to parse configuration: {e}"),
        })
    }

    /// Load a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> HostFsResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| HostFsError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;

        tracing::debug!(path = %path.display(), "Loaded hostfs configuration");
        Self::from_toml_str(&content)
    }

    /// Build the configuration from `HOSTFS_CONFIG` and `HOSTFS_*` overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file or an override is invalid.
    pub fn from_env() -> HostFsResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from variables looked up through `lookup`,
    /// including the file named by [`CONFIG_ENV`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file or an override is invalid.
    pub fn from_lookup<F>(lookup: F) -> HostFsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_ENV) {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Apply `HOSTFS_*` overrides looked up through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`HostFsError::Config`] for a value that is not a boolean.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> HostFsResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mount = &mut self.mount;
        let overrides: [(&str, &mut bool); 5] = [
            ("HOSTFS_MOUNT_PREFLIGHT", &mut mount.preflight),
            ("HOSTFS_BIND_READONLY", &mut mount.bind.readonly),
            ("HOSTFS_BIND_RECURSIVE", &mut mount.bind.recursive),
            ("HOSTFS_UNMOUNT_DETACH", &mut mount.unmount.detach),
            ("HOSTFS_UNMOUNT_FORCE", &mut mount.unmount.force),
        ];

        for (name, slot) in overrides {
            if let Some(value) = lookup(name) {
                *slot = parse_bool(name, &value)?;
            }
        }
        Ok(())
    }
}

fn parse_bool(name: &str, value: &str) -> HostFsResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(HostFsError::Config {
            message: format!("{name}: expected a boolean, got '{other}'"),
        }),
    }
}
