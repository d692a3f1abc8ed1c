//! Bind mounts and unmounts.
//!
//! This module handles:
//! - Binding a single source onto a target
//! - Binding many sources under one target root, stopping at the first failure
//! - Unmounting a single target, where "not mounted" counts as success
//! - Unmounting every child of a target root, best effort
//!
//! No record of active bindings is kept; the kernel mount table is the only
//! source of truth. Nothing here serializes concurrent callers working on
//! overlapping paths.

mod backend;
mod bind;
mod unmount;

#[cfg(test)]
mod testing;

use std::path::Path;

use hostfs_common::{HostFsConfig, HostFsResult, MountConfig};

pub use backend::{HostMounts, MountBackend};
pub use bind::target_children;

/// Runs bind and unmount operations through a [`MountBackend`].
#[derive(Debug, Clone)]
pub struct Mounter<B = HostMounts> {
    backend: B,
    config: MountConfig,
}

impl Mounter<HostMounts> {
    /// Host mounter using the process-wide configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HostFsError::Config`](hostfs_common::HostFsError::Config) if
    /// the environment configuration is invalid.
    pub fn new() -> HostFsResult<Self> {
        Ok(Self::with_config(HostFsConfig::global()?.mount.clone()))
    }

    /// Host mounter with an explicit configuration.
    #[must_use]
    pub const fn with_config(config: MountConfig) -> Self {
        Self {
            backend: HostMounts,
            config,
        }
    }
}

impl<B: MountBackend> Mounter<B> {
    /// Mounter over a custom backend.
    pub const fn with_backend(backend: B, config: MountConfig) -> Self {
        Self { backend, config }
    }

    /// The active configuration.
    pub const fn config(&self) -> &MountConfig {
        &self.config
    }

    /// The backend issuing the OS calls.
    pub const fn backend(&self) -> &B {
        &self.backend
    }
}

/// Bind `source` onto `target` on the host.
///
/// The free functions use [`HostFsConfig::global`] and fail with a `Config`
/// error while that configuration is invalid.
///
/// # Errors
///
/// See [`Mounter::mount_bind`].
pub fn mount_bind(source: impl AsRef<Path>, target: impl AsRef<Path>) -> HostFsResult<()> {
    Mounter::new()?.mount_bind(source, target)
}

/// Bind every source onto `target/<basename of source>` on the host.
///
/// # Errors
///
/// See [`Mounter::mount_bind_all`].
pub fn mount_bind_all<P: AsRef<Path>>(sources: &[P], target: impl AsRef<Path>) -> HostFsResult<()> {
    Mounter::new()?.mount_bind_all(sources, target)
}

/// Unmount `target` on the host; a target that is not mounted is left alone.
///
/// # Errors
///
/// See [`Mounter::unmount`].
pub fn unmount(target: impl AsRef<Path>) -> HostFsResult<()> {
    Mounter::new()?.unmount(target)
}

/// Unmount every immediate subdirectory of `root` on the host.
///
/// # Errors
///
/// See [`Mounter::umount_all`].
pub fn umount_all(root: impl AsRef<Path>) -> HostFsResult<()> {
    Mounter::new()?.umount_all(root)
}
