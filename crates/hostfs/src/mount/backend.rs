//! OS mount primitives.

use std::path::Path;

use hostfs_common::{BindOptions, HostFsResult, UnmountFlags};

/// The OS calls behind bind mounting and unmounting.
///
/// Implementations translate native error codes once, here: an unmount of a
/// path that is not a mount point must fail with
/// [`HostFsError::NotMounted`](hostfs_common::HostFsError::NotMounted).
pub trait MountBackend: Send + Sync {
    /// Bind `source` onto `target`.
    fn bind(&self, source: &Path, target: &Path, options: &BindOptions) -> HostFsResult<()>;

    /// Detach the mount at `target`.
    fn unmount(&self, target: &Path, flags: UnmountFlags) -> HostFsResult<()>;
}

impl<B: MountBackend + ?Sized> MountBackend for &B {
    fn bind(&self, source: &Path, target: &Path, options: &BindOptions) -> HostFsResult<()> {
        (**self).bind(source, target, options)
    }

    fn unmount(&self, target: &Path, flags: UnmountFlags) -> HostFsResult<()> {
        (**self).unmount(target, flags)
    }
}

/// Mounts on the host through `mount(2)` and `umount2(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostMounts;

#[cfg(target_os = "linux")]
impl MountBackend for HostMounts {
    fn bind(&self, source: &Path, target: &Path, options: &BindOptions) -> HostFsResult<()> {
        use rustix::mount::{mount_bind, mount_bind_recursive};

        use crate::sys;

        tracing::debug!(
            source = %source.display(),
            target = %target.display(),
            ?options,
            "Creating bind mount"
        );

        if options.recursive {
            mount_bind_recursive(source, target)
        } else {
            mount_bind(source, target)
        }
        .map_err(|e| sys::translate(e, "bind mount", target))?;

        let adjusted = apply_options(target, options);

        // Do not leave a binding behind with the wrong options.
        if let Err(err) = adjusted {
            if let Err(cleanup) = self.unmount(target, UnmountFlags {
                force: false,
                detach: true,
            }) {
                tracing::warn!(
                    target = %target.display(),
                    %cleanup,
                    "Failed to detach partially configured bind mount"
                );
            }
            return Err(err);
        }

        tracing::debug!(
            source = %source.display(),
            target = %target.display(),
            "Bind mount created successfully"
        );
        Ok(())
    }

    fn unmount(&self, target: &Path, flags: UnmountFlags) -> HostFsResult<()> {
        use hostfs_common::HostFsError;
        use rustix::io::Errno;
        use rustix::mount::{UnmountFlags as RustixUnmountFlags, unmount};

        use crate::sys;

        tracing::debug!(target = %target.display(), ?flags, "Unmounting filesystem");

        let mut rflags = RustixUnmountFlags::empty();
        if flags.force {
            rflags |= RustixUnmountFlags::FORCE;
        }
        if flags.detach {
            rflags |= RustixUnmountFlags::DETACH;
        }

        match unmount(target, rflags) {
            Ok(()) => Ok(()),
            // umount2 reports a path that is not a mount point as EINVAL.
            Err(Errno::INVAL) => Err(HostFsError::NotMounted {
                path: target.to_path_buf(),
            }),
            Err(e) => Err(sys::translate(e, "unmount", target)),
        }
    }
}

/// Propagation and read-only adjustments made after the bind itself.
#[cfg(target_os = "linux")]
fn apply_options(target: &Path, options: &BindOptions) -> HostFsResult<()> {
    use rustix::mount::{MountFlags, MountPropagationFlags, mount_change, mount_remount};

    use crate::sys;

    if options.private {
        mount_change(target, MountPropagationFlags::PRIVATE)
            .map_err(|e| sys::translate(e, "make private", target))?;
    }
    if options.readonly {
        mount_remount(target, MountFlags::BIND | MountFlags::RDONLY, c"")
            .map_err(|e| sys::translate(e, "remount read-only", target))?;
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
impl MountBackend for HostMounts {
    fn bind(&self, _source: &Path, _target: &Path, _options: &BindOptions) -> HostFsResult<()> {
        Err(hostfs_common::HostFsError::unsupported("bind mounts"))
    }

    fn unmount(&self, _target: &Path, _flags: UnmountFlags) -> HostFsResult<()> {
        Err(hostfs_common::HostFsError::unsupported("unmount"))
    }
}
