//! Single and batch bind mounts.

use std::path::{Path, PathBuf};

use hostfs_common::{HostFsError, HostFsResult};

use super::{MountBackend, Mounter};
use crate::sys;

impl<B: MountBackend> Mounter<B> {
    /// Bind `source` onto `target`, so `target` shows the tree of `source`.
    ///
    /// Binding an already bound target stacks another mount on top of it.
    ///
    /// # Errors
    ///
    /// - `NotFound` if either path is missing
    /// - `InvalidArgument` if one path is a directory and the other is not
    /// - `PermissionDenied` without `CAP_SYS_ADMIN`
    /// - `Busy` if the kernel reports the target in use
    pub fn mount_bind(&self, source: impl AsRef<Path>, target: impl AsRef<Path>) -> HostFsResult<()> {
        let (source, target) = (source.as_ref(), target.as_ref());
        check_pair(source, target)?;
        self.backend.bind(source, target, &self.config.bind)
    }

    /// Bind each source onto `target/<basename of source>`, in order.
    ///
    /// The target children must already exist. The first failure stops the
    /// batch and is returned as is; sources bound before it stay bound, so
    /// callers needing all-or-nothing must unmount them (e.g. with
    /// [`Mounter::umount_all`]). With `preflight` configured every child is
    /// checked before anything is bound.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty source list or a source with no base name
    /// - Any error of [`Mounter::mount_bind`] for the first source that fails
    pub fn mount_bind_all<P: AsRef<Path>>(
        &self,
        sources: &[P],
        target: impl AsRef<Path>,
    ) -> HostFsResult<()> {
        let target = target.as_ref();
        let pairs = target_children(sources, target)?;

        if self.config.preflight {
            for (source, child) in &pairs {
                check_pair(source, child)?;
            }
        }

        for (bound, (source, child)) in pairs.iter().enumerate() {
            self.mount_bind(source, child).inspect_err(|err| {
                tracing::warn!(
                    source = %source.display(),
                    target = %child.display(),
                    bound,
                    %err,
                    "Batch bind stopped, earlier bindings left in place"
                );
            })?;
        }

        tracing::info!(
            count = pairs.len(),
            target = %target.display(),
            "Bound all sources"
        );
        Ok(())
    }
}

/// Pair every source with its child under `target`, named after the source.
///
/// # Errors
///
/// Returns `InvalidArgument` if `sources` is empty or a source has no base
/// name (such as `/` or a path ending in `..`).
pub fn target_children<P: AsRef<Path>>(
    sources: &[P],
    target: &Path,
) -> HostFsResult<Vec<(PathBuf, PathBuf)>> {
    if sources.is_empty() {
        return Err(HostFsError::invalid_argument(
            "at least one source is required",
        ));
    }

    sources
        .iter()
        .map(|source| {
            let source = source.as_ref();
            let name = source.file_name().ok_or_else(|| {
                HostFsError::invalid_argument(format!(
                    "source {} has no base name",
                    source.display()
                ))
            })?;
            Ok((source.to_path_buf(), target.join(name)))
        })
        .collect()
}

/// Both paths exist and are of the same type.
fn check_pair(source: &Path, target: &Path) -> HostFsResult<()> {
    let source_dir = std::fs::metadata(source)
        .map_err(|e| sys::translate_io(e, "stat", source))?
        .is_dir();
    let target_dir = std::fs::metadata(target)
        .map_err(|e| sys::translate_io(e, "stat", target))?
        .is_dir();

    if source_dir != target_dir {
        let kind = |dir: bool| if dir { "directory" } else { "non-directory" };
        return Err(HostFsError::invalid_argument(format!(
            "cannot bind {} {} onto {} {}",
            kind(source_dir),
            source.display(),
            kind(target_dir),
            target.display()
        )));
    }
    Ok(())
}
