//! Single and batch unmounts.

use std::path::{Path, PathBuf};

use hostfs_common::{HostFsError, HostFsResult, UnmountFailure};
use walkdir::WalkDir;

use super::{MountBackend, Mounter};
use crate::sys;

impl<B: MountBackend> Mounter<B> {
    /// Detach the mount at `target`.
    ///
    /// A target that is not a mount point is left alone and reported as
    /// success, so this can be retried safely.
    ///
    /// # Errors
    ///
    /// `Busy`, `PermissionDenied`, or `NotFound` if `target` does not exist.
    pub fn unmount(&self, target: impl AsRef<Path>) -> HostFsResult<()> {
        let target = target.as_ref();
        match self.backend.unmount(target, self.config.unmount) {
            Err(HostFsError::NotMounted { .. }) => {
                tracing::debug!(target = %target.display(), "Not mounted, nothing to do");
                Ok(())
            }
            result => result,
        }
    }

    /// Unmount every immediate subdirectory of `root`, in file-name order.
    ///
    /// Children that are not mounted are skipped. Any other failure is
    /// recorded and the remaining children are still attempted.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `root` does not exist
    /// - `InvalidArgument` if `root` is not a directory
    /// - `Aggregate` listing every child that could not be unmounted
    pub fn umount_all(&self, root: impl AsRef<Path>) -> HostFsResult<()> {
        let root = root.as_ref();
        let children = child_dirs(root)?;

        let mut skipped = 0usize;
        let mut failures = Vec::new();
        for child in &children {
            match self.backend.unmount(child, self.config.unmount) {
                Ok(()) => {}
                Err(HostFsError::NotMounted { .. }) => skipped += 1,
                Err(error) => {
                    tracing::warn!(target = %child.display(), %error, "Failed to unmount");
                    failures.push(UnmountFailure {
                        path: child.clone(),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            root = %root.display(),
            attempted = children.len(),
            skipped,
            failed = failures.len(),
            "Unmounted children"
        );

        if failures.is_empty() {
            Ok(())
        } else {
            Err(HostFsError::Aggregate {
                root: root.to_path_buf(),
                attempted: children.len(),
                failures,
            })
        }
    }
}

/// Immediate subdirectories of `root`, symlinks excluded.
fn child_dirs(root: &Path) -> HostFsResult<Vec<PathBuf>> {
    let is_dir = std::fs::metadata(root)
        .map_err(|e| sys::translate_io(e, "stat", root))?
        .is_dir();
    if !is_dir {
        return Err(HostFsError::invalid_argument(format!(
            "unmount root {} is not a directory",
            root.display()
        )));
    }

    let mut children = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            match err.into_io_error() {
                Some(io) => sys::translate_io(io, "read_dir", &path),
                None => HostFsError::Io {
                    operation: "read_dir".to_string(),
                    path,
                    source: std::io::Error::other("filesystem loop"),
                },
            }
        })?;

        if entry.file_type().is_dir() {
            children.push(entry.into_path());
        }
    }
    Ok(children)
}

#[cfg(test)]
mod tests {
    use hostfs_common::{ErrorKind, MountConfig, UnmountFlags};

    use super::*;
    use crate::mount::testing::{Call, FakeMounts, Layout};

    fn bound(names: &[&str]) -> (Layout, Mounter<FakeMounts>) {
        let layout = Layout::new(names, names);
        let mounter = Mounter::with_backend(FakeMounts::default(), MountConfig::default());
        mounter
            .mount_bind_all(&layout.sources(names), &layout.target)
            .unwrap();
        (layout, mounter)
    }

    fn unmounted(fake: &FakeMounts) -> Vec<PathBuf> {
        fake.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Unmount { target, .. } => Some(target),
                Call::Bind { .. } => None,
            })
            .collect()
    }

    #[test]
    fn unmount_is_idempotent() {
        let (layout, mounter) = bound(&["a"]);
        let target = layout.target.join("a");

        mounter.unmount(&target).unwrap();
        assert!(!mounter.backend().is_mounted(&target));
        mounter.unmount(&target).unwrap();
    }

    #[test]
    fn unmount_propagates_other_errors() {
        let (layout, mounter) = bound(&["a"]);
        let target = layout.target.join("a");
        mounter.backend().fail_on(target.clone(), ErrorKind::Busy);

        let err = mounter.unmount(&target).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Busy);
    }

    #[test]
    fn unmount_passes_configured_flags() {
        let config = MountConfig {
            unmount: UnmountFlags {
                force: false,
                detach: true,
            },
            ..MountConfig::default()
        };
        let mounter = Mounter::with_backend(FakeMounts::default(), config);
        mounter.unmount("/mnt/none").unwrap();

        assert_eq!(
            mounter.backend().calls(),
            vec![Call::Unmount {
                target: PathBuf::from("/mnt/none"),
                flags: UnmountFlags {
                    force: false,
                    detach: true,
                },
            }]
        );
    }

    #[test_log::test]
    fn umount_all_tolerates_already_unmounted() {
        let names = ["somedir", "anotherdir", "dir3", "dirfour"];
        let (layout, mounter) = bound(&names);

        mounter.unmount(layout.target.join("dirfour")).unwrap();
        mounter.umount_all(&layout.target).unwrap();

        for name in names {
            assert!(!mounter.backend().is_mounted(&layout.target.join(name)));
        }
    }

    #[test]
    fn umount_all_visits_children_in_name_order() {
        let (layout, mounter) = bound(&["c", "a", "b"]);
        mounter.umount_all(&layout.target).unwrap();

        let expected: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|n| layout.target.join(n))
            .collect();
        assert_eq!(unmounted(mounter.backend()), expected);
    }

    #[test_log::test]
    fn umount_all_continues_and_aggregates() {
        let (layout, mounter) = bound(&["a", "b", "c", "d"]);
        let fake = mounter.backend();
        fake.fail_on(layout.target.join("b"), ErrorKind::Busy);
        fake.fail_on(layout.target.join("c"), ErrorKind::PermissionDenied);

        let err = mounter.umount_all(&layout.target).unwrap_err();

        assert!(!fake.is_mounted(&layout.target.join("a")));
        assert!(!fake.is_mounted(&layout.target.join("d")));
        match err {
            HostFsError::Aggregate {
                root,
                attempted,
                failures,
            } => {
                assert_eq!(root, layout.target);
                assert_eq!(attempted, 4);
                let failed: Vec<_> = failures
                    .iter()
                    .map(|f| (f.path.clone(), f.error.kind()))
                    .collect();
                assert_eq!(
                    failed,
                    vec![
                        (layout.target.join("b"), ErrorKind::Busy),
                        (layout.target.join("c"), ErrorKind::PermissionDenied),
                    ]
                );
            }
            other => panic!("expected aggregate, got {other:?}"),
        }
    }

    #[test]
    fn umount_all_skips_files_and_symlinks() {
        let (layout, mounter) = bound(&["a"]);
        std::fs::write(layout.target.join("notes.txt"), b"x").unwrap();
        std::os::unix::fs::symlink(layout.target.join("a"), layout.target.join("link")).unwrap();

        mounter.umount_all(&layout.target).unwrap();
        assert_eq!(unmounted(mounter.backend()), vec![layout.target.join("a")]);
    }

    #[test]
    fn umount_all_on_empty_and_missing_roots() {
        let dir = tempfile::tempdir().unwrap();
        let mounter = Mounter::with_backend(FakeMounts::default(), MountConfig::default());

        mounter.umount_all(dir.path()).unwrap();
        assert!(mounter.backend().calls().is_empty());

        let err = mounter.umount_all(dir.path().join("gone")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn umount_all_rejects_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        let mounter = Mounter::with_backend(FakeMounts::default(), MountConfig::default());

        let err = mounter.umount_all(&file).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(mounter.backend().calls().is_empty());
    }
}
