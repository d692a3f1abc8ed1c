//! Recording mount backend and scratch layouts for unit tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use hostfs_common::{BindOptions, ErrorKind, HostFsError, HostFsResult, UnmountFlags};
use parking_lot::Mutex;
use tempfile::TempDir;

use super::MountBackend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Bind {
        source: PathBuf,
        target: PathBuf,
        readonly: bool,
    },
    Unmount {
        target: PathBuf,
        flags: UnmountFlags,
    },
}

/// In-memory mount table; later binds of a target stack on earlier ones.
#[derive(Debug, Default)]
pub(crate) struct FakeMounts {
    table: Mutex<Vec<(PathBuf, PathBuf)>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<PathBuf, ErrorKind>>,
}

impl FakeMounts {
    /// Make every call on `target` fail with `kind`.
    pub(crate) fn fail_on(&self, target: PathBuf, kind: ErrorKind) {
        self.failures.lock().insert(target, kind);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub(crate) fn depth(&self, target: &Path) -> usize {
        self.table.lock().iter().filter(|(_, t)| t == target).count()
    }

    pub(crate) fn is_mounted(&self, target: &Path) -> bool {
        self.depth(target) > 0
    }

    fn injected(&self, target: &Path) -> HostFsResult<()> {
        let Some(kind) = self.failures.lock().get(target).copied() else {
            return Ok(());
        };
        let path = target.to_path_buf();
        Err(match kind {
            ErrorKind::Busy => HostFsError::Busy { path },
            ErrorKind::PermissionDenied => HostFsError::PermissionDenied {
                operation: "unmount".to_string(),
                path,
            },
            ErrorKind::NotFound => HostFsError::NotFound { path },
            ErrorKind::NotMounted => HostFsError::NotMounted { path },
            other => HostFsError::invalid_argument(format!("injected {other}")),
        })
    }
}

impl MountBackend for FakeMounts {
    fn bind(&self, source: &Path, target: &Path, options: &BindOptions) -> HostFsResult<()> {
        self.calls.lock().push(Call::Bind {
            source: source.to_path_buf(),
            target: target.to_path_buf(),
            readonly: options.readonly,
        });
        self.injected(target)?;
        self.table
            .lock()
            .push((source.to_path_buf(), target.to_path_buf()));
        Ok(())
    }

    fn unmount(&self, target: &Path, flags: UnmountFlags) -> HostFsResult<()> {
        self.calls.lock().push(Call::Unmount {
            target: target.to_path_buf(),
            flags,
        });
        self.injected(target)?;

        let mut table = self.table.lock();
        match table.iter().rposition(|(_, t)| t == target) {
            Some(idx) => {
                table.remove(idx);
                Ok(())
            }
            None => Err(HostFsError::NotMounted {
                path: target.to_path_buf(),
            }),
        }
    }
}

/// Source directories under one scratch root and target children under another.
pub(crate) struct Layout {
    sources: TempDir,
    _targets: TempDir,
    pub(crate) target: PathBuf,
}

impl Layout {
    pub(crate) fn new(sources: &[&str], children: &[&str]) -> Self {
        let source_root = tempfile::tempdir().unwrap();
        let target_root = tempfile::tempdir().unwrap();

        for name in sources {
            std::fs::create_dir(source_root.path().join(name)).unwrap();
        }
        for name in children {
            std::fs::create_dir(target_root.path().join(name)).unwrap();
        }

        Self {
            target: target_root.path().to_path_buf(),
            sources: source_root,
            _targets: target_root,
        }
    }

    pub(crate) fn source(&self, name: &str) -> PathBuf {
        self.sources.path().join(name)
    }

    pub(crate) fn sources(&self, names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|name| self.source(name)).collect()
    }
}
