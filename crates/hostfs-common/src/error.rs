//! Error types for hostfs.
//!
//! Native OS error codes never leave the crate that issues the syscall: they
//! are translated into one of the [`ErrorKind`]s below at that boundary, so
//! callers reason only about kinds.

use std::fmt;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`HostFsError`].
pub type HostFsResult<T> = Result<T, HostFsError>;

/// Errors surfaced by hostfs operations.
#[derive(Error, Diagnostic, Debug)]
pub enum HostFsError {
    /// A required path does not exist.
    #[error("Path not found: {}", .path.display())]
    #[diagnostic(code(hostfs::not_found))]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The caller lacks the privilege for the operation.
    #[error("Permission denied: {operation} on {}", .path.display())]
    #[diagnostic(
        code(hostfs::permission_denied),
        help("Mounting and unmounting require CAP_SYS_ADMIN; try running with elevated privileges (sudo)")
    )]
    PermissionDenied {
        /// The operation that was denied.
        operation: String,
        /// The path the operation was applied to.
        path: PathBuf,
    },

    /// Malformed input such as an out-of-range size or mismatched path types.
    #[error("Invalid argument: {message}")]
    #[diagnostic(code(hostfs::invalid_argument))]
    InvalidArgument {
        /// What was wrong with the input.
        message: String,
    },

    /// The filesystem cannot back the requested allocation.
    #[error("Insufficient space to reserve {requested} bytes for {}", .path.display())]
    #[diagnostic(code(hostfs::alloc::insufficient_space))]
    InsufficientSpace {
        /// The file being reserved.
        path: PathBuf,
        /// Requested size in bytes.
        requested: u64,
    },

    /// The target is in use and cannot be detached or modified.
    #[error("Resource busy: {}", .path.display())]
    #[diagnostic(
        code(hostfs::busy),
        help("Close open files under the mount point or unmount with the detach flag")
    )]
    Busy {
        /// The busy path.
        path: PathBuf,
    },

    /// The OS or filesystem does not support the requested semantics.
    #[error("Feature not supported: {feature}")]
    #[diagnostic(code(hostfs::unsupported))]
    Unsupported {
        /// The unsupported feature.
        feature: String,
    },

    /// The target is not a mount point.
    ///
    /// Unmount operations treat this as success and never return it.
    #[error("Not mounted: {}", .path.display())]
    #[diagnostic(code(hostfs::mount::not_mounted))]
    NotMounted {
        /// The path that is not a mount point.
        path: PathBuf,
    },

    /// Combined result of a best-effort batch unmount.
    #[error(
        "Failed to unmount {} of {attempted} mounts under {}: {}",
        .failures.len(),
        .root.display(),
        join_failures(.failures)
    )]
    #[diagnostic(code(hostfs::mount::aggregate))]
    Aggregate {
        /// The batch root whose children were unmounted.
        root: PathBuf,
        /// Number of children an unmount was attempted on.
        attempted: usize,
        /// Every failure that was not suppressed.
        #[related]
        failures: Vec<UnmountFailure>,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(hostfs::config))]
    Config {
        /// The error message.
        message: String,
    },

    /// An OS error with no dedicated kind.
    #[error("{operation} failed for {}: {source}", .path.display())]
    #[diagnostic(code(hostfs::io))]
    Io {
        /// The operation that failed.
        operation: String,
        /// The path the operation was applied to.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// One child of a batch unmount that could not be detached.
#[derive(Error, Diagnostic, Debug)]
#[error("{}: {error}", .path.display())]
#[diagnostic(code(hostfs::mount::unmount_failed))]
pub struct UnmountFailure {
    /// The child mount point.
    pub path: PathBuf,
    /// Why it failed.
    pub error: HostFsError,
}

fn join_failures(failures: &[UnmountFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Tag identifying the kind of a [`HostFsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`HostFsError::NotFound`].
    NotFound,
    /// See [`HostFsError::PermissionDenied`].
    PermissionDenied,
    /// See [`HostFsError::InvalidArgument`].
    InvalidArgument,
    /// See [`HostFsError::InsufficientSpace`].
    InsufficientSpace,
    /// See [`HostFsError::Busy`].
    Busy,
    /// See [`HostFsError::Unsupported`].
    Unsupported,
    /// See [`HostFsError::NotMounted`].
    NotMounted,
    /// See [`HostFsError::Aggregate`].
    Aggregate,
    /// See [`HostFsError::Config`].
    Config,
    /// See [`HostFsError::Io`].
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFound => "not found",
            Self::PermissionDenied => "permission denied",
            Self::InvalidArgument => "invalid argument",
            Self::InsufficientSpace => "insufficient space",
            Self::Busy => "busy",
            Self::Unsupported => "unsupported",
            Self::NotMounted => "not mounted",
            Self::Aggregate => "aggregate",
            Self::Config => "config",
            Self::Io => "io",
        };
        f.write_str(name)
    }
}

impl HostFsError {
    /// The kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::InsufficientSpace { .. } => ErrorKind::InsufficientSpace,
            Self::Busy { .. } => ErrorKind::Busy,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::NotMounted { .. } => ErrorKind::NotMounted,
            Self::Aggregate { .. } => ErrorKind::Aggregate,
            Self::Config { .. } => ErrorKind::Config,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Shorthand for [`HostFsError::NotFound`].
    pub fn not_found(path: impl AsRef<Path>) -> Self {
        Self::NotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Shorthand for [`HostFsError::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Shorthand for [`HostFsError::Unsupported`].
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }
}
