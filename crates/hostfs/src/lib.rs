//! # hostfs
//!
//! Host filesystem utilities.
//!
//! ## Features
//!
//! - **Capacity query**: total, free and available bytes of the filesystem holding a path
//! - **Space reservation**: create a file and reserve its size, fully backed or sparse
//! - **Bind mounts**: bind one or many sources onto targets, and unmount them again
//!   with "not mounted" treated as success
//!
//! ## Usage
//!
//! ```no_run
//! use hostfs::{allocate, fs_stat, mount_bind_all, umount_all};
//!
//! # fn example() -> hostfs::HostFsResult<()> {
//! let stats = fs_stat("/var/lib")?;
//! println!("{} of {} bytes available", stats.available, stats.total);
//!
//! // Reserve 64 MiB of real blocks.
//! allocate("/var/lib/app/reserved", 64 << 20, 0o600, true)?;
//!
//! // Binds /srv/a onto /mnt/t/a and /srv/b onto /mnt/t/b.
//! mount_bind_all(&["/srv/a", "/srv/b"], "/mnt/t")?;
//! umount_all("/mnt/t")?;
//! # Ok(())
//! # }
//! ```
//!
//! Every call is synchronous and blocks on the underlying syscall. Nothing is
//! cached: mount state always comes from the kernel's mount table.

#![warn(missing_docs)]

pub mod mount;
pub mod prealloc;
pub mod stat;
mod sys;

pub use hostfs_common::{
    BindOptions, ErrorKind, HostFsConfig, HostFsError, HostFsResult, MountConfig, UnmountFailure,
    UnmountFlags,
};
pub use mount::{
    HostMounts, MountBackend, Mounter, mount_bind, mount_bind_all, umount_all, unmount,
};
pub use prealloc::{FileAllocation, allocate};
pub use stat::{CapacityStats, fs_stat};
