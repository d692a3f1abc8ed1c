//! # hostfs-common
//!
//! Shared types for the hostfs crates.
//!
//! This crate provides:
//! - The error type and its [`ErrorKind`] tag
//! - Bind and unmount options
//! - Loadable configuration with environment overrides

#![warn(missing_docs)]

pub mod config;
pub mod error;

pub use config::{BindOptions, HostFsConfig, MountConfig, UnmountFlags};
pub use error::{ErrorKind, HostFsError, HostFsResult, UnmountFailure};
