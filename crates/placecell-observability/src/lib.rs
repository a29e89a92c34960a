// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # placecell-observability
//!
//! Logging setup shared by the place cell tools, with per-crate debug flag
//! support.
//!
//! ## Features
//! - `file-logging`: JSON log files in a timestamped run folder

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Workspace crate names accepted by the debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "placecell",
    "placecell-generator",
    "placecell-runtime",
    "placecell-config",
    "placecell-observability",
];
