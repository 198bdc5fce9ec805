//! Integration test suite for the statement registry
//!
//! These tests drive the public API and the `stmtreg` binary against real
//! mapper directories created in temporary folders.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **resolver**: Cached and kind-specific resolution against files on disk
//! - **watch**: Watcher lifecycle, driven by real filesystem events
//! - **cli**: The `stmtreg` binary end to end

mod cli;
mod resolver;
mod watch;
