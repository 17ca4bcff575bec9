//! Building blocks shared by every operation.
//!
//! Each submodule does exactly one thing and knows nothing about the
//! specific tools; the facade in [`crate::ops`] composes them.
//!
//! ## Data Flow
//!
//! ```text
//! guard ──▶ dirs ──▶ command ──▶ exec ──▶ (operation-specific interpretation)
//! (skip?)   (mkdir)  (argv)      (deadline)
//! ```
//!
//! 1. [`guard`]   — skip when the destination exists and overwrite is off
//! 2. [`dirs`]    — create the output directory, reporting whether it existed
//! 3. [`command`] — template + per-call arguments → token-array invocation
//! 4. [`exec`]    — spawn, race exit against the deadline, kill the process
//!    group on overrun

pub mod command;
pub mod dirs;
pub mod exec;
pub mod guard;
