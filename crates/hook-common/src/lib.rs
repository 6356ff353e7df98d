//! Common utilities for the mgrep session hooks.
//!
//! This crate provides shared functionality for the hook binaries:
//! - Configuration from environment overrides
//! - JSON input/output parsing
//! - Per-session pid and log files
//! - Detached subprocess launch and termination
//! - Debug logging

pub mod config;
pub mod debug;
pub mod input;
pub mod output;
pub mod state;
pub mod subprocess;

pub use config::HookConfig;
pub use debug::DebugLog;
pub use input::HookInput;
pub use output::HookOutput;
pub use state::StateManager;
pub use subprocess::{
    LaunchError, Platform, SpawnPlan, SpawnedProcess, open_command_log, resolve_executable,
    spawn_detached, terminate_detached,
};

#[cfg(windows)]
pub use subprocess::run_command;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::HookConfig;
    pub use crate::debug::DebugLog;
    pub use crate::input::HookInput;
    pub use crate::output::HookOutput;
    pub use crate::state::StateManager;
    pub use crate::subprocess::{
        LaunchError, Platform, SpawnPlan, SpawnedProcess, open_command_log, resolve_executable,
        spawn_detached, terminate_detached,
    };
    pub use anyhow::{Context, Result};
}
