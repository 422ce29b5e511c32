//! Campus real-time notifications
//!
//! Root crate tying the notification socket library to its configuration
//! and the `notify-listen` binary.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI, logging, runners)
//! - **notify_socket**: Notification socket client (re-exported from workspace)
//! - **notify_config**: YAML + environment configuration (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust,ignore
//! use campus_realtime::bin_common::ListenArgs;
//! use campus_realtime::notify_config::NotifyConfig;
//! ```

// Re-export workspace libraries for convenience
pub use notify_config;
pub use notify_socket;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod logging;
    pub mod runner;

    pub use cli::{ListenArgs, CONFIG_PATH_VAR, DEFAULT_CONFIG_PATH};
    pub use logging::init_tracing_with_level;
    pub use runner::{client_from_config, BinaryRunner, RunConfig};
}
