//! Default task configuration from TOML.

use heapless::String;
use serde::Deserialize;

/// Defaults applied to tasks built from configuration.
///
/// Each field maps one-to-one onto a [`TaskConfig`](crate::task::TaskConfig)
/// builder call; see [`TaskConfig::from_defaults`](crate::task::TaskConfig::from_defaults).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskDefaults {
    /// Thread name (max 16 chars).
    #[serde(default = "default_name")]
    pub name: String<16>,

    /// Fixed priority; omitted means derived from the period.
    #[serde(default)]
    pub priority: Option<u8>,

    /// Core the task is pinned to; omitted means any core.
    #[serde(default)]
    pub core: Option<u8>,

    /// Stack size in bytes; omitted means the platform default.
    #[serde(default)]
    pub stack_size: Option<usize>,

    /// Drop the owner without joining the thread.
    #[serde(default)]
    pub detached: bool,
}

fn default_name() -> String<16> {
    crate::error::message("task")
}

impl Default for TaskDefaults {
    fn default() -> Self {
        Self {
            name: default_name(),
            priority: None,
            core: None,
            stack_size: None,
            detached: false,
        }
    }
}
