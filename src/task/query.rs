//! Queries about the calling task.

use std::cell::RefCell;
use std::thread;

use super::config::TaskInfo;

thread_local! {
    static CURRENT: RefCell<Option<TaskInfo>> = RefCell::new(None);
}

pub(crate) fn register(info: TaskInfo) {
    CURRENT.with(|current| *current.borrow_mut() = Some(info));
}

/// Resolved configuration of the calling task.
///
/// `None` when the caller was not started by a task in this crate.
pub fn current_task() -> Option<TaskInfo> {
    CURRENT.with(|current| current.borrow().clone())
}

/// Name of the calling thread of control.
///
/// Falls back to the OS thread name, then to `"unnamed"`.
pub fn current_name() -> String {
    current_task()
        .map(|info| info.name.as_str().to_owned())
        .or_else(|| thread::current().name().map(str::to_owned))
        .unwrap_or_else(|| "unnamed".to_owned())
}
