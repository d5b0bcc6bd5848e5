//! Scoped execution inside another network namespace
//!
//! `setns(2)` changes the namespace of the calling OS thread only. Work is
//! therefore run on a dedicated scoped thread that enters the target
//! namespace, and a guard switches that thread back when it is dropped,
//! including during unwinding. The caller's thread never changes namespace.

use crate::error::{Error, Result};
use nix::sched::{setns, CloneFlags};
use std::fs::File;
use std::path::Path;
use std::thread;

/// Namespace of the current thread
const THREAD_NETNS: &str = "/proc/thread-self/ns/net";

/// Restores the original network namespace of the current thread on drop
struct NetnsGuard {
    origin: File,
}

impl NetnsGuard {
    fn enter(target: &Path) -> Result<Self> {
        let origin = File::open(THREAD_NETNS)
            .map_err(|e| Error::Namespace(format!("failed to open {}: {}", THREAD_NETNS, e)))?;
        let target_fd = File::open(target).map_err(|e| {
            Error::Namespace(format!("failed to open {}: {}", target.display(), e))
        })?;

        setns(&target_fd, CloneFlags::CLONE_NEWNET).map_err(|e| {
            Error::Namespace(format!("setns into {} failed: {}", target.display(), e))
        })?;
        tracing::debug!(netns = %target.display(), "entered network namespace");

        Ok(Self { origin })
    }
}

impl Drop for NetnsGuard {
    fn drop(&mut self) {
        if let Err(e) = setns(&self.origin, CloneFlags::CLONE_NEWNET) {
            tracing::error!(error = %e, "failed to restore original network namespace");
        }
    }
}

/// Run `work` inside the namespace at `target`, or directly when `target` is `None`
///
/// Panics inside `work` are propagated to the caller after the namespace
/// has been restored.
pub fn with_netns<F, T>(target: Option<&Path>, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send,
    T: Send,
{
    let Some(target) = target else {
        return work();
    };

    thread::scope(|scope| {
        let handle = scope.spawn(move || {
            let _guard = NetnsGuard::enter(target)?;
            work()
        });
        match handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    })
}
