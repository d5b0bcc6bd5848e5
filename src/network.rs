//! Host network state
//!
//! Provides:
//! - Scoped execution inside a detached network namespace
//! - Removal of host links over rtnetlink

pub mod link;
pub mod netns;

pub use link::remove_interface;
pub use netns::with_netns;
