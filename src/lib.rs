//! cniwright - CNI network configuration for container engines
//!
//! Turns a "create network" request (driver, driver options, subnets,
//! gateway, ip-range, IPv6 flag) into a CNI configuration list with a
//! matching IPAM section, and reads persisted lists back to report their
//! subnets or remove the host bridge they created.

pub mod cni;
pub mod config;
pub mod error;
pub mod network;
pub mod sys;

pub use cni::{CniEnv, NetworkConfigList, NetworkRequest};
pub use error::{Error, Result};
