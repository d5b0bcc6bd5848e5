//! CNI configuration generation
//!
//! Provides:
//! - Option primitives and per-driver option schemas
//! - IPAM range construction and subnet selection
//! - Plugin chains for bridge, macvlan and ipvlan networks
//! - Introspection and cleanup of persisted configuration lists

pub mod chain;
pub mod conflist;
pub mod env;
pub mod ipam;
pub mod options;
pub mod plugin;
pub mod range;

pub use chain::{generate_plugins, network_id, DEFAULT_BRIDGE_INTERFACE, DEFAULT_NETWORK_NAME};
pub use conflist::NetworkConfigList;
pub use env::{CniEnv, NetworkRequest, DEFAULT_IPAM_DRIVER};
pub use ipam::IpamConfig;
pub use options::{Driver, DEFAULT_DRIVER};
pub use plugin::{Plugin, PluginEnvelope};
pub use range::{parse_subnet, SubnetPool, DEFAULT_CIDR, STARTING_CIDR};
