//! CNI network configuration lists
//!
//! Provides:
//! - The persisted list form (`cniVersion`, `name`, `plugins`)
//! - Subnet introspection for overlap checks
//! - Host-side cleanup when a network is removed

use crate::cni::ipam::HOST_LOCAL;
use crate::cni::plugin::{PluginEnvelope, BRIDGE};
use crate::error::Result;
use crate::network::{link, netns};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// CNI specification version written into new lists
pub const CNI_VERSION: &str = "1.0.0";

/// A network's ordered plugin chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfigList {
    pub cni_version: String,

    pub name: String,

    /// Keys this crate does not interpret, kept for round trips
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    pub plugins: Vec<PluginEnvelope>,
}

/// Narrow view of a bridge plugin used for cleanup
#[derive(Deserialize)]
struct BridgeInterface {
    bridge: String,
}

impl NetworkConfigList {
    /// Create a list for `name` from a generated plugin chain
    pub fn new(name: &str, plugins: Vec<PluginEnvelope>) -> Self {
        Self {
            cni_version: CNI_VERSION.to_string(),
            name: name.to_string(),
            extra: Map::new(),
            plugins,
        }
    }

    /// Parse a persisted list
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the list for persisting
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Subnets allocated by this network
    ///
    /// Only host-local bridge networks report subnets. Each range's `subnet`
    /// is read on its own, so a malformed entry is skipped without hiding
    /// the others. Subnets are returned in network form.
    pub fn subnets(&self) -> Vec<IpNet> {
        let Some(first) = self.plugins.first() else {
            return Vec::new();
        };
        if first.kind() != Some(BRIDGE) {
            return Vec::new();
        }

        let Some(ipam) = first.fields().get("ipam").and_then(Value::as_object) else {
            return Vec::new();
        };
        if ipam.get("type").and_then(Value::as_str) != Some(HOST_LOCAL) {
            return Vec::new();
        }
        let Some(groups) = ipam.get("ranges").and_then(Value::as_array) else {
            return Vec::new();
        };

        let mut subnets = Vec::new();
        for range in groups.iter().filter_map(Value::as_array).flatten() {
            let Some(subnet) = range.get("subnet").and_then(Value::as_str) else {
                tracing::warn!(network = %self.name, "skipping range without a subnet");
                continue;
            };
            match subnet.parse::<IpNet>() {
                Ok(net) => subnets.push(net.trunc()),
                Err(e) => {
                    tracing::warn!(network = %self.name, subnet, error = %e, "skipping unparsable subnet");
                }
            }
        }
        subnets
    }

    /// Remove host state owned by this network
    ///
    /// Deletes the bridge interface of bridge networks, inside `netns` when
    /// given. VLAN networks borrow their parent interface, so nothing is
    /// removed for them.
    pub fn clean(&self, netns: Option<&Path>) -> Result<()> {
        let Some(first) = self.plugins.first() else {
            return Ok(());
        };
        if first.kind() != Some(BRIDGE) {
            return Ok(());
        }

        let bridge: BridgeInterface = serde_json::from_value(Value::Object(first.fields().clone()))?;
        netns::with_netns(netns, || link::remove_interface(&bridge.bridge))
    }
}
