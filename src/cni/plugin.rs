//! CNI plugin configuration records
//!
//! A persisted network keeps its plugins as [`PluginEnvelope`]s, raw JSON
//! objects carrying a `type` tag. [`PluginEnvelope::decode`] inspects the tag
//! and builds the matching [`Plugin`] variant; plugins this crate does not
//! model stay opaque.

use crate::cni::ipam::{tagged, IpamConfig};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const BRIDGE: &str = "bridge";
pub const MACVLAN: &str = "macvlan";
pub const IPVLAN: &str = "ipvlan";
pub const TUNING: &str = "tuning";

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// Linux bridge plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgePlugin {
    /// Host bridge interface name
    #[serde(default)]
    pub bridge: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_gateway: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub ip_masq: bool,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub mtu: u32,

    #[serde(default, skip_serializing_if = "is_false")]
    pub hairpin_mode: bool,

    pub ipam: IpamConfig,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub capabilities: BTreeMap<String, bool>,
}

/// macvlan or ipvlan plugin attached to an existing parent interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VlanPlugin {
    /// Parent interface name
    #[serde(default)]
    pub master: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub mtu: u32,

    pub ipam: IpamConfig,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub capabilities: BTreeMap<String, bool>,
}

/// sysctl tuning plugin, always placed right after a bridge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuningPlugin {}

/// A decoded plugin configuration
#[derive(Debug, Clone, PartialEq)]
pub enum Plugin {
    Bridge(BridgePlugin),
    Macvlan(VlanPlugin),
    Ipvlan(VlanPlugin),
    Tuning(TuningPlugin),
    /// Plugin type this crate does not model
    Opaque(Map<String, Value>),
}

/// Raw plugin object as stored in a network configuration list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginEnvelope(Map<String, Value>);

impl PluginEnvelope {
    /// Plugin type tag
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// Raw plugin fields
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Decode the plugin according to its type tag
    pub fn decode(&self) -> Result<Plugin> {
        let body = || Value::Object(self.0.clone());
        let plugin = match self.kind() {
            Some(BRIDGE) => Plugin::Bridge(serde_json::from_value(body())?),
            Some(MACVLAN) => Plugin::Macvlan(serde_json::from_value(body())?),
            Some(IPVLAN) => Plugin::Ipvlan(serde_json::from_value(body())?),
            Some(TUNING) => Plugin::Tuning(TuningPlugin::default()),
            _ => Plugin::Opaque(self.0.clone()),
        };
        Ok(plugin)
    }
}

impl From<Map<String, Value>> for PluginEnvelope {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<&Plugin> for PluginEnvelope {
    type Error = crate::error::Error;

    fn try_from(plugin: &Plugin) -> Result<Self> {
        let fields = match plugin {
            Plugin::Bridge(config) => tagged(BRIDGE, config)?,
            Plugin::Macvlan(config) => tagged(MACVLAN, config)?,
            Plugin::Ipvlan(config) => tagged(IPVLAN, config)?,
            Plugin::Tuning(config) => tagged(TUNING, config)?,
            Plugin::Opaque(fields) => fields.clone(),
        };
        Ok(Self(fields))
    }
}
