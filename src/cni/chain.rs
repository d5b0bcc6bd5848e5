//! Plugin chain generation for each network driver

use crate::cni::ipam::IpamConfig;
use crate::cni::options::{Driver, DriverOptions};
use crate::cni::plugin::{BridgePlugin, Plugin, PluginEnvelope, TuningPlugin, VlanPlugin};
use crate::error::Result;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Name of the network every engine starts with
pub const DEFAULT_NETWORK_NAME: &str = "bridge";

/// Host bridge interface of the default network
pub const DEFAULT_BRIDGE_INTERFACE: &str = "nerdctl0";

/// Stable identifier of a network: lowercase hex SHA-256 of its name
pub fn network_id(name: &str) -> String {
    hex::encode(Sha256::digest(name.as_bytes()))
}

/// Host bridge interface name for a network
///
/// `br-` followed by the first 12 characters of [`network_id`], which keeps
/// the name within the kernel's 15 byte interface name limit.
pub fn bridge_interface_name(network: &str) -> String {
    if network == DEFAULT_NETWORK_NAME {
        DEFAULT_BRIDGE_INTERFACE.to_string()
    } else {
        format!("br-{}", &network_id(network)[..12])
    }
}

/// Generate the ordered plugin chain for a network
///
/// Bridge networks get a bridge plugin followed by the tuning plugin;
/// macvlan and ipvlan networks get a single plugin.
pub fn generate_plugins(
    driver: &str,
    network: &str,
    opts: &BTreeMap<String, String>,
    ipam: &IpamConfig,
    ipv6: bool,
) -> Result<Vec<PluginEnvelope>> {
    let driver = Driver::from_name(driver)?;
    let options = DriverOptions::parse(driver, opts)?;

    let mut capabilities = BTreeMap::new();
    if ipv6 {
        capabilities.insert("ips".to_string(), true);
    }

    let plugins = match driver {
        Driver::Bridge => vec![
            Plugin::Bridge(BridgePlugin {
                bridge: bridge_interface_name(network),
                is_gateway: true,
                ip_masq: options.ip_masq,
                mtu: options.mtu,
                hairpin_mode: true,
                ipam: ipam.clone(),
                capabilities,
            }),
            Plugin::Tuning(TuningPlugin::default()),
        ],
        Driver::Macvlan | Driver::Ipvlan => {
            let vlan = VlanPlugin {
                master: options.parent.unwrap_or_default(),
                mode: options.mode,
                mtu: options.mtu,
                ipam: ipam.clone(),
                capabilities,
            };
            if driver == Driver::Macvlan {
                vec![Plugin::Macvlan(vlan)]
            } else {
                vec![Plugin::Ipvlan(vlan)]
            }
        }
    };

    plugins.iter().map(PluginEnvelope::try_from).collect()
}
