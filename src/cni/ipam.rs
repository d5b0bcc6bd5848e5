//! IPAM configuration records
//!
//! The `type` key selects the variant. Host-local and DHCP configurations
//! are decoded into typed records; any other IPAM plugin is kept as an
//! opaque JSON object and written back untouched.

use ipnet::IpNet;
use serde::de::{self, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::net::IpAddr;
use std::path::PathBuf;

/// IPAM type tag for static host-local allocation
pub const HOST_LOCAL: &str = "host-local";

/// IPAM type tag for DHCP allocation
pub const DHCP: &str = "dhcp";

/// Engine argument carrying the container hostname for DHCP requests
pub const DHCP_HOSTNAME_ARG: &str = "NERDCTL_CNI_DHCP_HOSTNAME";

/// IPAM section of a plugin configuration
#[derive(Debug, Clone, PartialEq)]
pub enum IpamConfig {
    HostLocal(HostLocalIpam),
    Dhcp(DhcpIpam),
    /// IPAM plugin this crate does not model
    Other(Map<String, Value>),
}

impl IpamConfig {
    /// IPAM plugin type tag
    pub fn kind(&self) -> Option<&str> {
        match self {
            IpamConfig::HostLocal(_) => Some(HOST_LOCAL),
            IpamConfig::Dhcp(_) => Some(DHCP),
            IpamConfig::Other(map) => map.get("type").and_then(Value::as_str),
        }
    }
}

/// Static allocation from a set of address ranges
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostLocalIpam {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<IpamRoute>,

    /// One group per requested subnet
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<Vec<IpamRange>>,
}

impl HostLocalIpam {
    /// All subnets across every range group
    pub fn subnets(&self) -> Vec<IpNet> {
        self.ranges
            .iter()
            .flatten()
            .map(|range| range.subnet)
            .collect()
    }
}

/// One contiguous allocatable block within a subnet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpamRange {
    pub subnet: IpNet,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_start: Option<IpAddr>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_end: Option<IpAddr>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<IpAddr>,
}

/// Route installed in the container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpamRoute {
    pub dst: IpNet,
}

/// Dynamic allocation through the CNI DHCP daemon
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DhcpIpam {
    pub daemon_socket_path: PathBuf,

    #[serde(default, rename = "provide", skip_serializing_if = "Vec::is_empty")]
    pub provide_options: Vec<ProvideOption>,

    #[serde(default, rename = "request", skip_serializing_if = "Vec::is_empty")]
    pub request_options: Vec<RequestOption>,
}

/// DHCP option sent to the server, either literal or taken from a CNI argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvideOption {
    pub option: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, rename = "fromArg", skip_serializing_if = "Option::is_none")]
    pub from_arg: Option<String>,
}

/// DHCP option requested from the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOption {
    #[serde(default, rename = "skipDefault")]
    pub skip_default: bool,

    pub option: String,
}

/// Serialize `body` as a JSON object whose first key is `"type": kind`
pub(crate) fn tagged<T: Serialize>(kind: &str, body: &T) -> serde_json::Result<Map<String, Value>> {
    let mut map = Map::new();
    map.insert("type".to_string(), Value::String(kind.to_string()));
    match serde_json::to_value(body)? {
        Value::Object(fields) => {
            for (key, value) in fields {
                if key != "type" {
                    map.insert(key, value);
                }
            }
            Ok(map)
        }
        other => Err(ser::Error::custom(format!(
            "{} configuration must be an object, got {}",
            kind, other
        ))),
    }
}

impl Serialize for IpamConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map = match self {
            IpamConfig::HostLocal(config) => tagged(HOST_LOCAL, config),
            IpamConfig::Dhcp(config) => tagged(DHCP, config),
            IpamConfig::Other(map) => Ok(map.clone()),
        }
        .map_err(ser::Error::custom)?;
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for IpamConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        let kind = map.get("type").and_then(Value::as_str).map(str::to_owned);
        match kind.as_deref() {
            Some(HOST_LOCAL) => serde_json::from_value(Value::Object(map))
                .map(IpamConfig::HostLocal)
                .map_err(de::Error::custom),
            Some(DHCP) => serde_json::from_value(Value::Object(map))
                .map(IpamConfig::Dhcp)
                .map_err(de::Error::custom),
            _ => Ok(IpamConfig::Other(map)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_local_wire_format() {
        let ipam = IpamConfig::HostLocal(HostLocalIpam {
            routes: vec![IpamRoute {
                dst: "0.0.0.0/0".parse().unwrap(),
            }],
            ranges: vec![vec![IpamRange {
                subnet: "10.4.0.0/24".parse().unwrap(),
                range_start: None,
                range_end: None,
                gateway: Some("10.4.0.1".parse().unwrap()),
            }]],
        });

        assert_eq!(
            serde_json::to_string(&ipam).unwrap(),
            r#"{"type":"host-local","routes":[{"dst":"0.0.0.0/0"}],"ranges":[[{"subnet":"10.4.0.0/24","gateway":"10.4.0.1"}]]}"#
        );
    }

    #[test]
    fn test_dhcp_wire_format() {
        let ipam = IpamConfig::Dhcp(DhcpIpam {
            daemon_socket_path: PathBuf::from("/run/cni/dhcp.sock"),
            provide_options: vec![ProvideOption {
                option: "host-name".to_string(),
                value: None,
                from_arg: Some(DHCP_HOSTNAME_ARG.to_string()),
            }],
            request_options: vec![RequestOption {
                skip_default: true,
                option: "routers".to_string(),
            }],
        });

        assert_eq!(
            serde_json::to_string(&ipam).unwrap(),
            r#"{"type":"dhcp","daemonSocketPath":"/run/cni/dhcp.sock","provide":[{"option":"host-name","fromArg":"NERDCTL_CNI_DHCP_HOSTNAME"}],"request":[{"skipDefault":true,"option":"routers"}]}"#
        );
    }

    #[test]
    fn test_decode_by_tag() {
        let host_local: IpamConfig = serde_json::from_str(
            r#"{"type":"host-local","ranges":[[{"subnet":"10.4.0.0/24"}],[{"subnet":"fd00::/64"}]]}"#,
        )
        .unwrap();
        let IpamConfig::HostLocal(config) = host_local else {
            panic!("expected host-local ipam");
        };
        assert_eq!(
            config.subnets(),
            vec![
                "10.4.0.0/24".parse::<IpNet>().unwrap(),
                "fd00::/64".parse::<IpNet>().unwrap()
            ]
        );

        let other: IpamConfig =
            serde_json::from_str(r#"{"type":"static","addresses":[]}"#).unwrap();
        assert_eq!(other.kind(), Some("static"));
        assert_eq!(
            serde_json::to_string(&other).unwrap(),
            r#"{"type":"static","addresses":[]}"#
        );
    }

    #[test]
    fn test_malformed_host_local_is_rejected() {
        let result: Result<IpamConfig, _> =
            serde_json::from_str(r#"{"type":"host-local","ranges":[[{"subnet":"bogus"}]]}"#);
        assert!(result.is_err());
    }
}
