//! Option primitives and per-driver option schemas
//!
//! Driver options arrive as string maps. Each driver declares the keys it
//! accepts (with their vendor-compatible aliases) in a static table, and
//! [`DriverOptions::parse`] validates a map against that table.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Driver used when none is requested
pub const DEFAULT_DRIVER: &str = "bridge";

/// Network driver backing a CNI plugin chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Bridge,
    Macvlan,
    Ipvlan,
}

impl Driver {
    /// Resolve a driver by name
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "bridge" => Ok(Driver::Bridge),
            "macvlan" => Ok(Driver::Macvlan),
            "ipvlan" => Ok(Driver::Ipvlan),
            other => Err(Error::UnsupportedDriver(other.to_string())),
        }
    }

    /// CNI plugin type tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Bridge => "bridge",
            Driver::Macvlan => "macvlan",
            Driver::Ipvlan => "ipvlan",
        }
    }

    /// Option keys accepted by this driver
    fn schema(&self) -> &'static [OptionSpec] {
        match self {
            Driver::Bridge => BRIDGE_OPTIONS,
            Driver::Macvlan => MACVLAN_OPTIONS,
            Driver::Ipvlan => IPVLAN_OPTIONS,
        }
    }

    /// Interface modes the driver supports
    fn modes(&self) -> &'static [&'static str] {
        match self {
            Driver::Bridge => &[],
            Driver::Macvlan => &["bridge"],
            Driver::Ipvlan => &["l2", "l3"],
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic option, independent of the spelling used by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionKey {
    Mtu,
    IpMasq,
    Mode,
    Parent,
}

/// One accepted option and every name it may be given under
struct OptionSpec {
    key: OptionKey,
    names: &'static [&'static str],
}

const MTU_NAMES: &[&str] = &["mtu", "com.docker.network.driver.mtu"];

const BRIDGE_OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        key: OptionKey::Mtu,
        names: MTU_NAMES,
    },
    OptionSpec {
        key: OptionKey::IpMasq,
        names: &["ip-masq", "com.docker.network.bridge.enable_ip_masquerade"],
    },
];

// `ipvlan_mode` is not accepted here and is reported as unsupported.
const MACVLAN_OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        key: OptionKey::Mtu,
        names: MTU_NAMES,
    },
    OptionSpec {
        key: OptionKey::Mode,
        names: &["mode", "macvlan_mode"],
    },
    OptionSpec {
        key: OptionKey::Parent,
        names: &["parent"],
    },
];

const IPVLAN_OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        key: OptionKey::Mtu,
        names: MTU_NAMES,
    },
    OptionSpec {
        key: OptionKey::Mode,
        names: &["mode", "ipvlan_mode"],
    },
    OptionSpec {
        key: OptionKey::Parent,
        names: &["parent"],
    },
];

/// Validated driver options with defaults applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverOptions {
    /// Interface MTU, 0 leaves the plugin default
    pub mtu: u32,
    /// Masquerade traffic leaving the bridge
    pub ip_masq: bool,
    /// VLAN interface mode
    pub mode: Option<String>,
    /// Parent interface for VLAN drivers
    pub parent: Option<String>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            mtu: 0,
            ip_masq: true,
            mode: None,
            parent: None,
        }
    }
}

impl DriverOptions {
    /// Validate `opts` against the schema of `driver`
    pub fn parse(driver: Driver, opts: &BTreeMap<String, String>) -> Result<Self> {
        let mut parsed = Self::default();

        for (name, value) in opts {
            let spec = driver
                .schema()
                .iter()
                .find(|spec| spec.names.contains(&name.as_str()))
                .ok_or_else(|| Error::UnsupportedOption {
                    driver: driver.to_string(),
                    option: name.clone(),
                })?;

            match spec.key {
                OptionKey::Mtu => parsed.mtu = parse_mtu(value)?,
                OptionKey::IpMasq => parsed.ip_masq = parse_bool(name, value)?,
                OptionKey::Mode => {
                    if !driver.modes().contains(&value.as_str()) {
                        return Err(Error::invalid_option(
                            name,
                            value,
                            format!("unknown {} mode", driver),
                        ));
                    }
                    parsed.mode = Some(value.clone());
                }
                OptionKey::Parent => parsed.parent = Some(value.clone()),
            }
        }

        Ok(parsed)
    }
}

/// Parse an MTU value; 0 means "use the plugin default"
pub fn parse_mtu(value: &str) -> Result<u32> {
    let mtu: i64 = value
        .trim()
        .parse()
        .map_err(|_| Error::invalid_option("mtu", value, "not an integer"))?;
    if mtu < 0 {
        return Err(Error::invalid_option("mtu", value, "mtu is less than zero"));
    }
    u32::try_from(mtu).map_err(|_| Error::invalid_option("mtu", value, "mtu is too large"))
}

/// Parse a boolean option value
///
/// Accepts `1`, `t`, `T`, `TRUE`, `true`, `True` and their false
/// counterparts `0`, `f`, `F`, `FALSE`, `false`, `False`.
pub fn parse_bool(option: &str, value: &str) -> Result<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(Error::invalid_option(option, value, "not a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_mtu() {
        assert_eq!(parse_mtu("1500").unwrap(), 1500);
        assert_eq!(parse_mtu("0").unwrap(), 0);
        assert!(matches!(parse_mtu("-1"), Err(Error::InvalidOption { .. })));
        assert!(matches!(parse_mtu("jumbo"), Err(Error::InvalidOption { .. })));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("ip-masq", "true").unwrap());
        assert!(parse_bool("ip-masq", "T").unwrap());
        assert!(!parse_bool("ip-masq", "0").unwrap());
        assert!(!parse_bool("ip-masq", "False").unwrap());
        assert!(matches!(
            parse_bool("ip-masq", "yes"),
            Err(Error::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_unknown_driver() {
        assert!(matches!(
            Driver::from_name("overlay"),
            Err(Error::UnsupportedDriver(name)) if name == "overlay"
        ));
    }

    #[test]
    fn test_default_driver_is_bridge() {
        assert_eq!(Driver::from_name(DEFAULT_DRIVER).unwrap(), Driver::Bridge);
    }

    #[test]
    fn test_bridge_defaults() {
        let parsed = DriverOptions::parse(Driver::Bridge, &BTreeMap::new()).unwrap();
        assert_eq!(parsed, DriverOptions::default());
        assert!(parsed.ip_masq);
    }

    #[test]
    fn test_bridge_aliases() {
        let parsed = DriverOptions::parse(
            Driver::Bridge,
            &opts(&[
                ("com.docker.network.driver.mtu", "9000"),
                ("com.docker.network.bridge.enable_ip_masquerade", "false"),
            ]),
        )
        .unwrap();
        assert_eq!(parsed.mtu, 9000);
        assert!(!parsed.ip_masq);
    }

    #[test]
    fn test_bridge_rejects_vlan_options() {
        let err = DriverOptions::parse(Driver::Bridge, &opts(&[("parent", "eth0")])).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedOption { ref driver, ref option } if driver == "bridge" && option == "parent"
        ));
    }

    #[test]
    fn test_macvlan_modes() {
        let parsed =
            DriverOptions::parse(Driver::Macvlan, &opts(&[("macvlan_mode", "bridge")])).unwrap();
        assert_eq!(parsed.mode.as_deref(), Some("bridge"));

        assert!(matches!(
            DriverOptions::parse(Driver::Macvlan, &opts(&[("mode", "l2")])),
            Err(Error::InvalidOption { .. })
        ));
        assert!(matches!(
            DriverOptions::parse(Driver::Macvlan, &opts(&[("ipvlan_mode", "l2")])),
            Err(Error::UnsupportedOption { .. })
        ));
    }

    #[test]
    fn test_ipvlan_modes() {
        let parsed = DriverOptions::parse(
            Driver::Ipvlan,
            &opts(&[("ipvlan_mode", "l3"), ("parent", "eth0")]),
        )
        .unwrap();
        assert_eq!(parsed.mode.as_deref(), Some("l3"));
        assert_eq!(parsed.parent.as_deref(), Some("eth0"));

        assert!(matches!(
            DriverOptions::parse(Driver::Ipvlan, &opts(&[("mode", "bridge")])),
            Err(Error::InvalidOption { .. })
        ));
        assert!(matches!(
            DriverOptions::parse(Driver::Ipvlan, &opts(&[("macvlan_mode", "bridge")])),
            Err(Error::UnsupportedOption { .. })
        ));
    }
}
