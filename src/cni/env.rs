//! Network creation environment
//!
//! [`CniEnv`] holds what IPAM generation needs from the host: the CNI
//! runtime directory, the subnets taken by existing networks and the
//! namespace host interfaces live in.

use crate::cni::chain::generate_plugins;
use crate::cni::conflist::NetworkConfigList;
use crate::cni::ipam::{
    DhcpIpam, HostLocalIpam, IpamConfig, IpamRoute, ProvideOption, RequestOption,
    DHCP_HOSTNAME_ARG,
};
use crate::cni::options::DEFAULT_DRIVER;
use crate::cni::range::{build_filtered_ranges, SubnetPool};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::sys;
use ipnet::{IpNet, Ipv4Net};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// IPAM driver used when none is requested
pub const DEFAULT_IPAM_DRIVER: &str = "host-local";

/// DHCP daemon socket name inside the CNI runtime directory
const DHCP_SOCKET: &str = "dhcp.sock";

/// A request to create a network
#[derive(Debug, Clone)]
pub struct NetworkRequest {
    pub driver: String,
    pub options: BTreeMap<String, String>,
    pub ipam_driver: String,
    pub ipam_options: BTreeMap<String, String>,
    pub subnets: Vec<String>,
    pub gateway: Option<String>,
    pub ip_range: Option<String>,
    pub ipv6: bool,
}

impl Default for NetworkRequest {
    fn default() -> Self {
        Self {
            driver: DEFAULT_DRIVER.to_string(),
            options: BTreeMap::new(),
            ipam_driver: DEFAULT_IPAM_DRIVER.to_string(),
            ipam_options: BTreeMap::new(),
            subnets: Vec::new(),
            gateway: None,
            ip_range: None,
            ipv6: false,
        }
    }
}

/// User supplied DHCP option, encoded as a small JSON object
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DhcpOptionSpec {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    from_arg: String,
    #[serde(default)]
    skip_default: bool,
}

/// Host context for generating network configurations
#[derive(Debug, Clone)]
pub struct CniEnv {
    runtime_dir: PathBuf,
    netns: Option<PathBuf>,
    pool: SubnetPool,
}

impl CniEnv {
    /// Create an environment using `runtime_dir` for CNI runtime sockets
    pub fn new(runtime_dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime_dir: runtime_dir.into(),
            netns: None,
            pool: SubnetPool::default(),
        }
    }

    /// Create an environment from runtime settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut env = Self::new(settings.cni_runtime_dir()?);
        env.netns = settings.detached_netns()?;
        Ok(env)
    }

    /// Avoid the subnets of these existing networks
    pub fn with_existing(mut self, networks: &[NetworkConfigList]) -> Self {
        let used: Vec<IpNet> = networks.iter().flat_map(NetworkConfigList::subnets).collect();
        self.pool = SubnetPool::new(used);
        self
    }

    /// Namespace holding host interfaces
    pub fn with_netns(mut self, netns: Option<PathBuf>) -> Self {
        self.netns = netns;
        self
    }

    pub fn runtime_dir(&self) -> &Path {
        &self.runtime_dir
    }

    pub fn subnet_pool(&self) -> &SubnetPool {
        &self.pool
    }

    /// Generate the IPAM configuration for a network
    pub fn generate_ipam(
        &self,
        driver: &str,
        subnets: &[String],
        gateway: Option<&str>,
        ip_range: Option<&str>,
        opts: &BTreeMap<String, String>,
        ipv6: bool,
    ) -> Result<IpamConfig> {
        match driver {
            "default" | DEFAULT_IPAM_DRIVER => self
                .host_local_ipam(subnets, gateway, ip_range, ipv6)
                .map(IpamConfig::HostLocal),
            "dhcp" => self.dhcp_ipam(opts).map(IpamConfig::Dhcp),
            other => Err(Error::UnsupportedIpamDriver(other.to_string())),
        }
    }

    fn host_local_ipam(
        &self,
        subnets: &[String],
        gateway: Option<&str>,
        ip_range: Option<&str>,
        ipv6: bool,
    ) -> Result<HostLocalIpam> {
        let (mut ranges, found_ipv4) =
            build_filtered_ranges(&self.pool, subnets, gateway, ip_range, ipv6)?;

        if !found_ipv4 {
            // The gateway and ip-range describe the requested subnets; they
            // only apply to the synthesized one when nothing was requested.
            let (gateway, ip_range) = if subnets.is_empty() {
                (gateway, ip_range)
            } else {
                (None, None)
            };
            let (backfill, _) =
                build_filtered_ranges(&self.pool, &[String::new()], gateway, ip_range, ipv6)?;
            tracing::debug!(groups = backfill.len(), "added default IPv4 range");
            ranges.extend(backfill);
        }

        Ok(HostLocalIpam {
            routes: vec![IpamRoute {
                dst: IpNet::V4(Ipv4Net::default()),
            }],
            ranges,
        })
    }

    fn dhcp_ipam(&self, opts: &BTreeMap<String, String>) -> Result<DhcpIpam> {
        let socket = self.runtime_dir.join(DHCP_SOCKET);
        if let Err(e) = sys::is_socket_accessible(&socket) {
            tracing::warn!(
                socket = %socket.display(),
                error = %e,
                "cannot access dhcp socket (hint: try running with `dhcp daemon --socketpath={}` in CNI_PATH to launch the dhcp daemon)",
                socket.display()
            );
        }

        let mut ipam = DhcpIpam {
            daemon_socket_path: socket,
            provide_options: vec![ProvideOption {
                option: "host-name".to_string(),
                value: None,
                from_arg: Some(DHCP_HOSTNAME_ARG.to_string()),
            }],
            request_options: Vec::new(),
        };

        for (name, raw) in opts {
            if name == "host-name" {
                continue;
            }
            let spec: DhcpOptionSpec =
                serde_json::from_str(raw).map_err(|_| Error::InvalidIpamOption {
                    option: name.clone(),
                    value: raw.clone(),
                })?;
            match spec.kind.as_str() {
                "provide" => ipam.provide_options.push(ProvideOption {
                    option: name.clone(),
                    value: Some(spec.value).filter(|v| !v.is_empty()),
                    from_arg: Some(spec.from_arg).filter(|v| !v.is_empty()),
                }),
                "request" => ipam.request_options.push(RequestOption {
                    skip_default: spec.skip_default,
                    option: name.clone(),
                }),
                _ => return Err(Error::MissingIpamOptionType(name.clone())),
            }
        }

        Ok(ipam)
    }

    /// Build the complete configuration list for a new network
    pub fn create_network(&self, name: &str, request: &NetworkRequest) -> Result<NetworkConfigList> {
        let ipam = self.generate_ipam(
            &request.ipam_driver,
            &request.subnets,
            request.gateway.as_deref(),
            request.ip_range.as_deref(),
            &request.ipam_options,
            request.ipv6,
        )?;
        let plugins = generate_plugins(&request.driver, name, &request.options, &ipam, request.ipv6)?;
        Ok(NetworkConfigList::new(name, plugins))
    }

    /// Remove host state of a network that is being deleted
    pub fn remove_network(&self, network: &NetworkConfigList) -> Result<()> {
        network.clean(self.netns.as_deref())
    }
}
