//! Subnet parsing and IPAM range construction
//!
//! Provides:
//! - Subnet parsing with overlap checks against existing networks
//! - Free subnet selection for networks created without `--subnet`
//! - Range descriptors honouring custom gateways and ip-ranges

use crate::cni::ipam::IpamRange;
use crate::error::{Error, Result};
use ipnet::{IpNet, Ipv4Net};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Subnet of the default network
pub const DEFAULT_CIDR: &str = "172.17.0.0/24";

/// First subnet handed to a non-default network created without `--subnet`
pub const STARTING_CIDR: &str = "172.17.1.0/24";

/// Subnets already claimed by existing networks
#[derive(Debug, Clone, Default)]
pub struct SubnetPool {
    used: Vec<IpNet>,
}

impl SubnetPool {
    /// Create a pool that avoids the given subnets
    pub fn new(used: Vec<IpNet>) -> Self {
        Self { used }
    }

    /// Subnets currently in use
    pub fn used(&self) -> &[IpNet] {
        &self.used
    }

    /// Parse a requested subnet
    ///
    /// An empty string selects the first free block starting from
    /// [`STARTING_CIDR`].
    pub fn parse(&self, subnet: &str) -> Result<IpNet> {
        if subnet.is_empty() {
            return self.free_subnet();
        }

        let net = parse_subnet(subnet)?;
        if let Some(existing) = self.used.iter().find(|used| overlaps(used, &net)) {
            return Err(Error::invalid_subnet(
                subnet,
                format!("overlaps with {} on this address space", existing),
            ));
        }
        Ok(net)
    }

    /// First block of [`STARTING_CIDR`]'s size that overlaps no used subnet
    pub fn free_subnet(&self) -> Result<IpNet> {
        let start: Ipv4Net = STARTING_CIDR
            .parse()
            .map_err(|e| Error::invalid_subnet(STARTING_CIDR, format!("{}", e)))?;
        let step = 1u64 << (32 - u32::from(start.prefix_len()));

        let mut base = u64::from(u32::from(start.network()));
        while base + step - 1 <= u64::from(u32::MAX) {
            let addr = Ipv4Addr::from(base as u32);
            let candidate = IpNet::V4(
                Ipv4Net::new(addr, start.prefix_len())
                    .map_err(|e| Error::invalid_subnet(STARTING_CIDR, format!("{}", e)))?,
            );
            if !self.used.iter().any(|used| overlaps(used, &candidate)) {
                return Ok(candidate);
            }
            base += step;
        }

        Err(Error::SubnetExhausted(STARTING_CIDR.to_string()))
    }
}

/// Parse a CIDR string into a subnet
///
/// The address must be the network address of the block.
pub fn parse_subnet(subnet: &str) -> Result<IpNet> {
    let net: IpNet = subnet
        .parse()
        .map_err(|e| Error::invalid_subnet(subnet, format!("{}", e)))?;
    if net.addr() != net.network() {
        return Err(Error::invalid_subnet(
            subnet,
            format!("unexpected subnet, maybe you meant {}?", net.trunc()),
        ));
    }
    Ok(net)
}

/// Build the range descriptor for one subnet
///
/// The gateway defaults to the first host of the subnet. When `ip_range` is
/// given, allocation is restricted to its hosts, and the block must lie
/// inside `subnet`.
pub fn build_range(subnet: IpNet, gateway: Option<&str>, ip_range: Option<&str>) -> Result<IpamRange> {
    let gateway = match gateway {
        Some(gw) => {
            let addr: IpAddr = gw.parse().map_err(|_| Error::InvalidGateway {
                gateway: gw.to_string(),
                reason: "not an IP address".to_string(),
            })?;
            if !subnet.contains(&addr) {
                return Err(Error::InvalidGateway {
                    gateway: gw.to_string(),
                    reason: format!("no matching subnet {}", subnet),
                });
            }
            Some(addr)
        }
        None => host_offset(&subnet, 1),
    };

    let mut range = IpamRange {
        subnet,
        range_start: None,
        range_end: None,
        gateway,
    };

    if let Some(ip_range) = ip_range {
        let block: IpNet = ip_range
            .parse()
            .map_err(|e| Error::invalid_subnet(ip_range, format!("{}", e)))?;
        let block = block.trunc();

        let outside = || Error::RangeOutsideSubnet {
            subnet: subnet.to_string(),
            range: ip_range.to_string(),
        };
        let start = host_offset(&block, 1).ok_or_else(outside)?;
        let end = host_offset_from_end(&block, 1).ok_or_else(outside)?;
        // A /31 or /127 block has no hosts between its two addresses
        if start > end || !subnet.contains(&start) || !subnet.contains(&end) {
            return Err(outside());
        }

        range.range_start = Some(start);
        range.range_end = Some(end);
    }

    Ok(range)
}

/// Build one range group per requested subnet
///
/// IPv6 subnets are dropped unless `ipv6` is set. The returned flag reports
/// whether any IPv4 subnet survived.
pub fn build_filtered_ranges(
    pool: &SubnetPool,
    subnets: &[String],
    gateway: Option<&str>,
    ip_range: Option<&str>,
    ipv6: bool,
) -> Result<(Vec<Vec<IpamRange>>, bool)> {
    let mut found_ipv4 = false;
    let mut groups = Vec::with_capacity(subnets.len());

    for subnet in subnets {
        let net = pool.parse(subnet)?;
        match net {
            IpNet::V6(_) if !ipv6 => continue,
            IpNet::V4(_) => found_ipv4 = true,
            IpNet::V6(_) => {}
        }
        groups.push(vec![build_range(net, gateway, ip_range)?]);
    }

    Ok((groups, found_ipv4))
}

fn overlaps(a: &IpNet, b: &IpNet) -> bool {
    a.contains(&b.network()) || b.contains(&a.network())
}

/// Address `offset` past the network address, if it is inside the block
fn host_offset(net: &IpNet, offset: u32) -> Option<IpAddr> {
    let addr = match net {
        IpNet::V4(v4) => IpAddr::V4(Ipv4Addr::from(
            u32::from(v4.network()).checked_add(offset)?,
        )),
        IpNet::V6(v6) => IpAddr::V6(Ipv6Addr::from(
            u128::from(v6.network()).checked_add(u128::from(offset))?,
        )),
    };
    net.contains(&addr).then_some(addr)
}

/// Address `offset` before the last address of the block, if it is inside
fn host_offset_from_end(net: &IpNet, offset: u32) -> Option<IpAddr> {
    let addr = match net {
        IpNet::V4(v4) => IpAddr::V4(Ipv4Addr::from(
            u32::from(v4.broadcast()).checked_sub(offset)?,
        )),
        IpNet::V6(v6) => IpAddr::V6(Ipv6Addr::from(
            u128::from(v6.broadcast()).checked_sub(u128::from(offset))?,
        )),
    };
    net.contains(&addr).then_some(addr)
}
