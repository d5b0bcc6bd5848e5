//! Command-line interface for cniwright
//!
//! Uses clap with derive for type-safe CLI parsing

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use cniwright::cni::DEFAULT_DRIVER;
use cniwright::config::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;

/// cniwright - CNI network configuration generator
#[derive(Parser)]
#[command(name = "cniwright")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate the configuration list for a new network
    Create {
        /// Network name
        name: String,

        /// Network driver (bridge, macvlan, ipvlan)
        #[arg(short, long, default_value = DEFAULT_DRIVER)]
        driver: String,

        /// Driver options (KEY=VALUE)
        #[arg(short = 'o', long = "opt", value_parser = parse_key_val)]
        options: Vec<(String, String)>,

        /// IPAM driver (default is an alias of host-local, or dhcp)
        #[arg(long, default_value = "default")]
        ipam_driver: String,

        /// IPAM options (KEY=VALUE)
        #[arg(long = "ipam-opt", value_parser = parse_key_val)]
        ipam_options: Vec<(String, String)>,

        /// Subnet in CIDR notation (repeatable)
        #[arg(long)]
        subnet: Vec<String>,

        /// Gateway address (defaults to first usable in subnet)
        #[arg(long)]
        gateway: Option<String>,

        /// Allocate addresses from a sub-range of the subnet
        #[arg(long)]
        ip_range: Option<String>,

        /// Keep IPv6 subnets and request the `ips` capability
        #[arg(long)]
        ipv6: bool,

        /// Existing configuration lists whose subnets must be avoided
        #[arg(long)]
        existing: Vec<PathBuf>,
    },

    /// Print the subnets allocated by a configuration list
    Subnets {
        /// Path to the configuration list
        file: PathBuf,
    },

    /// Remove the host bridge created for a configuration list
    Remove {
        /// Path to the configuration list
        file: PathBuf,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parse a KEY=VALUE pair
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{s}`"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Generate shell completion scripts
    pub fn generate_completion(shell: Shell) {
        let mut cmd = Self::command();
        clap_complete::generate(shell, &mut cmd, "cniwright", &mut std::io::stdout());
    }
}
