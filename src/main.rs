//! cniwright - CNI network configuration generator
//!
//! Generates CNI configuration lists for bridge, macvlan and ipvlan
//! networks, and inspects or cleans up persisted ones.

mod cli;

use cli::{Cli, Commands};
use cniwright::error::{Error, Result};
use cniwright::{config, CniEnv, NetworkConfigList, NetworkRequest};
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_network(path: &Path) -> Result<NetworkConfigList> {
    let content = fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    NetworkConfigList::from_json(&content)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Completion { shell } => {
            Cli::generate_completion(shell);
        }

        Commands::Create {
            name,
            driver,
            options,
            ipam_driver,
            ipam_options,
            subnet,
            gateway,
            ip_range,
            ipv6,
            existing,
        } => {
            let settings = config::load_or_default(&cli.config)?;
            let existing = existing
                .iter()
                .map(|path| read_network(path))
                .collect::<Result<Vec<_>>>()?;
            let env = CniEnv::from_settings(&settings)?.with_existing(&existing);

            let request = NetworkRequest {
                driver,
                options: options.into_iter().collect(),
                ipam_driver,
                ipam_options: ipam_options.into_iter().collect(),
                subnets: subnet,
                gateway,
                ip_range,
                ipv6,
            };
            let network = env.create_network(&name, &request)?;
            println!("{}", network.to_json()?);
        }

        Commands::Subnets { file } => {
            let network = read_network(&file)?;
            for subnet in network.subnets() {
                println!("{}", subnet);
            }
        }

        Commands::Remove { file } => {
            let settings = config::load_or_default(&cli.config)?;
            let env = CniEnv::from_settings(&settings)?;
            let network = read_network(&file)?;
            env.remove_network(&network)?;
            eprintln!("Removed host state of network '{}'", network.name);
        }
    }

    Ok(())
}
