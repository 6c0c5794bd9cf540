//! uplinkmgrd: query tool over device network snapshots.
//!
//! # Usage
//!
//! ```bash
//! # Management ports, rotated by one
//! uplinkmgrd ports --status /run/DeviceNetworkStatus/global.json --rotation 1
//!
//! # Second eligible address, skipping link-local
//! uplinkmgrd addr --status global.json --pick 1
//!
//! # Adopt the best ranked port configuration
//! uplinkmgrd adopt --config DevicePortConfigList/global.json --json
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use uplink_types::IpAddress;
use uplinkmgr::port::{
    list_mgmt_ports, report_ports, resolve_adapter_name, resolve_adapter_name_strict,
    reverse_lookup_port, select_address, AddressFilter, CostFilter,
};
use uplinkmgr::snapshot::{load_port_config_list, load_status};
use uplinkmgr::{DeviceNetworkStatus, StatusPublisher};

#[derive(Parser, Debug)]
#[command(name = "uplinkmgrd", version)]
#[command(about = "Uplink selection over device network snapshots", long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is not set
    #[arg(short = 'l', long, default_value = "info", global = true)]
    log_level: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct StatusArg {
    /// DeviceNetworkStatus snapshot file
    #[arg(short, long)]
    status: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List management ports
    Ports {
        #[command(flatten)]
        status: StatusArg,
        /// Left rotation applied to the list
        #[arg(short, long, default_value = "0")]
        rotation: usize,
        #[arg(short, long, value_enum, default_value = "any")]
        cost: Cost,
    },
    /// Select a local address on the management ports
    Addr {
        #[command(flatten)]
        status: StatusArg,
        /// Index into the eligible addresses, wrapping around
        #[arg(short, long, default_value = "0")]
        pick: usize,
        /// Restrict to one port, by logical or interface name
        #[arg(long, default_value = "")]
        port: String,
        #[arg(long)]
        free_only: bool,
        #[arg(long)]
        include_link_local: bool,
    },
    /// Find the management port that owns an address
    Owner {
        #[command(flatten)]
        status: StatusArg,
        addr: IpAddress,
    },
    /// Resolve an adapter name to an interface name
    Resolve {
        #[command(flatten)]
        status: StatusArg,
        name: String,
        /// Fail instead of passing an unknown name through
        #[arg(long)]
        strict: bool,
    },
    /// Port names reported in info and metrics
    Report {
        #[command(flatten)]
        status: StatusArg,
    },
    /// Show port configurations in rank order
    Rank {
        /// DevicePortConfigList file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Adopt a port configuration and print the resulting status
    Adopt {
        /// DevicePortConfigList file
        #[arg(short, long)]
        config: PathBuf,
        /// Configuration key; the best ranked entry when omitted
        #[arg(short, long)]
        key: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Cost {
    Any,
    Free,
    NonFree,
}

impl From<Cost> for CostFilter {
    fn from(cost: Cost) -> Self {
        match cost {
            Cost::Any => CostFilter::Any,
            Cost::Free => CostFilter::FreeOnly,
            Cost::NonFree => CostFilter::NonFreeOnly,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RankRow<'a> {
    index: usize,
    key: &'a str,
    version: u32,
    failing: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;
    debug!(?cli, "Parsed arguments");
    run(&cli)
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level {}", level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set logger: {}", e))
}

fn load(arg: &StatusArg) -> Result<DeviceNetworkStatus> {
    load_status(&arg.status)
        .with_context(|| format!("loading status from {}", arg.status.display()))
}

fn print<T: Serialize + std::fmt::Debug>(json: bool, value: &T) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{:?}", value);
    }
    Ok(())
}

fn print_lines(json: bool, lines: &[String]) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(lines)?);
    } else {
        for line in lines {
            println!("{}", line);
        }
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Ports {
            status,
            rotation,
            cost,
        } => {
            let status = load(status)?;
            let ports = list_mgmt_ports(&status, *rotation, (*cost).into());
            print_lines(cli.json, &ports)
        }
        Command::Addr {
            status,
            pick,
            port,
            free_only,
            include_link_local,
        } => {
            let status = load(status)?;
            let filter = AddressFilter {
                free_only: *free_only,
                include_link_local: *include_link_local,
            };
            let addr = select_address(&status, *pick, port, filter)?;
            print_lines(cli.json, &[addr.to_string()])
        }
        Command::Owner { status, addr } => {
            let status = load(status)?;
            let owner = reverse_lookup_port(&status, addr)
                .with_context(|| format!("no management port owns {}", addr))?;
            print_lines(cli.json, &[owner.to_string()])
        }
        Command::Resolve {
            status,
            name,
            strict,
        } => {
            let status = load(status)?;
            let if_name = if *strict {
                resolve_adapter_name_strict(&status, name)?
            } else {
                let resolution = resolve_adapter_name(&status, name);
                if !resolution.is_resolved() {
                    info!(name = %name, "Adapter name passed through unresolved");
                }
                resolution.into_if_name()
            };
            print_lines(cli.json, &[if_name])
        }
        Command::Report { status } => {
            let status = load(status)?;
            print_lines(cli.json, &report_ports(&status))
        }
        Command::Rank { config } => {
            let list = load_port_config_list(config)
                .with_context(|| format!("loading port configs from {}", config.display()))?;
            let rows: Vec<RankRow> = list
                .ranked()
                .into_iter()
                .filter_map(|index| {
                    list.get(index).map(|entry| RankRow {
                        index,
                        key: &entry.key,
                        version: entry.version.0,
                        failing: entry.is_probe_failing(),
                    })
                })
                .collect();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in &rows {
                    let health = if row.failing { "failing" } else { "ok" };
                    println!("{}\t{}\tv{}\t{}", row.index, row.key, row.version, health);
                }
            }
            Ok(())
        }
        Command::Adopt { config, key } => {
            let list = load_port_config_list(config)
                .with_context(|| format!("loading port configs from {}", config.display()))?;
            let entry = match key {
                Some(key) => list
                    .find_by_key(key)
                    .map(|(_, entry)| entry)
                    .with_context(|| format!("no port config with key {}", key))?,
                None => list
                    .ranked()
                    .first()
                    .and_then(|index| list.get(*index))
                    .context("port config list is empty")?,
            };
            let publisher = StatusPublisher::default();
            let status = publisher.adopt(entry)?;
            print(cli.json, status.as_ref())
        }
    }
}
