use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "service-broker")]
#[command(about = "A service broker speaking the v2 service-lifecycle protocol")]
pub struct CliArgs {
    #[arg(long, short, default_value = "broker.toml", help = "Broker options file (.toml or .json)")]
    pub config: PathBuf,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}
