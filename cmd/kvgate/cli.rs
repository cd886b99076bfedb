use clap::Parser;

pub const VERSION_STRING: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(
    name = "kvgate",
    disable_version_flag = true,
    about = "storage gateway multiplexing SQL, remote and in-process key-value backends"
)]
pub struct Cli {
    #[arg(short = 'v', long = "version", help = "Print version and exit")]
    pub version: bool,
    #[arg(
        short = 'd',
        long = "daemon",
        help = "Run as daemon (accepted for compatibility; process supervision is external)"
    )]
    pub daemon: bool,
    #[arg(
        short = 'f',
        long = "config",
        value_name = "PATH",
        default_value = "./storage.conf",
        help = "Config file path"
    )]
    pub config: String,
}
