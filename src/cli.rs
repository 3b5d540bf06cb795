use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::logfile::DEFAULT_LOG_FILE;

#[derive(Parser, Debug)]
#[command(name = "targetscan")]
#[command(version)]
#[command(
    about = "Expand configured targets and CIDR ranges, run nmap over them and log the results",
    long_about = None
)]
pub struct Cli {
    #[arg(
        short,
        long,
        default_value = DEFAULT_CONFIG_FILE,
        help = "JSON file with \"targets\" and \"ports\" arrays"
    )]
    pub config: PathBuf,

    #[arg(
        short,
        long,
        default_value = DEFAULT_LOG_FILE,
        help = "File that scan output is appended to"
    )]
    pub log_file: PathBuf,

    #[arg(
        short,
        long,
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Abort the scan after this many seconds"
    )]
    pub timeout: u64,

    #[arg(long, default_value = "nmap", help = "Path to the nmap binary")]
    pub nmap: PathBuf,

    #[arg(long, help = "Disable colored output")]
    pub no_color: bool,

    #[arg(short, long, help = "Enable verbose diagnostics")]
    pub verbose: bool,
}
