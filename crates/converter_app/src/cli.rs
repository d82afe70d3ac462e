use std::path::PathBuf;

use clap::Parser;

use crate::logging::LogDestination;

/// Validate a media URL, convert it on the conversion service and fetch the result
#[derive(Debug, Parser)]
#[command(name = "converter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// URL to validate right away
    pub url: Option<String>,

    /// Base URL of the conversion service (empty means the local backend)
    #[arg(long, env = "CONVERTER_API_BASE")]
    pub base_url: Option<String>,

    /// Config file (default: ./converter.ron when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory downloaded files are saved to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Convert after validation, download on completion, then exit
    #[arg(long)]
    pub auto: bool,

    /// Where log records go
    #[arg(long, value_enum, default_value_t = LogDestination::File)]
    pub log: LogDestination,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}
