//! Command line arguments.

use clap::Parser;

/// Server of the device trade-in system.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    ///
    /// A missing file is not an error: defaults and `CONF.` environment
    /// variables are used instead.
    #[arg(
        short,
        long,
        env = "TRADE_IN_CONFIG",
        default_value = "config.toml"
    )]
    pub config: String,

    /// Validates the configuration and exits without serving.
    #[arg(long)]
    pub check: bool,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// If the arguments are malformed, or `--help`/`--version` is requested.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}
