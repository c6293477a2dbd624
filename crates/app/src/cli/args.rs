pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mseal")]
#[command(about = "Encrypt once, open by any of N secp256k1 recipients")]
#[command(version)]
pub struct Args {
    /// Path to the multiseal config directory (defaults to ~/.multiseal)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
