// CLI modules
mod cli;

use clap::{Parser, Subcommand};
use cli::ops::open::{write_payload, OpenOutput};
use cli::{args::Args, op::Op, Address, Demo, Init, Inspect, Keygen, Open, Seal, Version};

use multiseal::{AppConfig, AppState};

command_enum! {
    (Init, Init),
    (Keygen, Keygen),
    (Address, Address),
    (Seal, Seal),
    (Open, Open),
    (Inspect, Inspect),
    (Demo, Demo),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Logging follows the state's config when there is one
    let config = AppState::load(args.config_path.clone())
        .map(|state| state.config)
        .unwrap_or_else(|_| AppConfig::default());
    let guards = multiseal::init_logging(&config);

    let ctx = cli::op::OpContext::new(args.config_path);

    match args.command.execute(&ctx).await {
        // Opened payloads go to stdout byte for byte
        Ok(OpOutput::Open(OpenOutput::Payload(payload))) => {
            if let Err(e) = write_payload(&mut std::io::stdout().lock(), &payload) {
                eprintln!("Error: failed to write payload: {}", e);
                drop(guards);
                std::process::exit(1);
            }
        }
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {}", e);
            drop(guards);
            std::process::exit(1);
        }
    }
}
