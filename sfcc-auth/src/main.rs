//! SFCC admin API Entry Point

use clap::Parser;
use sfcc_auth::cli::{hash_password, serve, Cli, Commands};
use sfcc_auth::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::HashPassword(args)) => match hash_password::execute(&args) {
            Ok(hash) => println!("{}", hash),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Some(Commands::Serve(args)) => {
            logging::init().expect("failed to initialize logging");
            run_server(args).await;
        }
        None => {
            // No subcommand - default to serve
            logging::init().expect("failed to initialize logging");
            run_server(serve::ServeArgs::default()).await;
        }
    }
}

async fn run_server(args: serve::ServeArgs) {
    if let Err(e) = serve::execute(&args).await {
        tracing::error!("Server failed: {}", e);
        std::process::exit(1);
    }
}
