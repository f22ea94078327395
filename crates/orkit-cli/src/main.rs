use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "orkit")]
#[command(about = "Operations research solvers: LP, transportation, networks", long_about = None)]
struct Cli {
    /// Tracing filter, e.g. "debug" or "orkit_lp=trace"
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a linear program from a JSON request file
    Lp {
        /// File holding `{ "model": {...}, "method": "auto" }`
        file: PathBuf,
    },
    /// Solve a transportation problem from a JSON request file
    Transport {
        /// File holding `{ "method": "auto", "model": {...}, "options": {...} }`
        file: PathBuf,
    },
    /// Solve a network problem from a JSON request file
    Network {
        /// File holding `{ "method": "shortest_path", "model": {...} }`
        file: PathBuf,
    },
}

fn read_request(path: &PathBuf) -> serde_json::Value {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };
    match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Invalid JSON: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_response<T: serde::Serialize>(response: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(response)
            .unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {}\"}}", e))
    );
}

fn main() {
    let cli = Cli::parse();

    if let Some(filter) = &cli.log {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Lp { file } => {
            let request = read_request(&file);
            match orkit_lp::solve_request(&request) {
                Ok(response) => print_response(&response),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Transport { file } => {
            let request = read_request(&file);
            match orkit_transport::solve_transport(&request) {
                Ok(response) => print_response(&response),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Network { file } => {
            let request = read_request(&file);
            match orkit_network::solve_network(&request) {
                Ok(response) => print_response(&response),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
