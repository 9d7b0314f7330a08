use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gatewayctl")]
#[command(about = "Management CLI for the service gateway admin API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8081")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show gateway status
    Status,
    /// List configured routes
    Routes,
    /// List services and their endpoints
    Services,
    /// Register an instance of a service
    Register { service: String, address: String },
    /// Remove an instance from a service
    Deregister { service: String, address: String },
    /// Mark an instance healthy or unhealthy
    Health {
        address: String,
        #[arg(action = clap::ArgAction::Set)]
        healthy: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Status => client.get(format!("{base}/admin/status")).send().await?,
        Commands::Routes => client.get(format!("{base}/admin/routes")).send().await?,
        Commands::Services => client.get(format!("{base}/admin/services")).send().await?,
        Commands::Register { service, address } => {
            client
                .post(format!("{base}/admin/services/{service}/instances"))
                .json(&json!({ "address": address }))
                .send()
                .await?
        }
        Commands::Deregister { service, address } => {
            client
                .delete(format!("{base}/admin/services/{service}/instances/{address}"))
                .send()
                .await?
        }
        Commands::Health { address, healthy } => {
            client
                .put(format!("{base}/admin/instances/{address}/health"))
                .json(&json!({ "healthy": healthy }))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {status}");
        if let Ok(text) = res.text().await {
            eprintln!("Response: {text}");
        }
        std::process::exit(1);
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{status}");
        return Ok(());
    }
    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
