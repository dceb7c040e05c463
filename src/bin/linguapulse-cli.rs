use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "linguapulse-cli")]
#[command(about = "Operator CLI for the LinguaPulse payment service", long_about = None)]
struct Cli {
    /// Webhook endpoint, used by `pay`.
    #[arg(short, long, default_value = "http://localhost:8080/")]
    url: String,

    /// Base URL of the admin API.
    #[arg(short, long, default_value = "http://localhost:8080")]
    admin_url: String,

    /// Admin API key.
    #[arg(short, long, env = "ADMIN_API_KEY", hide_env_values = true)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Status,
    /// Show a user's subscription state
    User { telegram_id: i64 },
    /// Post a subscription payment to the webhook
    Pay { telegram_id: i64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let admin_url = cli.admin_url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let res = client
                .get(format!("{admin_url}/admin/status"))
                .headers(admin_headers(cli.key.as_deref())?)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::User { telegram_id } => {
            let res = client
                .get(format!("{admin_url}/admin/users/{telegram_id}"))
                .headers(admin_headers(cli.key.as_deref())?)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Pay { telegram_id } => {
            let res = client
                .post(&cli.url)
                .json(&json!({
                    "telegram_id": telegram_id,
                    "action": "process_subscription",
                }))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn admin_headers(key: Option<&str>) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let key = key.ok_or("admin key required: pass --key or set ADMIN_API_KEY")?;
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);
    Ok(headers)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        // Error bodies are JSON only for 500s.
        match serde_json::from_str::<Value>(&text) {
            Ok(json) => eprintln!("{}", serde_json::to_string_pretty(&json)?),
            Err(_) => eprintln!("Response: {}", text),
        }
        return Ok(());
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
