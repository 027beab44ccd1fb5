//! Showroom CLI
//!
//! Command-line client for the back-office API:
//! - Open a session
//! - List and filter the inventory, mark cars sold, delete cars
//! - Browse leads and update financing status
//! - Show the dashboard
//! - Generate a config file

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use reqwest::{Method, RequestBuilder};
use serde_json::{json, Value};
use std::path::PathBuf;

use showroom::config::generate_default_config;

#[derive(Parser)]
#[command(name = "showroom-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Client for the Showroom back-office API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8082", global = true)]
    pub api_url: String,

    /// Session token (default: $SHOWROOM_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open a session and print its token
    Login {
        email: String,
        access_key: String,
    },

    /// Show server health
    Status,

    /// List cars
    Cars {
        /// Substring of name or brand
        #[arg(short, long)]
        search: Option<String>,
        /// Exact brand
        #[arg(short, long)]
        brand: Option<String>,
        /// disponível, vendido or revisão
        #[arg(long)]
        status: Option<String>,
    },

    /// Mark a car as sold
    Sold { id: i64 },

    /// Delete a car
    Delete { id: i64 },

    /// List leads
    Leads {
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        car: Option<String>,
        #[arg(short, long)]
        phone: Option<String>,
        /// Oldest first
        #[arg(long)]
        asc: bool,
    },

    /// Show one lead
    Lead { id: i64 },

    /// Set a lead's financing status (pendente, aprovado, reprovado)
    Financing { id: i64, status: String },

    /// Show the dashboard
    Dashboard,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

struct ApiClient {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl ApiClient {
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base.trim_end_matches('/'), path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and decode the JSON body, turning API errors into their notice
    async fn send(&self, builder: RequestBuilder) -> anyhow::Result<Value> {
        let response = builder
            .send()
            .await
            .with_context(|| format!("cannot reach Showroom API at {}", self.base))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let error = &body["error"];
            let message = error["notice"]
                .as_str()
                .or_else(|| error["message"].as_str())
                .unwrap_or("request failed");
            if error["redirect"].is_string() {
                bail!("{} ({}): run `showroom-cli login` first", message, status);
            }
            bail!("{} ({})", message, status);
        }

        Ok(body)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let json_output = cli.format == "json";

    let client = ApiClient {
        http: reqwest::Client::new(),
        base: cli.api_url.clone(),
        token: cli.token.clone().or_else(|| std::env::var("SHOWROOM_TOKEN").ok()),
    };

    match cli.command {
        Commands::Login { email, access_key } => {
            let body = client
                .send(
                    client
                        .request(Method::POST, "/auth/v1/login")
                        .json(&json!({ "email": email, "access_key": access_key })),
                )
                .await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("Logged in as {}", body["email"].as_str().unwrap_or("-"));
                println!("Expires: {}", body["expires_at"].as_str().unwrap_or("-"));
                println!();
                println!(
                    "export SHOWROOM_TOKEN={}",
                    body["access_token"].as_str().unwrap_or_default()
                );
            }
        }

        Commands::Status => {
            let body = client.send(client.request(Method::GET, "/health")).await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("Showroom v{}", body["version"].as_str().unwrap_or("?"));
                println!();
                println!("Status: {}", body["status"].as_str().unwrap_or("?"));
                println!("  Record store: {}", body["record_store"].as_str().unwrap_or("?"));
                println!("  Object store: {}", body["object_store"].as_str().unwrap_or("?"));
                println!("  Agent webhook: {}", body["agent_webhook"].as_str().unwrap_or("?"));
                println!(
                    "  Realtime connections: {}",
                    body["realtime_connections"].as_u64().unwrap_or(0)
                );
                println!();
                println!(
                    "Uptime: {}",
                    format_duration(body["uptime_seconds"].as_u64().unwrap_or(0))
                );
            }
        }

        Commands::Cars {
            search,
            brand,
            status,
        } => {
            let query = query_string(&[
                ("search", search.as_deref()),
                ("brand", brand.as_deref()),
                ("status", status.as_deref()),
            ]);
            let body = client
                .send(client.request(Method::GET, &format!("/api/v1/cars{}", query)))
                .await?;
            print_cars(&body, json_output)?;
        }

        Commands::Sold { id } => {
            let body = client
                .send(client.request(Method::POST, &format!("/api/v1/cars/{}/sold", id)))
                .await?;
            print_cars(&body, json_output)?;
        }

        Commands::Delete { id } => {
            let body = client
                .send(client.request(Method::DELETE, &format!("/api/v1/cars/{}", id)))
                .await?;
            print_cars(&body, json_output)?;
        }

        Commands::Leads {
            name,
            car,
            phone,
            asc,
        } => {
            let query = query_string(&[
                ("name", name.as_deref()),
                ("car", car.as_deref()),
                ("phone", phone.as_deref()),
                ("order", asc.then_some("asc")),
            ]);
            let body = client
                .send(client.request(Method::GET, &format!("/api/v1/leads{}", query)))
                .await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                print_leads(&body);
            }
        }

        Commands::Lead { id } => {
            let body = client
                .send(client.request(Method::GET, &format!("/api/v1/leads/{}", id)))
                .await?;
            print_lead(&body, json_output)?;
        }

        Commands::Financing { id, status } => {
            let body = client
                .send(
                    client
                        .request(Method::PATCH, &format!("/api/v1/leads/{}/financing", id))
                        .json(&json!({ "status": status })),
                )
                .await?;
            print_lead(&body, json_output)?;
        }

        Commands::Dashboard => {
            let body = client
                .send(client.request(Method::GET, "/api/v1/dashboard"))
                .await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                print_dashboard(&body);
            }
        }

        Commands::Config { output } => {
            let config = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, &config)
                        .with_context(|| format!("writing {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn query_string(params: &[(&str, Option<&str>)]) -> String {
    let pairs: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| {
            value
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}={}", key, urlencoding::encode(v)))
        })
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value[key].as_str().unwrap_or("-")
}

fn print_cars(body: &Value, json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(body)?);
        return Ok(());
    }

    if let Some(notice) = body["notice"].as_str() {
        println!("{}", notice);
        println!();
    }

    let cars = body["cars"].as_array().cloned().unwrap_or_default();
    if cars.is_empty() {
        println!("No cars match.");
        return Ok(());
    }

    println!(
        "{:<6} {:<28} {:<14} {:<6} {:>12} {:<11} {:>7}",
        "ID", "Name", "Brand", "Year", "Price", "Status", "Visits"
    );
    println!("{}", "-".repeat(90));
    for car in &cars {
        println!(
            "{:<6} {:<28} {:<14} {:<6} {:>12.2} {:<11} {:>7}",
            car["id"].as_i64().unwrap_or(0),
            text(car, "name"),
            text(car, "brand"),
            car["year"].as_i64().unwrap_or(0),
            car["price"].as_f64().unwrap_or(0.0),
            text(car, "status"),
            car["visits"].as_i64().unwrap_or(0),
        );
    }
    println!();
    println!(
        "{} of {} cars",
        cars.len(),
        body["total"].as_u64().unwrap_or(cars.len() as u64)
    );
    Ok(())
}

fn print_leads(body: &Value) {
    let leads = body["leads"].as_array().cloned().unwrap_or_default();
    if leads.is_empty() {
        println!("No leads match.");
        return;
    }

    println!(
        "{:<6} {:<24} {:<20} {:<18} {:<10} {}",
        "ID", "Name", "Car", "Phone", "Financing", "Created"
    );
    println!("{}", "-".repeat(100));
    for lead in &leads {
        println!(
            "{:<6} {:<24} {:<20} {:<18} {:<10} {}",
            lead["id"].as_i64().unwrap_or(0),
            text(lead, "name"),
            text(lead, "car_of_interest"),
            text(lead, "phone"),
            text(lead, "financing_status"),
            text(lead, "created_at"),
        );
    }
    println!();
    println!(
        "{} of {} leads",
        leads.len(),
        body["total"].as_u64().unwrap_or(leads.len() as u64)
    );
}

fn print_lead(body: &Value, json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(body)?);
        return Ok(());
    }

    if let Some(notice) = body["notice"].as_str() {
        println!("{}", notice);
        println!();
    }

    let lead = &body["lead"];
    println!("Lead #{}", lead["id"].as_i64().unwrap_or(0));
    for (label, key) in [
        ("Name", "name"),
        ("Car", "car_of_interest"),
        ("Phone", "phone"),
        ("Email", "email"),
        ("Financing", "financing_status"),
        ("Created", "created_at"),
        ("Summary", "summary"),
        ("Notes", "notes"),
    ] {
        println!("  {:<10} {}", label, text(lead, key));
    }
    Ok(())
}

fn print_dashboard(body: &Value) {
    println!("Available cars:  {}", body["available_cars"].as_u64().unwrap_or(0));
    println!("Total inquiries: {}", body["total_inquiries"].as_i64().unwrap_or(0));
    println!("Most visited:    {}", text(body, "top_car"));
    println!();

    let leads = &body["leads"];
    println!(
        "Leads: {} total, {} pending, {} approved, {} rejected",
        leads["total"].as_u64().unwrap_or(0),
        leads["pending"].as_u64().unwrap_or(0),
        leads["approved"].as_u64().unwrap_or(0),
        leads["rejected"].as_u64().unwrap_or(0),
    );

    let labels = body["chart"]["labels"].as_array().cloned().unwrap_or_default();
    let visits = body["chart"]["datasets"][0]["data"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    if labels.is_empty() {
        return;
    }

    println!();
    println!("Visits:");
    let max = visits.iter().filter_map(Value::as_i64).max().unwrap_or(0).max(1);
    for (label, count) in labels.iter().zip(visits.iter()) {
        let count = count.as_i64().unwrap_or(0);
        let bar = "#".repeat(((count * 30) / max) as usize);
        println!("  {:<24} {:>6} {}", label.as_str().unwrap_or("-"), count, bar);
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}
