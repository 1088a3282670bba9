use std::net::IpAddr;
use std::path::PathBuf;

use axum::http::{HeaderName, HeaderValue};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use access_gate::config::{load_config, RuleConfig};
use access_gate::ranges::compile;
use access_gate::{AccessEngine, RequestInfo};

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Offline diagnostics for access-gate rule sets", long_about = None)]
struct Cli {
    /// Gate configuration file.
    #[arg(short, long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the configured rules for a synthetic request
    Check {
        /// Client address; omitted means the transport provided none
        #[arg(long)]
        ip: Option<IpAddr>,
        #[arg(long)]
        hostname: Option<String>,
        #[arg(long)]
        country: Option<String>,
        /// Request header as `name=value` (repeatable)
        #[arg(long = "header", value_parser = parse_header)]
        headers: Vec<(HeaderName, HeaderValue)>,
    },
    /// Print the compiled interval tables of IP-range rules
    Ranges {
        /// Only this rule
        #[arg(long)]
        rule: Option<String>,
    },
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))?;
    let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|e| e.to_string())?;
    let value = HeaderValue::from_str(value.trim()).map_err(|e| e.to_string())?;
    Ok((name, value))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Check {
            ip,
            hostname,
            country,
            headers,
        } => {
            let engine = AccessEngine::from_config(&config.rules)?;
            let request = headers.into_iter().fold(
                RequestInfo::new(ip)
                    .with_hostname(hostname)
                    .with_country(country),
                |request, (name, value)| request.with_header(name, value),
            );

            let decision = engine.evaluate(&request, &CancellationToken::new()).await?;
            let output = json!({
                "decision": decision,
                "rules": engine.pipeline().len(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Ranges { rule } => {
            let mut found = false;
            for rule_config in &config.rules {
                let RuleConfig::IpRange(ip_rule) = rule_config else {
                    continue;
                };
                if rule.as_deref().is_some_and(|wanted| wanted != ip_rule.name) {
                    continue;
                }
                found = true;

                let ranges = compile(&ip_rule.ranges);
                println!("# {} ({} skipped)", ip_rule.name, ranges.skipped());
                print!("{ranges}");
            }

            if !found {
                return Err(match rule {
                    Some(name) => format!("no ip_range rule named `{name}`").into(),
                    None => "configuration has no ip_range rules".into(),
                });
            }
        }
    }

    Ok(())
}
