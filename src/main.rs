use anyhow::{Context, Result};
use clap::Parser;
use email_append::{Client, ClientConfig, RequestParams, RetryMode};
use std::time::Duration;

/// email-append - look up an email address for a partial customer record
///
/// Sends the given identity fields to the append service and prints the
/// enriched result as JSON.
///
/// Examples:
///   email-append --api-key KEY --first Jane --last Doe --zip 94105
///   email-append --field d_email_md5=abc123
#[derive(Parser, Debug)]
#[command(author, version = env!("EMAIL_APPEND_VERSION"), about)]
struct Cli {
    /// API key, sent as the `k2` query parameter
    #[arg(long, env = "EMAIL_APPEND_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Service endpoint (defaults to the vendor endpoint)
    #[arg(long, env = "EMAIL_APPEND_BASE_URL", value_name = "URL")]
    base_url: Option<String>,

    /// Attempts per request
    #[arg(long, env = "EMAIL_APPEND_RETRIES", default_value_t = email_append::http::DEFAULT_RETRIES)]
    retries: usize,

    /// Seconds per backoff unit between failed attempts
    #[arg(long, value_name = "SECONDS", default_value_t = 1.0)]
    backoff: f64,

    /// Always run every attempt and use the last response
    #[arg(long)]
    exhaustive_retries: bool,

    /// Log raw responses (EMAIL_APPEND_DEBUG accepts 1/0, yes/no, on/off, true/false)
    #[arg(
        long,
        env = "EMAIL_APPEND_DEBUG",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    debug: bool,

    /// First name (d_first)
    #[arg(long)]
    first: Option<String>,

    /// Last name (d_last)
    #[arg(long)]
    last: Option<String>,

    /// Full street address (d_fulladdr)
    #[arg(long)]
    address: Option<String>,

    /// City (d_city)
    #[arg(long)]
    city: Option<String>,

    /// State (d_state)
    #[arg(long)]
    state: Option<String>,

    /// ZIP code (d_zip)
    #[arg(long)]
    zip: Option<String>,

    /// Any other vendor field
    #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
    fields: Vec<(String, String)>,
}

impl Cli {
    fn params(&self) -> RequestParams {
        let named = [
            ("d_first", &self.first),
            ("d_last", &self.last),
            ("d_fulladdr", &self.address),
            ("d_city", &self.city),
            ("d_state", &self.state),
            ("d_zip", &self.zip),
        ];

        let mut params: RequestParams = self.fields.iter().cloned().collect();
        for (key, value) in named {
            if let Some(value) = value {
                params.insert(key.to_string(), value.clone());
            }
        }
        params
    }

    fn config(&self) -> Result<ClientConfig> {
        let backoff = Duration::try_from_secs_f64(self.backoff)
            .with_context(|| format!("Invalid backoff '{}'", self.backoff))?;

        let mut config = ClientConfig::new(self.api_key.clone())
            .with_retries(self.retries)
            .with_backoff_unit(backoff)
            .with_debug(self.debug);
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if self.exhaustive_retries {
            config = config.with_retry_mode(RetryMode::Exhaustive);
        }
        Ok(config)
    }
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.debug { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let client = Client::new(cli.config()?)?;
    let result = client.append_email(cli.params()).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("Failed to encode result")?
    );
    Ok(())
}
