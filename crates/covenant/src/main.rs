//! Covenant CLI.
//!
//! Fetches a running service's OpenAPI document and checks captured payloads
//! against the schemas it declares.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use covenant_fetch::{FetchConfig, SpecFetcher};
use covenant_spec::{OpenApiDocument, SpecIndex};
use covenant_telemetry::{LogFormat, TelemetryConfig};
use covenant_validator::{ContractValidator, Verdict};

#[derive(Parser, Debug)]
#[command(
    name = "covenant",
    about = "Contract checks for a live service against its OpenAPI document",
    version
)]
struct Cli {
    /// Log level (overridden by RUST_LOG).
    #[arg(long, global = true, env = "COVENANT_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Log format (pretty or json).
    #[arg(long, global = true, env = "COVENANT_LOG_FORMAT", default_value = "pretty")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

/// Where the service lives. Flags win over the config file.
#[derive(Args, Debug, Default)]
struct Target {
    /// YAML or JSON file with serverUrl, timeout, openApiEndpoint, healthEndpoint.
    #[arg(long, env = "COVENANT_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the service (default: http://localhost:3000).
    #[arg(long, env = "COVENANT_SERVER_URL")]
    server_url: Option<String>,

    /// Timeout for each call, in milliseconds (default: 10000).
    #[arg(long, env = "COVENANT_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Path of the OpenAPI document (default: /api/openapi.json).
    #[arg(long, env = "COVENANT_OPENAPI_ENDPOINT")]
    openapi_endpoint: Option<String>,

    /// Path of the health probe (default: /health).
    #[arg(long, env = "COVENANT_HEALTH_ENDPOINT")]
    health_endpoint: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch the document and list its operations.
    Inspect {
        #[command(flatten)]
        target: Target,
    },

    /// Check a JSON payload against the documented schema.
    ///
    /// With --status the body is checked as a response, without it as a
    /// request body.
    Validate {
        #[command(flatten)]
        target: Target,

        /// Documented path template, e.g. /api/events/{id}.
        #[arg(long)]
        path: String,

        /// HTTP method.
        #[arg(long)]
        method: String,

        /// Response status code.
        #[arg(long)]
        status: Option<u16>,

        /// File holding the JSON body, or "-" for stdin.
        #[arg(long)]
        body: String,

        /// Output format (text or json).
        #[arg(long, default_value = "text")]
        format: String,
    },
}

impl Target {
    fn resolve(&self) -> anyhow::Result<FetchConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                FetchConfig::from_yaml_str(&raw)?
            }
            None => FetchConfig::default(),
        };

        if let Some(url) = &self.server_url {
            config = config.with_server_url(url);
        }
        if let Some(ms) = self.timeout_ms {
            config = config.with_timeout(Duration::from_millis(ms));
        }
        if let Some(endpoint) = &self.openapi_endpoint {
            config = config.with_openapi_endpoint(endpoint);
        }
        if let Some(endpoint) = &self.health_endpoint {
            config = config.with_health_endpoint(endpoint);
        }
        Ok(config)
    }
}

async fn fetch_document(target: &Target) -> anyhow::Result<OpenApiDocument> {
    let config = target.resolve()?;
    tracing::debug!(
        server_url = %config.server_url,
        timeout_ms = config.timeout.as_millis() as u64,
        "resolved target"
    );
    let fetcher = SpecFetcher::new(config)?;
    Ok(fetcher.fetch().await?)
}

/// Title line plus one `METHOD path (operationId) [codes]` line per operation.
fn render_inventory(index: &SpecIndex) -> String {
    let document = index.document();
    let info = document.info();
    let mut out = format!(
        "{} v{} (OpenAPI {})\n",
        info.title.as_deref().unwrap_or("untitled"),
        info.version.as_deref().unwrap_or("?"),
        document.spec_version().unwrap_or("?"),
    );

    for op in index.operations() {
        let codes: Vec<String> = op
            .declared_status_codes()
            .iter()
            .map(u16::to_string)
            .collect();
        out.push_str(&format!(
            "  {:<7} {} ({}) [{}]\n",
            op.method(),
            op.path(),
            op.operation_id().unwrap_or("-"),
            codes.join(", ")
        ));
    }
    out
}

async fn run_inspect(target: &Target) -> anyhow::Result<ExitCode> {
    let document = fetch_document(target).await?;
    let index = SpecIndex::new(Arc::new(document));
    print!("{}", render_inventory(&index));
    Ok(ExitCode::SUCCESS)
}

fn read_body(source: &str) -> anyhow::Result<Value> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read body from stdin")?;
        buf
    } else {
        std::fs::read_to_string(Path::new(source))
            .with_context(|| format!("failed to read body {source}"))?
    };
    serde_json::from_str(&raw).context("body is not valid JSON")
}

fn check_payload(
    validator: &ContractValidator,
    path: &str,
    method: &str,
    status: Option<u16>,
    body: &Value,
) -> anyhow::Result<Verdict> {
    let verdict = match status {
        Some(status) => validator.validate_response(path, method, status, body)?,
        None => validator.validate_request(path, method, body)?,
    };
    Ok(verdict)
}

fn render_verdict(verdict: &Verdict, label: &str) -> String {
    match (&verdict.note, verdict.valid) {
        (Some(note), _) => format!("ok: {label} not checked ({note})"),
        (None, true) => format!("ok: {label} matches its schema"),
        (None, false) => format!("mismatch: {label}\n{}", verdict.describe()),
    }
}

async fn run_validate(
    target: &Target,
    path: &str,
    method: &str,
    status: Option<u16>,
    body: &str,
    format: &str,
) -> anyhow::Result<ExitCode> {
    if format != "text" && format != "json" {
        bail!("unknown output format '{format}' (expected text or json)");
    }

    let body = read_body(body)?;
    let document = fetch_document(target).await?;
    let validator = ContractValidator::new(Arc::new(document));
    let verdict = check_payload(&validator, path, method, status, &body)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        let label = match status {
            Some(status) => format!("{} {} ({status})", method.to_uppercase(), path),
            None => format!("{} {} request", method.to_uppercase(), path),
        };
        println!("{}", render_verdict(&verdict, &label));
    }

    Ok(if verdict.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn init_telemetry(cli: &Cli) -> anyhow::Result<()> {
    let Some(format) = LogFormat::parse(&cli.log_format) else {
        bail!("unknown log format '{}' (expected pretty or json)", cli.log_format);
    };
    let config = TelemetryConfig::new()
        .with_log_level(&cli.log_level)
        .with_log_format(format);
    covenant_telemetry::init_logging(&config)?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_telemetry(&cli) {
        eprintln!("error: {e:#}");
        return ExitCode::from(1);
    }

    let result = match &cli.command {
        Commands::Inspect { target } => run_inspect(target).await,
        Commands::Validate {
            target,
            path,
            method,
            status,
            body,
            format,
        } => run_validate(target, path, method, *status, body, format).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
