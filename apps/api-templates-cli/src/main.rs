mod logging;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use api_templates::config::StorageKind;
use api_templates::{ApiTemplatesConfig, ApiTemplatesModule, RequestInput};
use api_templates_sdk::SecretString;
use clap::{Parser, Subcommand};

/// Resolve tenant API configurations and compile request templates.
#[derive(Parser)]
#[command(name = "api-templates-cli")]
#[command(version)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the configuration, build the catalog and print a summary
    Check,
    /// Resolve the configuration of an API for a tenant credential
    Resolve {
        /// Tenant credential
        #[arg(long, env = CREDENTIAL_ENV, hide_env_values = true)]
        credential: String,
        #[arg(long = "api")]
        api_name: String,
    },
    /// Resolve, look up a template and compile it against JSON input
    Compile {
        /// Tenant credential
        #[arg(long, env = CREDENTIAL_ENV, hide_env_values = true)]
        credential: String,
        #[arg(long = "api")]
        api_name: String,
        #[arg(long = "template")]
        template_name: String,
        /// JSON object with the runtime input
        #[arg(long, default_value = "{}")]
        input: String,
    },
    /// Write the configured catalog into the database
    Import,
}

/// Keeps the tenant credential out of argv and shell history.
const CREDENTIAL_ENV: &str = "API_TEMPLATES_CREDENTIAL";

fn verbosity_level(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

fn load_config(cli: &Cli) -> Result<ApiTemplatesConfig> {
    if let Some(path) = cli.config.as_deref()
        && !Path::new(path).is_file()
    {
        bail!("config file does not exist: {}", path.display());
    }

    // defaults -> YAML -> env (API_TEMPLATES__*) -> CLI overrides
    let mut figment = ApiTemplatesConfig::figment(cli.config.as_deref());
    if let Some(level) = verbosity_level(cli.verbose) {
        figment = figment.merge(("logging.level", level));
    }
    ApiTemplatesConfig::from_sources(&figment, cli.config.as_deref())
}

fn parse_input(raw: &str) -> Result<RequestInput> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("--input is not valid JSON")?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => bail!("--input must be a JSON object"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    logging::init(&config.logging);

    tracing::info!(storage = ?config.storage.kind, "api-templates-cli starting");

    match cli.command {
        Commands::Check => {
            let module = ApiTemplatesModule::init(&config).await?;
            check(&module).await
        }
        Commands::Resolve {
            credential,
            api_name,
        } => {
            let module = ApiTemplatesModule::init(&config).await?;
            let resolved = module
                .client()
                .resolve_configuration(&SecretString::new(credential), &api_name)
                .await?;
            let out = serde_json::json!({
                "id": resolved.id,
                "tenant_id": resolved.tenant_id,
                "api_name": resolved.api_name,
                "base_url": resolved.base_url,
                "token": resolved.token.to_string(),
                "version": resolved.version,
                "timeout_seconds": resolved.timeout_seconds,
                "max_retries": resolved.max_retries,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        Commands::Compile {
            credential,
            api_name,
            template_name,
            input,
        } => {
            let input = parse_input(&input)?;
            let module = ApiTemplatesModule::init(&config).await?;
            let prepared = module
                .client()
                .prepare_request(
                    &SecretString::new(credential),
                    &api_name,
                    &template_name,
                    &input,
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&prepared)?);
            Ok(())
        }
        Commands::Import => {
            if config.storage.kind != StorageKind::Database {
                bail!("import requires storage.kind = database");
            }
            let catalog = std::mem::take(&mut config.catalog);
            let module = ApiTemplatesModule::init(&config).await?;
            let report = module.import_catalog(&catalog).await?;
            println!(
                "imported {} tenant(s), {} configuration(s), {} template(s); skipped {} existing tenant(s)",
                report.tenants, report.configurations, report.templates, report.skipped_tenants
            );
            Ok(())
        }
    }
}

async fn check(module: &ApiTemplatesModule) -> Result<()> {
    tracing::info!("Checking configuration...");
    let admin = module.admin_client();

    let tenants = admin.list_tenants().await?;
    let mut configurations = 0usize;
    let mut templates = 0usize;
    for tenant in &tenants {
        let configs = admin.list_configurations(tenant.id).await?;
        configurations += configs.len();
        for config in &configs {
            templates += admin.list_all_templates(config.id).await?.len();
        }
    }

    println!("Configuration is valid");
    println!(
        "tenants: {}, configurations: {configurations}, templates: {templates}",
        tenants.len()
    );
    Ok(())
}
