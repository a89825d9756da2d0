//! TeamPulse - team performance survey service
//!
//! Registers surveys, collects eight-dimension assessments over HTTP and
//! reports the aggregated results as JSON, text or a spreadsheet.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, config, storage, bind failure, etc.)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod registry;
mod report;
mod server;
mod store;
mod validation;

use anyhow::{Context, Result};
use cli::{Args, Command, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use models::SurveyId;
use registry::SurveyRegistry;
use report::{export_filename, export_survey, SummaryPresenter};
use server::{AppState, ServerSettings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if args.command() == Command::InitConfig {
        return handle_init_config();
    }

    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    info!("TeamPulse v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", config_source);
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args.command(), config).await {
        error!("Command failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle init-config: generate a default .teampulse.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize the bind address, database and logging.");
    Ok(())
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins; otherwise -v / -q, then `logging.level` from config.
fn init_logging(args: &Args, config: &Config) {
    let fallback = match args.log_level() {
        Some(level) => level.to_string().to_lowercase(),
        None => config.logging.level.clone(),
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if config.logging.json {
        tracing::subscriber::set_global_default(builder.json().finish())
            .expect("Failed to set tracing subscriber");
    } else {
        tracing::subscriber::set_global_default(builder.compact().finish())
            .expect("Failed to set tracing subscriber");
    }
}

/// Load configuration from --config, the default file, or defaults.
///
/// Returns the config and a description of where it came from.
fn load_config(args: &Args) -> Result<(Config, String)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, config_path.display().to_string()));
    }

    // Try default location
    match Config::load_default()? {
        Some(config) => Ok((config, DEFAULT_CONFIG_FILE.to_string())),
        None => Ok((Config::default(), "built-in defaults".to_string())),
    }
}

/// Dispatch one command.
async fn run(command: Command, config: Config) -> Result<()> {
    config.validate()?;

    match command {
        Command::Serve => serve(config).await,
        Command::Surveys => list_surveys(&config),
        Command::Summary { survey_id, format } => print_summary(&config, survey_id, format),
        Command::Export { survey_id, output } => write_export(&config, survey_id, output),
        Command::InitConfig => handle_init_config(),
    }
}

/// Run the HTTP server until Ctrl-C.
async fn serve(config: Config) -> Result<()> {
    let store = store::open(&config.storage.database)
        .with_context(|| format!("Failed to open database: {}", config.storage.database))?;
    info!("Using database: {}", config.storage.database);

    let state = AppState::new(Arc::from(store), ServerSettings::from_config(&config));
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(server::shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

fn list_surveys(config: &Config) -> Result<()> {
    let store = store::open(&config.storage.database)
        .with_context(|| format!("Failed to open database: {}", config.storage.database))?;
    let surveys = SurveyRegistry::new(store.as_ref()).list()?;

    if surveys.is_empty() {
        println!("No surveys registered.");
        return Ok(());
    }

    for survey in surveys {
        println!(
            "{}  {}  {:<8}  {}",
            survey.id,
            survey.created_at.format("%Y-%m-%d %H:%M"),
            if survey.active { "active" } else { "inactive" },
            survey.name
        );
    }
    Ok(())
}

fn print_summary(config: &Config, survey_id: String, format: OutputFormat) -> Result<()> {
    let store = store::open(&config.storage.database)
        .with_context(|| format!("Failed to open database: {}", config.storage.database))?;
    let registry = SurveyRegistry::new(store.as_ref());
    let id = SurveyId::from(survey_id);

    let summary = registry.summary(&id)?;
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)
                .context("Failed to serialize summary")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            let survey = registry.find(&id)?;
            let presenter = SummaryPresenter::new(config.export.decimal_places);
            print!("{}", presenter.render_markdown(survey.as_ref(), &summary));
        }
    }
    Ok(())
}

fn write_export(config: &Config, survey_id: String, output: Option<PathBuf>) -> Result<()> {
    let store = store::open(&config.storage.database)
        .with_context(|| format!("Failed to open database: {}", config.storage.database))?;
    let id = SurveyId::from(survey_id);

    let rows = SurveyRegistry::new(store.as_ref()).assessments(&id)?;
    let presenter = SummaryPresenter::new(config.export.decimal_places);
    let bytes = export_survey(&rows, &presenter)?;

    let path = output.unwrap_or_else(|| PathBuf::from(export_filename(&id)));
    std::fs::write(&path, &bytes)
        .with_context(|| format!("Failed to write export: {}", path.display()))?;

    info!("Exported {} assessments", rows.len());
    println!("✅ Export written to: {}", path.display());
    Ok(())
}
