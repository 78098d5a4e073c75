// crates/aiops-cli/src/main.rs
// ============================================================================
// Module: AIOps CLI Entry Point
// Description: Command dispatcher for serving the gateway, offline alert
//              ingestion, incident queries, and config validation.
// Purpose: One operator-facing binary wrapping the control plane's library
//          crates for local use and scripting.
// Dependencies: clap, aiops-config, aiops-core, aiops-gateway,
//               aiops-graph, aiops-orchestrator, aiops-store-sqlite, tokio.
// ============================================================================

//! ## Overview
//! `aiops` is a thin wrapper over the control plane's library crates: `serve`
//! starts the same HTTP API `aiops-gateway` runs, `ingest` and `incident`
//! exercise the store and graph directly for local testing and scripting
//! without standing up the server.

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use aiops_broker::ingest::normalize_alert;
use aiops_broker::AlertmanagerPayload;
use aiops_config::AiopsConfig;
use aiops_config::GraphBackend;
use aiops_core::GraphStore;
use aiops_core::Incident;
use aiops_core::IncidentId;
use aiops_core::Severity;
use aiops_graph::InMemoryGraphStore;
use aiops_graph::Neo4jGraphStore;
use aiops_store_sqlite::IncidentFilters;
use aiops_store_sqlite::SqliteIncidentStore;
use aiops_store_sqlite::SqliteStoreConfig;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use tracing_subscriber::EnvFilter;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "aiops", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = clap::ArgAction::SetTrue)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API (alert webhooks, incident queries, health, metrics).
    Serve(ServeArgs),
    /// Normalize and persist a single alert payload without starting a
    /// server, optionally running the full workflow inline.
    Ingest(IngestArgs),
    /// Incident store queries.
    Incident {
        #[command(subcommand)]
        command: IncidentCommand,
    },
    /// Configuration utilities.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Optional config file path (defaults to `aiops.toml` or `AIOPS_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct IngestArgs {
    /// Path to a JSON file shaped like the alertmanager webhook payload.
    #[arg(long, value_name = "PATH")]
    file: PathBuf,
    /// Alert source label stamped onto the created incident.
    #[arg(long, default_value = "manual")]
    source: String,
    /// Cluster name used when an alert carries no `cluster` label.
    #[arg(long, default_value = "local")]
    cluster: String,
    /// Run the full 12-step workflow against the ingested incident before
    /// exiting, instead of only persisting it.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    run_workflow: bool,
    /// Optional config file path (defaults to `aiops.toml` or `AIOPS_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum IncidentCommand {
    /// Fetch one incident by id.
    Get(IncidentGetArgs),
    /// List incidents, optionally filtered.
    List(IncidentListArgs),
    /// Fetch an incident's dependency graph neighborhood.
    Graph(IncidentGraphArgs),
}

#[derive(Args, Debug)]
struct IncidentGetArgs {
    /// Incident id.
    id: String,
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct IncidentListArgs {
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    severity: Option<String>,
    #[arg(long)]
    namespace: Option<String>,
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long)]
    offset: Option<usize>,
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct IncidentGraphArgs {
    /// Incident id.
    id: String,
    #[arg(long, default_value_t = 2)]
    depth: u32,
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file without starting any service.
    Validate(ConfigValidateArgs),
}

#[derive(Args, Debug)]
struct ConfigValidateArgs {
    /// Optional config file path (defaults to `aiops.toml` or `AIOPS_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// A CLI-level error with a human-readable message; callers print it to
/// stderr and exit non-zero rather than panicking.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct CliError(String);

impl CliError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

type CliResult<T> = Result<T, CliError>;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    if cli.show_version {
        write_stdout_line(env!("CARGO_PKG_VERSION"))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        let mut command = <Cli as clap::CommandFactory>::command();
        command.print_help().map_err(|err| CliError::new(err.to_string()))?;
        write_stdout_line("")?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(args) => command_serve(args).await,
        Commands::Ingest(args) => command_ingest(args).await,
        Commands::Incident { command } => command_incident(command).await,
        Commands::Config { command } => command_config(command),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

fn load_config(path: Option<&Path>) -> CliResult<AiopsConfig> {
    AiopsConfig::load(path).map_err(|err| CliError::new(format!("failed to load configuration: {err}")))
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

async fn command_serve(args: ServeArgs) -> CliResult<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    aiops_gateway::run(config).await.map_err(|err| CliError::new(format!("server error: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Ingest Command
// ============================================================================

async fn command_ingest(args: IngestArgs) -> CliResult<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    let bytes = std::fs::read(&args.file)
        .map_err(|err| CliError::new(format!("failed to read {}: {err}", args.file.display())))?;
    let payload: AlertmanagerPayload =
        serde_json::from_slice(&bytes).map_err(|err| CliError::new(format!("invalid alert payload: {err}")))?;

    let store = open_store(&config)?;

    let mut created: Vec<Incident> = Vec::new();
    for alert in &payload.alerts {
        let cluster = alert.labels.get("cluster").cloned().unwrap_or_else(|| args.cluster.clone());
        let incident = normalize_alert(alert, &args.source, &cluster);
        store
            .put_incident(&incident)
            .map_err(|err| CliError::new(format!("failed to persist incident: {err}")))?;
        created.push(incident);
    }

    if args.run_workflow {
        let graph: Arc<dyn GraphStore> = match config.graph.backend {
            GraphBackend::Neo4j => {
                let password = config
                    .graph
                    .read_password()
                    .map_err(|err| CliError::new(format!("failed to read graph password: {err}")))?;
                Arc::new(
                    Neo4jGraphStore::connect(&config.graph.uri, &config.graph.user, &password)
                        .await
                        .map_err(|err| CliError::new(format!("failed to connect to graph store: {err}")))?,
                )
            }
            GraphBackend::InMemory => Arc::new(InMemoryGraphStore::new()),
        };
        let deps = aiops_orchestrator::WorkflowDeps::new(config, graph, None)
            .map_err(|err| CliError::new(format!("failed to build workflow dependencies: {err}")))?;
        for incident in &created {
            aiops_orchestrator::run_workflow(&deps, &incident.id)
                .await
                .map_err(|err| CliError::new(format!("workflow failed for {}: {err}", incident.id.as_str())))?;
        }
    }

    let summary = serde_json::json!({
        "incidents_created": created.len(),
        "incident_ids": created.iter().map(|incident| incident.id.as_str()).collect::<Vec<_>>(),
    });
    write_stdout_line(&summary.to_string())?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Incident Commands
// ============================================================================

async fn command_incident(command: IncidentCommand) -> CliResult<ExitCode> {
    match command {
        IncidentCommand::Get(args) => command_incident_get(&args),
        IncidentCommand::List(args) => command_incident_list(&args),
        IncidentCommand::Graph(args) => command_incident_graph(&args).await,
    }
}

fn open_store(config: &AiopsConfig) -> CliResult<SqliteIncidentStore> {
    SqliteIncidentStore::open(&SqliteStoreConfig {
        path: config.store.path.clone(),
        busy_timeout_ms: config.store.busy_timeout_ms,
        journal_mode: aiops_store_sqlite::SqliteStoreMode::default(),
        sync_mode: match config.store.sync_mode {
            aiops_config::StoreSyncMode::Full => aiops_store_sqlite::SqliteSyncMode::Full,
            aiops_config::StoreSyncMode::Normal => aiops_store_sqlite::SqliteSyncMode::Normal,
        },
    })
    .map_err(|err| CliError::new(format!("failed to open incident store: {err}")))
}

fn command_incident_get(args: &IncidentGetArgs) -> CliResult<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    let store = open_store(&config)?;
    let incident = store
        .get_incident(&args.id)
        .map_err(|err| CliError::new(format!("failed to read incident: {err}")))?
        .ok_or_else(|| CliError::new(format!("no incident with id {}", args.id)))?;
    write_stdout_line(&serde_json::to_string_pretty(&incident).unwrap_or_default())?;
    Ok(ExitCode::SUCCESS)
}

fn command_incident_list(args: &IncidentListArgs) -> CliResult<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    let store = open_store(&config)?;
    let status = args
        .status
        .as_deref()
        .map(parse_status)
        .transpose()?;
    let severity = args.severity.as_deref().map(Severity::from_raw);
    let filters = IncidentFilters {
        status,
        severity,
        namespace: args.namespace.clone(),
        limit: args.limit,
        offset: args.offset,
    };
    let incidents =
        store.list_incidents(&filters).map_err(|err| CliError::new(format!("failed to list incidents: {err}")))?;
    write_stdout_line(&serde_json::to_string_pretty(&incidents).unwrap_or_default())?;
    Ok(ExitCode::SUCCESS)
}

fn parse_status(raw: &str) -> CliResult<aiops_core::IncidentStatus> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| CliError::new(format!("invalid status: {raw}")))
}

async fn command_incident_graph(args: &IncidentGraphArgs) -> CliResult<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    let store = open_store(&config)?;
    store
        .get_incident(&args.id)
        .map_err(|err| CliError::new(format!("failed to read incident: {err}")))?
        .ok_or_else(|| CliError::new(format!("no incident with id {}", args.id)))?;

    let graph: Arc<dyn GraphStore> = match config.graph.backend {
        GraphBackend::Neo4j => {
            let password = config
                .graph
                .read_password()
                .map_err(|err| CliError::new(format!("failed to read graph password: {err}")))?;
            Arc::new(
                Neo4jGraphStore::connect(&config.graph.uri, &config.graph.user, &password)
                    .await
                    .map_err(|err| CliError::new(format!("failed to connect to graph store: {err}")))?,
            )
        }
        GraphBackend::InMemory => Arc::new(InMemoryGraphStore::new()),
    };

    let incident_id = IncidentId::new(args.id.clone());
    let (entities, relations) = graph
        .neighborhood(&incident_id, args.depth)
        .await
        .map_err(|err| CliError::new(format!("failed to query graph: {err}")))?;
    let body = serde_json::json!({ "entities": entities, "relations": relations });
    write_stdout_line(&serde_json::to_string_pretty(&body).unwrap_or_default())?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(args) => command_config_validate(&args),
    }
}

fn command_config_validate(args: &ConfigValidateArgs) -> CliResult<ExitCode> {
    let _config = load_config(args.config.as_deref())?;
    write_stdout_line("configuration is valid")?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::new(err.to_string()))
}

fn emit_error(message: &str) -> ExitCode {
    let _ = writeln!(std::io::stderr(), "{message}");
    ExitCode::FAILURE
}
