mod config;
mod mysql;
mod render;
mod repl;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use quorum::oracle::{CohereOracle, GeminiOracle, GptOracle};
use quorum::schema::{SchemaCache, SchemaSource};
use quorum::{
    AutoApprove, AutoDeny, ConsensusMode, Engine, Operator, Oracle, OracleAdapter, OraclePanel,
    SchemaDescription, Session,
};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use config::{AppConfig, CliOverrides};
use mysql::{MySqlExecutor, MySqlIntrospector};
use repl::Terminal;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Natural-language SQL for MySQL by oracle consensus", long_about = None)]
struct Args {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// MySQL connection URL (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Schema cache file (overrides QUORUM_SCHEMA_CACHE)
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Consensus mode: base, fast or simple (asked interactively when omitted)
    #[arg(long)]
    mode: Option<ConsensusMode>,

    /// Run a single query non-interactively and exit
    #[arg(long)]
    query: Option<String>,

    /// Approve confirmations automatically in --query mode
    #[arg(long, default_value_t = false)]
    yes: bool,

    /// Introspect the database even if a cache file exists
    #[arg(long, default_value_t = false)]
    refresh_schema: bool,
}

fn adapter(oracle: impl Oracle + 'static, timeout: Duration) -> OracleAdapter {
    OracleAdapter::new(Arc::new(oracle)).with_timeout(timeout)
}

/// gpt is the primary; cohere and gemini are peers, in tie-break order.
fn build_panel(config: &AppConfig) -> Result<OraclePanel> {
    let gpt = GptOracle::new(&config.gpt.api_key, &config.gpt.model)?;
    let cohere = CohereOracle::new(&config.cohere.api_key, &config.cohere.model)?;
    let gemini = GeminiOracle::new(&config.gemini.api_key, &config.gemini.model)?;

    let timeout = config.oracle_timeout;
    Ok(OraclePanel::new(
        adapter(gpt, timeout),
        [adapter(cohere, timeout), adapter(gemini, timeout)],
    ))
}

async fn load_schema(
    cache: &SchemaCache,
    introspector: &MySqlIntrospector,
    refresh: bool,
) -> SchemaDescription {
    let loaded = if refresh {
        cache
            .refresh(introspector)
            .await
            .map(|schema| (schema, SchemaSource::Live))
    } else {
        cache.load_or_introspect(introspector).await
    };

    match loaded {
        Ok((schema, source)) => {
            info!(
                source = ?source,
                databases = schema.databases().len(),
                tables = schema.table_count(),
                "Schema loaded"
            );
            schema
        }
        Err(e) => {
            warn!(
                error = %e,
                path = %cache.path().display(),
                "Schema unavailable, continuing without it"
            );
            SchemaDescription::new()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load(
        CliOverrides {
            database_url: args.database_url,
            schema_cache: args.cache,
            mode: args.mode,
        },
        args.config.as_deref(),
    )
    .context("Failed to load configuration")?;

    let panel = build_panel(&config).context("Failed to initialise oracles")?;

    let pool = mysql::connect(&config.database_url)
        .await
        .context("Failed to connect to MySQL")?;
    let executor = Arc::new(MySqlExecutor::new(pool.clone()));
    let introspector = MySqlIntrospector::new(pool);

    let cache = SchemaCache::new(&config.schema_cache);
    let schema = load_schema(&cache, &introspector, args.refresh_schema).await;
    let engine = Engine::new(panel, executor);

    if let Some(query) = args.query {
        let mode = config.mode.unwrap_or(ConsensusMode::Fast);
        let session = Session::new(schema, mode);
        let operator: &dyn Operator = if args.yes { &AutoApprove } else { &AutoDeny };

        let span = info_span!("command", id = %Uuid::new_v4(), mode = %mode);
        let outcome = engine.handle(&session, &query, operator).instrument(span).await;
        if let Some(text) = render::outcome(&outcome) {
            println!("{text}");
        }
        if !outcome.is_success() {
            bail!("query did not complete");
        }
        return Ok(());
    }

    let terminal = Terminal::stdio();
    terminal.say("Welcome to the quorum SQL shell for MySQL!");
    let mode = match config.mode {
        Some(mode) => mode,
        None => match repl::select_mode(&terminal) {
            Some(mode) => mode,
            None => return Ok(()),
        },
    };
    let mut session = Session::new(schema, mode);
    info!(mode = %session.mode(), oracles = ?engine.panel().ids(), "Session started");

    repl::run(&engine, &mut session, &terminal).await;
    Ok(())
}
