//! CLI entrypoint for Policy Council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use council_application::{
    GateMode, NoProgress, RunStore, RunWorkflowUseCase, WorkflowParams, WorkflowProgress,
};
use council_domain::{NegotiationEngine, Negotiator, RunStatus};
use council_infrastructure::{
    ChatGateway, ChatGatewayConfig, ConfigLoader, FileConfig, FileRunStore, PolicyToolExecutor,
};
use council_presentation::{
    Cli, Command, ConsoleFormatter, OutputFormat, ProgressReporter, RunArgs, load_issue_file,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize logging based on verbosity level, optionally teeing into a file
fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "policy-council.log".into());
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.verbose, cli.log_file.as_deref());

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    info!("Starting Policy Council");

    let config = ConfigLoader::load(cli.config.as_deref())
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;
    let store = FileRunStore::new(&config.storage.artifacts_dir);

    let Some(command) = cli.command else {
        bail!("No command given. Try `policy-council run --help`.");
    };

    match command {
        Command::Run(args) => run(&config, store, &args, cli.quiet).await,
        Command::Runs => {
            print!("{}", ConsoleFormatter::format_run_list(&store.list_runs()?));
            Ok(())
        }
        Command::Show {
            run_id,
            output,
            trace,
        } => {
            let state = store
                .load_state(&run_id)
                .with_context(|| format!("Could not load run {}", run_id))?;
            println!("{}", render(&state, output));
            if trace {
                println!("{}", ConsoleFormatter::format_trace(&store.load_trace(&run_id)?));
            }
            Ok(())
        }
        Command::Delete { run_id } => {
            store
                .delete_run(&run_id)
                .with_context(|| format!("Could not delete run {}", run_id))?;
            println!("Deleted {}", run_id);
            Ok(())
        }
        Command::Negotiate { issue, max_rounds } => {
            let (issue, _) = load_issue_file(&issue)?;
            let outcome = NegotiationEngine::new(Negotiator::departments())
                .with_max_rounds(max_rounds)
                .run(&issue.id, &issue.dimensions)?;
            println!("{}", ConsoleFormatter::format_negotiation(&outcome));
            Ok(())
        }
    }
}

fn render(state: &council_domain::SharedState, output: OutputFormat) -> String {
    match output {
        OutputFormat::Full => ConsoleFormatter::format(state),
        OutputFormat::Summary => ConsoleFormatter::format_summary(state),
        OutputFormat::Json => ConsoleFormatter::format_json(state),
    }
}

/// Workflow parameters from the config file, overridden by command-line flags
fn workflow_params(config: &FileConfig, args: &RunArgs) -> Result<WorkflowParams> {
    let mut params = config.workflow_params()?;
    if let Some(seed) = args.seed {
        params = params.with_seed(Some(seed));
    }
    if let Some(max_rounds) = args.max_rounds {
        params = params.with_max_rounds(max_rounds);
    }
    if args.advisory {
        params = params.with_gate_mode(GateMode::Advisory);
    }
    params.validate()?;
    Ok(params)
}

async fn run(config: &FileConfig, store: FileRunStore, args: &RunArgs, quiet: bool) -> Result<()> {
    let input = args.to_input()?;
    let params = workflow_params(config, args)?;

    // === Dependency Injection ===
    let tools = Arc::new(PolicyToolExecutor::new());
    let gateway = ChatGateway::new(ChatGatewayConfig::from_file_config(&config.llm)?)?
        .with_tools(tools.clone());

    let reporter = (!quiet).then(|| Arc::new(ProgressReporter::new()));
    let progress: Arc<dyn WorkflowProgress> = match &reporter {
        Some(reporter) => reporter.clone(),
        None => Arc::new(NoProgress),
    };

    if !quiet {
        println!();
        println!("+============================================================+");
        println!("|           Policy Council                                   |");
        println!("+============================================================+");
        println!();
        println!("Issue: {}", input.issue.title);
        println!(
            "Models: {} (departments), {} (decider)",
            params.default_model, params.decider_model
        );
        println!();
    }

    let use_case = RunWorkflowUseCase::new(Arc::new(gateway))
        .with_tools(tools)
        .with_run_store(Arc::new(store))
        .with_progress(progress)
        .with_params(params);

    let state = use_case.execute(input).await?;
    if let Some(reporter) = &reporter {
        reporter.finish();
    }

    println!("{}", render(&state, args.output));

    if state.run_status == RunStatus::Failed {
        bail!(
            "Run {} failed: {}",
            state.run_id,
            state.error_message.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
