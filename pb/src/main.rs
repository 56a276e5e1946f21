//! PalaceBuilder - memory palace task tracker
//!
//! CLI entry point for the HTTP server and one-shot maintenance commands.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use eyre::{Context, Result};
use tracing::{debug, info};

use palacebuilder::cli::{Cli, Command, generate_after_help, get_log_path};
use palacebuilder::config::Config;
use palacebuilder::media::MediaStore;
use palacebuilder::palace::{PalaceGenerator, build_layer_mask, encode_png};
use palacebuilder::planning::TaskDecomposer;
use palacebuilder::prompts::PromptLoader;
use palacebuilder::server::{AppState, build_router, serve};
use palacebuilder::state::StateManager;
use palacebuilder::worker::WorkerPool;
use palacebuilder::{imagegen, llm};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Logging isn't initialized yet, so nothing here can log
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let defaults = Config::default();
    let cmd = Cli::command().after_help(generate_after_help(&[
        &defaults.llm.api_key_env,
        &defaults.image.api_key_env,
    ]));
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Log level comes from the config file before the full load
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Serve { bind } => cmd_serve(&config, bind).await,
        Command::Decompose { text } => cmd_decompose(&config, &text).await,
        Command::Render { task } => cmd_render(&config, task).await,
        Command::Mask {
            total,
            completed,
            out,
            width,
            height,
        } => cmd_mask(&config, total, &completed, &out, width, height),
    }
}

fn build_generator(
    config: &Config,
    state: StateManager,
    media: MediaStore,
    prompts: Arc<PromptLoader>,
) -> Result<PalaceGenerator> {
    let images = imagegen::create_client(&config.image).context("Failed to create image client")?;
    Ok(PalaceGenerator::new(
        state,
        images,
        media,
        prompts,
        config.image.size,
        config.palace.clone(),
    ))
}

/// Run the HTTP server and palace workers until shutdown
async fn cmd_serve(config: &Config, bind: Option<String>) -> Result<()> {
    debug!(?bind, "cmd_serve: called");
    config.validate()?;

    let state = StateManager::spawn(&config.storage.db_path).context("Failed to open database")?;
    let prompts = Arc::new(PromptLoader::from_default_dirs());

    let llm = llm::create_client(&config.llm).context("Failed to create LLM client")?;
    let decomposer = Arc::new(TaskDecomposer::new(
        llm,
        prompts.clone(),
        config.llm.max_tokens,
        config.llm.temperature,
    ));

    let media = MediaStore::new(&config.storage.media_dir);
    let generator = Arc::new(build_generator(config, state.clone(), media.clone(), prompts)?);
    let (queue, pool) = WorkerPool::start(generator, config.workers.count, config.workers.queue_capacity);

    let app = AppState {
        state: state.clone(),
        decomposer,
        queue,
        media,
    };

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .context(format!("Failed to bind {}", bind))?;
    println!("PalaceBuilder listening on http://{}", bind);

    serve(listener, build_router(app)).await.context("HTTP server failed")?;

    // The router held the last queue handle; workers drain and exit
    pool.join().await;
    state.shutdown().await?;
    info!("PalaceBuilder stopped");
    Ok(())
}

/// Print the decomposition of a task description
async fn cmd_decompose(config: &Config, text: &str) -> Result<()> {
    debug!(%text, "cmd_decompose: called");
    let llm = llm::create_client(&config.llm).context("Failed to create LLM client")?;
    let decomposer = TaskDecomposer::new(
        llm,
        Arc::new(PromptLoader::from_default_dirs()),
        config.llm.max_tokens,
        config.llm.temperature,
    );

    let decomposition = decomposer.analyze(text).await;
    println!("{}", serde_json::to_string_pretty(&decomposition)?);
    Ok(())
}

/// Render one task's palace synchronously
async fn cmd_render(config: &Config, task_id: i64) -> Result<()> {
    debug!(task_id, "cmd_render: called");
    let state = StateManager::spawn(&config.storage.db_path).context("Failed to open database")?;
    let generator = build_generator(
        config,
        state.clone(),
        MediaStore::new(&config.storage.media_dir),
        Arc::new(PromptLoader::from_default_dirs()),
    )?;

    let outcome = generator.generate_palace_image(task_id).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    state.shutdown().await?;
    Ok(())
}

/// Write a mask PNG
fn cmd_mask(config: &Config, total: usize, completed: &[i64], out: &Path, width: u32, height: u32) -> Result<()> {
    debug!(total, ?completed, ?out, width, height, "cmd_mask: called");
    let mask = build_layer_mask(completed, total, width, height, config.palace.blur_sigma);
    let png = encode_png(mask)?;
    fs::write(out, png).context(format!("Failed to write {}", out.display()))?;
    println!("Wrote {}", out.display());
    Ok(())
}
