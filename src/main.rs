mod bootstrap;
mod cli;
mod render;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use sift_core::config::{Config, load_dotenv, resolve_config_path};
use sift_core::vault::EnvVaultProvider;
use sift_core::{Pipeline, PipelineError, Query};

use crate::cli::{AskArgs, Cli, Command};

fn init_subscriber(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_subscriber(cli.verbose);
    load_dotenv();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_path = resolve_config_path(cli.config.as_deref());
    let mut config = Config::load(&config_path)?;
    config.resolve_secrets(&EnvVaultProvider).await?;

    let embedding = Arc::new(bootstrap::create_embedding_provider(&config)?);
    let completion = Arc::new(bootstrap::create_completion_provider(&config)?);
    let index = bootstrap::create_index(&config).await?;
    let pipeline = Pipeline::from_config(&config, embedding, completion, index);

    match cli.command {
        Command::Ask(args) => ask(&pipeline, &config, args).await,
    }
}

async fn ask<E, C>(
    pipeline: &Pipeline<E, C>,
    config: &Config,
    args: AskArgs,
) -> anyhow::Result<ExitCode>
where
    E: sift_llm::LlmProvider,
    C: sift_llm::LlmProvider,
{
    let query = Query::new(args.query, args.top_k.unwrap_or(config.retrieval.top_k))
        .with_sources(args.sources);

    let outcome = match pipeline.answer_query(&query, args.answer).await {
        Ok(outcome) => outcome,
        Err(e @ PipelineError::InvalidQuery(_)) => {
            eprintln!("{e}");
            return Ok(ExitCode::from(2));
        }
        Err(e) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut out = std::io::stdout().lock();
    if let Some(answer) = outcome.answer {
        let cancelled = tokio::select! {
            result = render::render_answer(&mut out, answer) => {
                if !result? {
                    tracing::debug!("answer incomplete, showing sources anyway");
                }
                false
            }
            _ = tokio::signal::ctrl_c() => true,
        };
        if cancelled {
            writeln!(out, "\n[answer generation interrupted: cancelled]")?;
            return Ok(ExitCode::from(130));
        }
    }
    render::render_sources(&mut out, &outcome.matches, pipeline, args.expand).await?;
    out.flush()?;
    Ok(ExitCode::SUCCESS)
}
