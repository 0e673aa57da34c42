mod cli;
mod ui;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use nrvna::config::NrvnaConfig;
use nrvna::inference::LlamaEngine;
use nrvna::notify::{MailNotifier, NoopNotifier, Notifier};
use nrvna::{Retriever, Scheduler, Submitter, Workspace};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "nrvna=debug" } else { "nrvna=error" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Serve {
            workspace,
            workers,
            endpoint,
        } => {
            let mut config = load_config(&workspace)?;
            if let Some(workers) = workers {
                config.workers = workers;
            }
            if let Some(endpoint) = endpoint {
                config.endpoint = endpoint;
            }
            config.validate()?;

            let engine = LlamaEngine::connect(config.llama_options())
                .await
                .context("failed to load model")?;
            let workspace = Workspace::new(workspace);
            if config.notifications {
                serve(workspace, &config, &engine, MailNotifier::new(&config.mail_command)).await?;
            } else {
                serve(workspace, &config, &engine, NoopNotifier).await?;
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Submit {
            workspace,
            content,
            email,
        } => {
            let submitter = Submitter::new(Workspace::new(workspace))?;
            let id = submitter.submit(&content.join(" "), email.as_deref())?;
            ui::print_submitted(&id);
            Ok(ExitCode::SUCCESS)
        }

        Command::Retrieve { workspace, job_id } => {
            let retriever = Retriever::new(Workspace::new(workspace));
            let found = match job_id {
                Some(id) => retriever.retrieve(&id),
                None => retriever.retrieve_latest(),
            };
            let text = found.as_ref().map(|c| c.inference.as_str());
            ui::print_result(text);
            Ok(if text.is_some_and(|t| !t.is_empty()) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Command::Process {
            workspace,
            endpoint,
        } => {
            let mut config = load_config(&workspace)?;
            if let Some(endpoint) = endpoint {
                config.endpoint = endpoint;
            }
            // Single-shot mode runs everything on one runner.
            config.workers = 1;

            let engine = LlamaEngine::connect(config.llama_options())
                .await
                .context("failed to load model")?;
            let progress = ui::BatchProgress::start(&workspace.display().to_string());
            let workspace = Workspace::new(workspace);
            let processed = if config.notifications {
                process(workspace, &config, &engine, MailNotifier::new(&config.mail_command)).await
            } else {
                process(workspace, &config, &engine, NoopNotifier).await
            };
            let processed = processed.inspect_err(|_| progress.abandon())?;
            progress.finish(processed);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(workspace: &Path) -> Result<NrvnaConfig> {
    NrvnaConfig::load(workspace)
        .with_context(|| format!("invalid configuration in {}", workspace.display()))
}

async fn serve<N: Notifier>(
    workspace: Workspace,
    config: &NrvnaConfig,
    engine: &LlamaEngine,
    notifier: N,
) -> Result<()> {
    let scheduler = Scheduler::start(workspace, config, engine, notifier)?;
    scheduler.serve(shutdown_signal()).await?;
    Ok(())
}

async fn process<N: Notifier>(
    workspace: Workspace,
    config: &NrvnaConfig,
    engine: &LlamaEngine,
    notifier: N,
) -> Result<usize> {
    let scheduler = Scheduler::start(workspace, config, engine, notifier)?;
    Ok(scheduler.process_once().await?)
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Received SIGINT, initiating graceful shutdown");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, initiating graceful shutdown");
                    }
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to install SIGTERM handler"),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for SIGINT");
    }
}
