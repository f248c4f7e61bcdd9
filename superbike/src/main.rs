#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::path::Path;

use anyhow::Context;
use args::{Args, Command};
use clap::Parser;
use superbike_config::Config;
use superbike_imagegen::{AttemptObserver, AttemptOutcome, GenerationAttempt};
use superbike_server::{AvatarError, AvatarPipeline, Server};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;

    if let Some(listen) = args.listen {
        config.server.listen_address = Some(listen);
    }

    // Initialize telemetry
    let _telemetry_guard = superbike_telemetry::init(config.telemetry.as_ref(), &args.log)?;

    tracing::info!(
        config_path = %args.config.display(),
        "starting superbike"
    );

    match args.command {
        None | Some(Command::Serve) => serve(&config).await,
        Some(Command::Generate { input, output, provider }) => {
            generate(&config, &input, &output, provider.as_deref()).await
        }
    }
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let server = Server::new(config)?;

    // Set up graceful shutdown
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    server.serve(shutdown).await?;

    tracing::info!("superbike stopped");
    Ok(())
}

/// Prints attempt progress for the one-shot command
struct ProgressPrinter;

impl AttemptObserver for ProgressPrinter {
    fn attempt_started(&mut self, ordinal: u32, max_attempts: u32) {
        println!("Attempt {ordinal}/{max_attempts}: generating...");
    }

    fn attempt_finished(&mut self, attempt: &GenerationAttempt) {
        match attempt.outcome {
            AttemptOutcome::Image => println!("Attempt {}/{}: image received", attempt.ordinal, attempt.max_attempts),
            AttemptOutcome::NoContent => println!(
                "Attempt {}/{}: no image returned",
                attempt.ordinal, attempt.max_attempts
            ),
            AttemptOutcome::Error => println!("Attempt {}/{}: failed", attempt.ordinal, attempt.max_attempts),
        }
    }
}

async fn generate(config: &Config, input: &Path, output: &Path, provider: Option<&str>) -> anyhow::Result<()> {
    let photo = tokio::fs::read(input)
        .await
        .with_context(|| format!("failed to read photo {}", input.display()))?;

    let pipeline = AvatarPipeline::from_config(config)?;

    let avatar = pipeline
        .run(photo, provider, &mut ProgressPrinter)
        .await
        .map_err(|e| match e {
            AvatarError::ProviderBlocked { .. } => anyhow::anyhow!(e.client_message()),
            other => anyhow::Error::new(other),
        })?;

    tokio::fs::write(output, &avatar.png)
        .await
        .with_context(|| format!("failed to write avatar {}", output.display()))?;

    println!(
        "Saved {} (provider {}, {} attempt(s))",
        output.display(),
        avatar.provider,
        avatar.attempts
    );

    Ok(())
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
