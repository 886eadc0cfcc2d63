//! Visual parity loop for one component against its reference design.

use anyhow::Result;
use convergence::{ConvergenceController, FinalReport};
use core::future::pending;
use core::time::Duration;
use env_logger::{Builder, Env};
use log::{error, warn};
use parity::config::{RunConfig, USAGE};
use parity::reference::ReferenceProvider;
use parity::report::{ReportWriter, write_summary};
use parity::storybook::{ChromeRenderer, ensure_storybook_running};
use parity::style_files::FsStyleSource;
use std::fs::create_dir_all;
use std::io::stdout;
use std::process::exit;
use tokio::signal::ctrl_c;
use tokio::time::sleep;

/// Resolves with an abort reason on Ctrl-C or once `limit` elapses.
async fn cancellation(limit: Option<Duration>) -> String {
    let deadline = async {
        match limit {
            Some(limit) => {
                sleep(limit).await;
                format!("timed out after {}s", limit.as_secs())
            }
            None => pending().await,
        }
    };
    tokio::select! {
        reason = deadline => reason,
        signal = ctrl_c() => match signal {
            Ok(()) => "interrupted".to_owned(),
            Err(err) => {
                warn!("cannot listen for Ctrl-C: {err}");
                pending().await
            }
        },
    }
}

async fn run(config: &RunConfig) -> Result<FinalReport> {
    ensure_storybook_running(&config.storybook_url).await?;
    create_dir_all(&config.output_dir)?;

    let provider = ReferenceProvider::from_config(config)?;
    let renderer = ChromeRenderer::new(config.storybook_url.clone(), config.chrome_bin.clone())
        .with_snapshot_dir(config.output_dir.clone());
    let style_source = FsStyleSource::new(config.blocks_dir.clone());

    let mut controller =
        ConvergenceController::new(provider, renderer, style_source, config.options.clone());
    let report = controller
        .invoke_with_cancel(
            &config.component,
            &config.design_id(),
            cancellation(config.timeout),
        )
        .await;

    let (_provider, mut chrome, _style_source) = controller.into_parts();
    chrome.shutdown().await;
    Ok(report)
}

#[tokio::main]
async fn main() {
    let _log_init: Result<(), _> = Builder::from_env(Env::default().filter_or("RUST_LOG", "info"))
        .is_test(false)
        .try_init();

    let config = match RunConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            error!("{USAGE}");
            exit(1);
        }
    };

    let report = match run(&config).await {
        Ok(report) => report,
        Err(err) => {
            error!("error: {err:#}");
            exit(1);
        }
    };

    let paths = match ReportWriter::new(config.output_dir).write(&report) {
        Ok(paths) => Some(paths),
        Err(err) => {
            error!("could not write the report: {err:#}");
            None
        }
    };
    let mut out = stdout().lock();
    if let Err(err) = write_summary(&mut out, &report, paths.as_ref()) {
        error!("could not print the summary: {err}");
    }

    exit(report.exit_code());
}
