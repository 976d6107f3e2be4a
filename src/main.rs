use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use podium::analysis::pipeline::AnalysisRequest;
use podium::cli::{Cli, Commands};
use podium::config::Config;
use podium::features::{FeatureExtractor, JsonFeatureExtractor, WavEnergyExtractor};
use podium::jobs::{JobEvent, JobManager, JobStatus};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<()> {
    podium::logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            ref input,
            ref metrics,
            ref language,
            wait_timeout,
            compact,
        } => {
            let config = load_config(cli.config.as_deref())?;
            run_analyze(
                config,
                input.clone(),
                metrics.clone(),
                language.clone(),
                wait_timeout,
                compact,
                cli.quiet,
                cli.verbose,
            )
            .await
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "podium", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            Config::load(path).with_context(|| format!("loading config {}", path.display()))?
        }
        None => Config::load_or_default(&Config::default_path()),
    };
    Ok(config.with_env_overrides())
}

/// Pick a front end from the input extension: .wav gets the energy scanner,
/// anything else is treated as a precomputed features document.
fn extractor_for(input: &Path) -> Arc<dyn FeatureExtractor> {
    let is_wav = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
    if is_wav {
        Arc::new(WavEnergyExtractor::new())
    } else {
        Arc::new(JsonFeatureExtractor::new())
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_analyze(
    config: Config,
    input: PathBuf,
    metrics: Vec<String>,
    language: Option<String>,
    wait_timeout: u64,
    compact: bool,
    quiet: bool,
    verbose: u8,
) -> Result<()> {
    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let manager =
        JobManager::new(extractor_for(&input), &config).with_event_sender(event_tx);

    let mut request = AnalysisRequest::for_audio(input.display().to_string());
    request.requested_metrics = metrics;
    if let Some(language) = language {
        request.language = language;
    }

    let job_id = manager.submit(request).await?;
    if !quiet {
        eprintln!("{} job {}", "submitted".green(), job_id.bold());
    }

    let deadline = Instant::now() + Duration::from_secs(wait_timeout);
    let final_status = loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            bail!("analysis did not finish within {wait_timeout}s");
        }

        let rx = event_rx.clone();
        let event = tokio::task::spawn_blocking(move || rx.recv_timeout(remaining)).await?;
        match event {
            Ok(JobEvent::Started { job_id: id }) if id == job_id => {
                if verbose >= 1 && !quiet {
                    eprintln!("{} job {}", "processing".yellow(), id);
                }
            }
            Ok(JobEvent::Finished { job_id: id, status }) if id == job_id => break status,
            Ok(_) => {}
            Err(_) => bail!("analysis did not finish within {wait_timeout}s"),
        }
    };

    match final_status {
        JobStatus::Done => {
            let report = manager.full_report(&job_id).await?;
            let rendered = if compact {
                serde_json::to_string(&report)?
            } else {
                serde_json::to_string_pretty(&report)?
            };
            println!("{rendered}");
            if !quiet {
                let overall = report
                    .overall_score
                    .score_0_100
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "n/a".to_string());
                eprintln!("{} overall score: {}", "done".green(), overall.bold());
            }
            Ok(())
        }
        JobStatus::Failed => {
            let message = manager
                .status(&job_id)
                .await
                .and_then(|view| view.failure)
                .map(|failure| failure.message)
                .unwrap_or_else(|| "unknown failure".to_string());
            bail!("analysis failed: {message}");
        }
        other => bail!("unexpected terminal status: {other}"),
    }
}
