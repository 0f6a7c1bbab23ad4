//! Terminal client binary.

mod view;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use recut_client::{ApiClient, ApiConfig, ClientError, JobPollingLoop, PollConfig};
use recut_models::{format_bytes, CreateJobRequest, ExportQuality, JobId};
use recut_upload::{content_type_for, UploadOrchestrator};

use view::{print_analysis, ProgressView};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("recut=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    if let Err(e) = run().await {
        if matches!(e.downcast_ref::<ClientError>(), Some(ClientError::SessionExpired)) {
            error!("session expired; run `recut` again with a fresh RECUT_AUTH_TOKEN");
        } else {
            error!("{:#}", e);
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("upload") => {
            let path = args
                .get(1)
                .map(PathBuf::from)
                .context("usage: recut upload <file> [4k|1080p|720p]")?;
            let quality = match args.get(2).map(String::as_str) {
                None | Some("1080p") => ExportQuality::Fhd1080,
                Some("4k") => ExportQuality::Uhd4k,
                Some("720p") => ExportQuality::Standard,
                Some(other) => bail!("unknown quality {other:?}; expected 4k, 1080p or 720p"),
            };
            upload(path, quality).await
        }
        Some("watch") => {
            let job_id = args.get(1).context("usage: recut watch <job-id>")?;
            watch(JobId::from_string(job_id.clone())).await
        }
        Some("list") => list().await,
        _ => {
            eprintln!("usage: recut <upload|watch|list> ...");
            std::process::exit(2);
        }
    }
}

async fn upload(path: PathBuf, quality: ExportQuality) -> Result<()> {
    let size = tokio::fs::metadata(&path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?
        .len();
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .context("path has no filename")?;

    let api = ApiClient::from_env()?;
    let request = CreateJobRequest::new(&filename, content_type_for(&filename), size)
        .with_quality(quality);
    let created = api.create_job(&request).await?;
    let job_id = created.job.id.clone();
    info!(job_id = %job_id, size = %format_bytes(size), "job created");

    let view = Arc::new(ProgressView::new());
    let orchestrator = UploadOrchestrator::from_env()?;
    let outcome = orchestrator.upload(&path, &created, view.clone()).await?;
    orchestrator.sessions().remove(&job_id);
    info!(job_id = %job_id, tier = %outcome.tier, "upload finished");

    watch_with_view(job_id, view).await
}

async fn watch(job_id: JobId) -> Result<()> {
    watch_with_view(job_id, Arc::new(ProgressView::new())).await
}

async fn watch_with_view(job_id: JobId, view: Arc<ProgressView>) -> Result<()> {
    let api = Arc::new(ApiClient::new(ApiConfig::from_env())?);
    let polling = JobPollingLoop::new(api.clone(), PollConfig::from_env());
    polling.select_job(Some(job_id.clone()));

    // Stop as soon as the watched job is terminal, even if other jobs are
    // still running; dropping the future cancels all three timers.
    let run = polling.run(view.clone());
    tokio::pin!(run);
    loop {
        tokio::select! {
            result = &mut run => {
                result?;
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted; timers stopped");
                return Ok(());
            }
            _ = tokio::time::sleep(std::time::Duration::from_millis(200)) => {
                if view.latest_detail().is_some_and(|d| d.is_terminal()) {
                    break;
                }
            }
        }
    }

    let detail = match view.latest_detail() {
        Some(detail) => detail,
        None => api.get_job(&job_id).await?,
    };

    if detail.stage() == recut_models::PipelineStage::Failed {
        bail!(
            "job {} failed: {}",
            job_id,
            detail.summary.error_message.as_deref().unwrap_or("unknown error")
        );
    }

    print_analysis(&detail);

    let output = api.output_url(&job_id).await?;
    println!("output: {}", output.url);
    Ok(())
}

async fn list() -> Result<()> {
    let api = ApiClient::from_env()?;
    let jobs = api.list_jobs().await?;

    if jobs.is_empty() {
        println!("no jobs");
        return Ok(());
    }

    for job in jobs {
        let size = job
            .size_bytes
            .map(format_bytes)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:<12} {:>3}%  {:>10}  {}",
            job.id,
            job.stage().display_name(),
            job.progress,
            size,
            job.filename
        );
    }
    Ok(())
}
