//! # Ingestion job lifecycle
//!
//! Both ingestion endpoints end up here:
//!
//! 1.  **Scheduling**: `schedule_ingest_job` gives the job an id, registers
//!     it as `Pending` and spawns a Tokio task. The HTTP handler answers right
//!     away with the job id.
//!
//! 2.  **Exclusion**: the task derives the table name from the owner
//!     identifier and waits for the table lock, so two jobs never load the
//!     same table at the same time.
//!
//! 3.  **Fetch**: Drive jobs stream the file to a temporary file, spreadsheet
//!     jobs read the CSV export into memory.
//!
//! 4.  **Load**: CSV parsing and SQLite writes run in `spawn_blocking`. Drive
//!     jobs load in chunks and report the running row count as
//!     `JobStatus::InProgress`. Spreadsheet jobs load in one write.
//!
//! 5.  **Outcome**: success or failure is sent to the webhook and recorded as
//!     the job's terminal status. Errors are logged in full. The webhook only
//!     receives a generic failure text.

use crate::config::Config;
use crate::ingest::engine::{self, IngestReport};
use crate::ingest::error::IngestError;
use crate::ingest::fetch;
use crate::ingest::notifier::{WebhookNotifier, FAILURE_TEXT, SUCCESS_TEXT};
use crate::ingest::store;
use crate::ingest::table_name::sanitize_table_name;
use crate::job_controller::state::{JobUpdate, JobsState};
use common::jobs::JobStatus;
use common::model::notification::NotificationMessage;
use common::requests::{ProcessFileRequest, ProcessingResponse};
use log::{error, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use uuid::Uuid;

pub const PROCESSING_TEXT: &str = "O arquivo está sendo processado em background. Você receberá uma notificação quando estiver pronto.";

/// What every job needs besides its own request: configuration and a shared HTTP client.
#[derive(Clone)]
pub struct IngestContext {
    pub config: Arc<Config>,
    pub client: reqwest::Client,
}

impl IngestContext {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Drive file id, downloaded then loaded in chunks.
    Drive,
    /// Spreadsheet id, read from its CSV export and loaded whole.
    Spreadsheet,
}

#[derive(Debug, Clone)]
pub struct IngestJob {
    pub id: String,
    pub kind: SourceKind,
    pub file_id: String,
    pub owner: String,
    pub chunk_size: usize,
}

pub fn processing_response(job_id: String) -> ProcessingResponse {
    ProcessingResponse {
        status: "processing".to_string(),
        texto: PROCESSING_TEXT.to_string(),
        job_id,
    }
}

/// Registers the job as `Pending`, spawns it and returns its id without waiting.
pub(crate) async fn schedule_ingest_job(
    state: &JobsState,
    ctx: &IngestContext,
    kind: SourceKind,
    req: ProcessFileRequest,
) -> String {
    let job = IngestJob {
        id: Uuid::new_v4().to_string(),
        kind,
        file_id: req.file_id,
        owner: req.chat_id,
        chunk_size: ctx.config.chunk_size,
    };
    let job_id = job.id.clone();
    state.register(&job_id).await;

    let state = state.clone();
    let ctx = ctx.clone();
    tokio::spawn(async move {
        run_job(&state, &ctx, job).await;
    });

    job_id
}

/// Runs one job to completion and returns its terminal status.
pub(crate) async fn run_job(state: &JobsState, ctx: &IngestContext, job: IngestJob) -> JobStatus {
    let table = sanitize_table_name(&job.owner);
    let _table_guard = state.lock_table(&table).await;

    info!(
        "Starting job {} ({:?}). chat_id={}, table={}, chunk_size={}",
        job.id, job.kind, job.owner, table, job.chunk_size
    );
    state.report(&job.id, JobStatus::InProgress(0)).await;

    let (status, text) = match execute(state, ctx, &job, &table).await {
        Ok(report) => {
            info!(
                "Processing finished for chat_id={}, table={}, total rows={}, columns={}, batches={}",
                job.owner, report.table, report.rows, report.columns, report.batches
            );
            (
                JobStatus::Completed(format!("{} rows loaded into {}", report.rows, report.table)),
                SUCCESS_TEXT,
            )
        }
        Err(e) => {
            error!(
                "Error while processing file. job={}, chat_id={}, fileId={} - {}",
                job.id, job.owner, job.file_id, e
            );
            (JobStatus::Failed(e.to_string()), FAILURE_TEXT)
        }
    };

    let notifier = WebhookNotifier::new(ctx.client.clone(), ctx.config.webhook_url.clone());
    if let Err(e) = notifier
        .send(&NotificationMessage::new(job.owner.as_str(), text))
        .await
    {
        error!("Could not notify chat_id={}: {}", job.owner, e);
    }

    state.report(&job.id, status.clone()).await;
    status
}

async fn execute(
    state: &JobsState,
    ctx: &IngestContext,
    job: &IngestJob,
    table: &str,
) -> Result<IngestReport, IngestError> {
    let db_path = ctx
        .config
        .database_path()
        .ok_or(IngestError::MissingConfig("DATABASE_URL"))?;
    let table = table.to_string();
    let owner = job.owner.clone();

    match job.kind {
        SourceKind::Drive => {
            let download = fetch::download_drive_file(
                &ctx.client,
                &ctx.config.drive_base_url,
                &job.file_id,
                ctx.config.temp_dir.as_deref(),
            )
            .await?;
            let tx = state.tx.clone();
            let job_id = job.id.clone();
            let chunk_size = job.chunk_size;

            run_blocking(move || {
                let mut conn = store::open(&db_path)?;
                let file = File::open(download.path())?;
                engine::ingest_chunked(
                    BufReader::new(file),
                    &mut conn,
                    &table,
                    &owner,
                    chunk_size,
                    |rows| {
                        let update = JobUpdate {
                            job_id: job_id.clone(),
                            status: JobStatus::InProgress(rows),
                        };
                        if tx.blocking_send(update).is_err() {
                            warn!("Job updater is gone; dropping progress for job {}", job_id);
                        }
                    },
                )
            })
            .await
        }
        SourceKind::Spreadsheet => {
            let body =
                fetch::fetch_spreadsheet_csv(&ctx.client, &ctx.config.sheets_base_url, &job.file_id)
                    .await?;

            run_blocking(move || {
                let mut conn = store::open(&db_path)?;
                engine::ingest_whole(body.as_slice(), &mut conn, &table, &owner)
            })
            .await
        }
    }
}

async fn run_blocking<F>(work: F) -> Result<IngestReport, IngestError>
where
    F: FnOnce() -> Result<IngestReport, IngestError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| IngestError::Worker(e.to_string()))?
}
