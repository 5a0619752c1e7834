//! Ingestion endpoints.
//!
//! - `POST /process_csv`: `{"fileId", "chatId"}` where `fileId` is a Google
//!   Drive file id. The file is downloaded and loaded in chunks.
//! - `POST /spreadsheets`: same body, `fileId` is a Google Sheets id. The CSV
//!   export is loaded in one write.
//! - `GET /jobs/{job_id}`: current `JobStatus` of a job started by either of
//!   the above, or `404`.
//!
//! The POST routes answer as soon as the job is scheduled. The outcome is only
//! visible through the job status and the webhook notification.

use actix_web::web::{get, post, ServiceConfig};

mod get_status;
pub mod job;
mod process_csv;
mod spreadsheets;

pub fn configure_routes(cfg: &mut ServiceConfig) {
    cfg.route("/process_csv", post().to(process_csv::process))
        .route("/spreadsheets", post().to(spreadsheets::process))
        .route("/jobs/{job_id}", get().to(get_status::process));
}
