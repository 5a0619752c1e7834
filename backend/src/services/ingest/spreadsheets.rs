use crate::job_controller::state::JobsState;
use crate::services::ingest::job::{processing_response, schedule_ingest_job, IngestContext, SourceKind};
use actix_web::{web, HttpResponse, Responder};
use common::requests::ProcessFileRequest;
use log::info;

pub(crate) async fn process(
    state: web::Data<JobsState>,
    ctx: web::Data<IngestContext>,
    req: web::Json<ProcessFileRequest>,
) -> impl Responder {
    let req = req.into_inner();
    info!(
        "Received spreadsheet to process. fileId={}, chatId={}",
        req.file_id, req.chat_id
    );
    let job_id = schedule_ingest_job(&state, &ctx, SourceKind::Spreadsheet, req).await;
    HttpResponse::Ok().json(processing_response(job_id))
}
