use crate::job_controller::state::JobsState;
use actix_web::{web, HttpResponse, Responder};

pub(crate) async fn process(job_id: web::Path<String>, state: web::Data<JobsState>) -> impl Responder {
    get_job_status(job_id, state).await
}

async fn get_job_status(job_id: web::Path<String>, state: web::Data<JobsState>) -> impl Responder {
    match state.status(&job_id.into_inner()).await {
        Some(status) => HttpResponse::Ok().json(status),
        None => HttpResponse::NotFound().body("Job ID not found"),
    }
}
