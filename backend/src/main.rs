mod config;
mod ingest;
mod job_controller;
mod services;

use crate::config::Config;
use crate::job_controller::state::JobsState;
use crate::services::ingest::job::IngestContext;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::sync::Arc;
use tokio::sync::mpsc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Arc::new(Config::from_env());
    let bind = (config.host.clone(), config.port);

    // Initialize job controller state
    let (tx, rx) = mpsc::channel(100);
    let jobs_state = JobsState::new(tx);

    // Start job updater task
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    let ingest_ctx = IngestContext::new(config.clone());

    info!(
        "Server running at http://{}:{} (chunk size {})",
        bind.0, bind.1, config.chunk_size
    );

    HttpServer::new(move || {
        App::new()
            .app_data(services::json_config())
            .app_data(web::Data::new(jobs_state.clone()))
            .app_data(web::Data::new(ingest_ctx.clone()))
            .configure(services::configure)
    })
    .bind(bind)?
    .run()
    .await
}
