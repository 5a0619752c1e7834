mod health;
pub mod ingest;

use actix_web::error::InternalError;
use actix_web::web::{self, get, ServiceConfig};
use actix_web::HttpResponse;
use serde_json::json;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.route("/", get().to(health::process));
    ingest::configure_routes(cfg);
}

/// JSON extractor settings: malformed bodies get `422` with a `detail` message.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(1024 * 1024)
        .error_handler(|err, _req| {
            let detail = err.to_string();
            InternalError::from_response(
                err,
                HttpResponse::UnprocessableEntity().json(json!({ "detail": detail })),
            )
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::job_controller::state::JobsState;
    use crate::services::ingest::job::{IngestContext, PROCESSING_TEXT};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::Value;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(json_config())
                    .app_data(web::Data::new($state.clone()))
                    .app_data(web::Data::new(IngestContext::new(Arc::new(Config::default()))))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn root_says_hello() {
        let (tx, _rx) = mpsc::channel(8);
        let state = JobsState::new(tx);
        let app = app!(state);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "Hello": "World" }));
    }

    #[actix_web::test]
    async fn ingestion_routes_acknowledge_immediately() {
        let (tx, _rx) = mpsc::channel(8);
        let state = JobsState::new(tx);
        let app = app!(state);

        for uri in ["/process_csv", "/spreadsheets"] {
            let req = test::TestRequest::post()
                .uri(uri)
                .set_json(json!({ "fileId": "abc", "chatId": "user 123!" }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["status"], "processing");
            assert_eq!(body["texto"], PROCESSING_TEXT);
            let job_id = body["job_id"].as_str().unwrap();
            assert!(state.status(job_id).await.is_some());
        }
    }

    #[actix_web::test]
    async fn malformed_bodies_are_rejected() {
        let (tx, _rx) = mpsc::channel(8);
        let state = JobsState::new(tx);
        let app = app!(state);

        let bodies = [
            json!({ "fileId": "abc" }),
            json!({ "fileId": 1, "chatId": "x" }),
            json!({ "fileId": "abc", "chatId": null }),
        ];
        for body in bodies {
            let req = test::TestRequest::post()
                .uri("/process_csv")
                .set_json(&body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{body}");
            let err: Value = test::read_body_json(resp).await;
            assert!(err["detail"].is_string());
        }

        let req = test::TestRequest::post()
            .uri("/spreadsheets")
            .insert_header(("content-type", "text/plain"))
            .set_payload("fileId=abc")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(state.jobs.read().await.is_empty());
    }

    #[actix_web::test]
    async fn job_status_lookup() {
        let (tx, _rx) = mpsc::channel(8);
        let state = JobsState::new(tx);
        state.register("known").await;
        let app = app!(state);

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/jobs/known").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!("Pending"));

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/jobs/unknown").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
