pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::resume::handlers as resume_handlers;
use crate::search::handlers as search_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Search API
        .route("/api/v1/search", post(search_handlers::handle_search))
        .route(
            "/api/v1/search/upload",
            post(search_handlers::handle_search_upload),
        )
        // Résumé API
        .route(
            "/api/v1/resume/extract",
            post(resume_handlers::handle_extract),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::search::{SearchCoordinator, Timeouts};
    use crate::sources::JobSource;
    use crate::testing::{posting, FailingSource, FixedSource, ScriptedMatcher};

    const BOUNDARY: &str = "jobmatch-test-boundary";

    struct Part<'a> {
        name: &'a str,
        file: Option<(&'a str, &'a str)>,
        data: &'a [u8],
    }

    fn text_part<'a>(name: &'a str, value: &'a str) -> Part<'a> {
        Part {
            name,
            file: None,
            data: value.as_bytes(),
        }
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part.file {
                Some((file_name, content_type)) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
                        part.name
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        part.name
                    )
                    .as_bytes(),
                ),
            }
            body.extend_from_slice(part.data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn app(source: Arc<dyn JobSource>) -> Router {
        let config = Config::from_lookup(|_| None).unwrap();
        let coordinator = SearchCoordinator::new(
            source,
            Arc::new(ScriptedMatcher),
            Timeouts {
                source: Duration::from_secs(5),
                matcher: Duration::from_secs(5),
            },
        );
        build_router(AppState {
            config,
            coordinator: Arc::new(coordinator),
        })
    }

    fn default_app() -> Router {
        app(Arc::new(FixedSource::new(vec![
            posting("Backend", "score=0.2"),
            posting("Platform", "score=0.9"),
        ])))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(default_app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_search_blank_keyword_is_400() {
        let (status, body) = send(
            default_app(),
            json_request("/api/v1/search", json!({"keyword": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_search_with_resume_is_ranked() {
        let (status, body) = send(
            default_app(),
            json_request(
                "/api/v1/search",
                json!({
                    "keyword": "engineer",
                    "job_types": ["Full-time"],
                    "resume_text": "Rust and Kafka"
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ranked"], true);
        assert_eq!(body["total"], 2);
        assert_eq!(body["postings"][0]["title"], "Platform");
        assert_eq!(body["postings"][0]["match_band"], "high");
        assert_eq!(body["postings"][1]["match_band"], "low");
        assert_eq!(body["table"][0]["match_percentage"], "90%");
        assert_eq!(body["table"][1]["location"], "Location not specified");
        assert!(body["failure"].is_null());
    }

    #[tokio::test]
    async fn test_search_without_resume_omits_match_fields() {
        let (status, body) = send(
            default_app(),
            json_request("/api/v1/search", json!({"keyword": "engineer"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ranked"], false);
        assert_eq!(body["postings"][0]["title"], "Backend");
        assert!(body["postings"][0].get("match_band").is_none());
        assert!(body["table"][0].get("match_percentage").is_none());
    }

    #[tokio::test]
    async fn test_source_failure_is_reported_in_body() {
        let (status, body) = send(
            app(Arc::new(FailingSource)),
            json_request("/api/v1/search", json!({"keyword": "engineer"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
        assert_eq!(body["failure"]["code"], "SEARCH_FAILED");
    }

    #[tokio::test]
    async fn test_upload_with_text_resume_is_ranked() {
        let parts = [
            text_part("keyword", "engineer"),
            text_part("experience_level", "Mid-Senior level"),
            text_part("results_limit", "5"),
            Part {
                name: "resume_file",
                file: Some(("cv.txt", "text/plain")),
                data: b"Rust, Kafka, Kubernetes",
            },
        ];
        let (status, body) = send(
            default_app(),
            multipart_request("/api/v1/search/upload", &parts),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ranked"], true);
        assert!(body["resume_warning"].is_null());
        assert_eq!(body["postings"][0]["title"], "Platform");
    }

    #[tokio::test]
    async fn test_upload_with_unsupported_file_degrades_to_unranked() {
        let parts = [
            text_part("keyword", "engineer"),
            Part {
                name: "resume_file",
                file: Some(("photo.png", "image/png")),
                data: &[0x89, b'P', b'N', b'G'],
            },
        ];
        let (status, body) = send(
            default_app(),
            multipart_request("/api/v1/search/upload", &parts),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ranked"], false);
        assert_eq!(body["total"], 2);
        let warning = body["resume_warning"].as_str().unwrap();
        assert!(warning.contains("unsupported file format"), "{warning}");
    }

    #[tokio::test]
    async fn test_unreadable_file_ignores_pasted_text() {
        let parts = [
            text_part("keyword", "engineer"),
            text_part("resume_text", "Rust and Kafka"),
            Part {
                name: "resume_file",
                file: Some(("cv.pdf", "application/pdf")),
                data: b"%PDF-1.4 truncated",
            },
        ];
        let (status, body) = send(
            default_app(),
            multipart_request("/api/v1/search/upload", &parts),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ranked"], false);
        assert_eq!(body["postings"][0]["title"], "Backend");
        let warning = body["resume_warning"].as_str().unwrap();
        assert!(warning.starts_with("Error processing file"), "{warning}");
    }

    #[tokio::test]
    async fn test_upload_rejects_unknown_job_type() {
        let parts = [
            text_part("keyword", "engineer"),
            text_part("job_type", "Gig"),
        ];
        let (status, body) = send(
            default_app(),
            multipart_request("/api/v1/search/upload", &parts),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_extract_text_file() {
        let parts = [Part {
            name: "file",
            file: Some(("cv.txt", "text/plain")),
            data: b"  Jane Doe, Rust engineer  ",
        }];
        let (status, body) = send(
            default_app(),
            multipart_request("/api/v1/resume/extract", &parts),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["format"], "text");
        assert_eq!(body["text"], "Jane Doe, Rust engineer");
        assert_eq!(body["char_count"], 23);
    }

    #[tokio::test]
    async fn test_extract_unsupported_is_415() {
        let parts = [Part {
            name: "file",
            file: Some(("photo.png", "image/png")),
            data: b"png",
        }];
        let (status, body) = send(
            default_app(),
            multipart_request("/api/v1/resume/extract", &parts),
        )
        .await;

        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_FORMAT");
    }

    #[tokio::test]
    async fn test_extract_without_file_is_400() {
        let parts = [text_part("other", "x")];
        let (status, _) = send(
            default_app(),
            multipart_request("/api/v1/resume/extract", &parts),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
