//! # Rapidl Client
//!
//! Fetches job payloads from the content backend and loads them through
//! [`ContentService`], retrying with bounded exponential backoff.
//!
//! Retries cover transport failures, server errors and jobs that are still processing.
//! A payload that arrives but cannot be decoded is never retried: fetching the same bytes
//! again would fail the same way.

pub mod backoff;
pub mod error;

pub use backoff::BackoffPolicy;
pub use error::{ClientError, ClientResult};

use futures::future::join_all;
use rapidl_core::{ContentService, RawContentPayload, ViewState};
use rapidl_types::JobId;

/// Default content backend base URL.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

const CONTENT_PATH: &str = "/generated/content";

/// Resolve the backend URL from an optional string value.
pub fn backend_url_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
}

/// Resolve the maximum number of fetch attempts from an optional string value.
///
/// # Errors
///
/// A value that is not a positive integer yields
/// `ClientError::Content(ContentError::InvalidInput)`.
pub fn fetch_attempts_from_env_value(value: Option<String>) -> ClientResult<u32> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(backoff::DEFAULT_ATTEMPTS),
        Some(v) => match v.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(rapidl_core::ContentError::InvalidInput(format!(
                "fetch attempts must be a positive integer, got {v}"
            ))
            .into()),
        },
    }
}

/// HTTP client for the content backend.
#[derive(Clone, Debug)]
pub struct ContentClient {
    http: reqwest::Client,
    endpoint: String,
    service: ContentService,
    backoff: BackoffPolicy,
}

impl ContentClient {
    /// Create a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidBackendUrl` if `base_url` is not an absolute URL.
    pub fn new(
        base_url: &str,
        service: ContentService,
        backoff: BackoffPolicy,
    ) -> ClientResult<Self> {
        reqwest::Url::parse(base_url).map_err(|err| ClientError::InvalidBackendUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), CONTENT_PATH),
            service,
            backoff,
        })
    }

    pub fn service(&self) -> &ContentService {
        &self.service
    }

    pub fn backoff(&self) -> BackoffPolicy {
        self.backoff
    }

    /// Fetch the raw job payload once, without retrying.
    ///
    /// # Errors
    ///
    /// - `ClientError::Http` if the request cannot be sent or the body cannot be read.
    /// - `ClientError::Status` for a non-success response.
    /// - `ClientError::Content` if the body does not match the payload envelope.
    pub async fn fetch_payload(&self, job_id: &JobId) -> ClientResult<RawContentPayload> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("id", job_id.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        tracing::debug!(%job_id, bytes = body.len(), "fetched job payload");

        Ok(RawContentPayload::from_json(&body)?)
    }

    /// Fetch and load a document, retrying per the backoff policy.
    ///
    /// A job that is still queued or working is polled again; a failed job is returned
    /// straight away as `ViewState::Processing` with status `Failed`. Returns
    /// `ViewState::Processing` if the job is still not finished after the last attempt.
    ///
    /// # Errors
    ///
    /// Returns the last transport error once attempts run out, or the first terminal error.
    pub async fn load_document(&self, job_id: &JobId) -> ClientResult<ViewState> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let outcome = match self.fetch_payload(job_id).await {
                Ok(payload) => self.service.load(job_id, &payload).map_err(ClientError::from),
                Err(err) => Err(err),
            };

            let last_attempt = attempt >= self.backoff.attempts;
            match outcome {
                Ok(state) if state.is_pending() && !last_attempt => {
                    tracing::debug!(%job_id, attempt, "job still processing");
                }
                Err(err) if err.is_retryable() && !last_attempt => {
                    tracing::debug!(%job_id, attempt, error = %err, "fetch failed, retrying");
                }
                Err(err) => {
                    tracing::warn!(%job_id, attempt, error = %err, "giving up on document");
                    return Err(err);
                }
                Ok(state) => return Ok(state),
            }

            tokio::time::sleep(self.backoff.delay_for_attempt(attempt)).await;
        }
    }

    /// Load several documents concurrently.
    ///
    /// Each job is fetched and decoded independently; results come back in the order of
    /// `job_ids`.
    pub async fn load_many(&self, job_ids: &[JobId]) -> Vec<ClientResult<ViewState>> {
        join_all(job_ids.iter().map(|job_id| self.load_document(job_id))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use rapidl_blob::{Blob, MathText, Question, SingleQuestion};
    use rapidl_core::{CoreConfig, JobStatus};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Clone)]
    struct Backend {
        calls: Arc<AtomicUsize>,
        /// Calls answered with `Waiting` before the job succeeds.
        pending_calls: usize,
        server_error: bool,
        failed: bool,
    }

    impl Backend {
        fn new(pending_calls: usize) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                pending_calls,
                server_error: false,
                failed: false,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn encoded_blob(body: &str) -> String {
        Blob {
            questions: vec![Question::Single(SingleQuestion {
                header: MathText::default(),
                raw_text: body.into(),
                latex_text: body.into(),
                mark_scheme: MathText::default(),
            })],
            created_by: 1,
            created_on: "2024-01-01T00:00:00Z".into(),
            generated_category: "Maths".into(),
            generated_options: vec![],
        }
        .encode()
        .expect("encode blob")
    }

    fn success_json(blob: String) -> serde_json::Value {
        serde_json::json!({
            "status": "Success",
            "content": {
                "blob": blob,
                "createdat": "2024-01-01T00:00:00Z",
                "finishedon": "2024-01-01T00:05:00Z",
                "displayname": "",
                "options": "",
                "category": "Maths",
                "creditsused": 2
            }
        })
    }

    async fn content(
        State(backend): State<Backend>,
        Query(query): Query<HashMap<String, String>>,
    ) -> Result<Json<serde_json::Value>, StatusCode> {
        let call = backend.calls.fetch_add(1, Ordering::SeqCst);
        if backend.server_error {
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
        if backend.failed {
            return Ok(Json(serde_json::json!({"status": "Failed", "content": null})));
        }
        if call < backend.pending_calls {
            return Ok(Json(serde_json::json!({"status": "Waiting", "content": null})));
        }

        match query.get("id").map(String::as_str) {
            Some("corrupt") => Ok(Json(success_json("aGVsbG8=".into()))),
            Some(id) => Ok(Json(success_json(encoded_blob(id)))),
            None => Err(StatusCode::BAD_REQUEST),
        }
    }

    async fn spawn_backend(backend: Backend) -> String {
        let app = Router::new()
            .route("/generated/content", get(content))
            .with_state(backend);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test backend");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve test backend");
        });
        format!("http://{addr}")
    }

    fn fast_backoff(attempts: u32) -> BackoffPolicy {
        BackoffPolicy {
            starting_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            attempts,
            factor: 2,
        }
    }

    fn client(base_url: &str, attempts: u32) -> ContentClient {
        let service = ContentService::new(Arc::new(CoreConfig::utc()));
        ContentClient::new(base_url, service, fast_backoff(attempts)).expect("client")
    }

    fn job(id: &str) -> JobId {
        JobId::parse(id).expect("valid job id")
    }

    #[tokio::test]
    async fn loads_ready_document_on_first_attempt() {
        let backend = Backend::new(0);
        let url = spawn_backend(backend.clone()).await;

        let state = client(&url, 4).load_document(&job("abc123")).await.expect("load");

        let ViewState::Ready { document } = state else {
            panic!("expected ready document");
        };
        assert_eq!(document.name, "abc123");
        assert_eq!(document.credits, "2 credits");
        assert_eq!(document.questions[0].body(), Some("abc123"));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn retries_while_job_is_processing() {
        let backend = Backend::new(2);
        let url = spawn_backend(backend.clone()).await;

        let state = client(&url, 4).load_document(&job("abc123")).await.expect("load");
        assert!(state.is_ready());
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn stays_processing_when_attempts_run_out() {
        let backend = Backend::new(10);
        let url = spawn_backend(backend.clone()).await;

        let state = client(&url, 2).load_document(&job("abc123")).await.expect("load");
        assert_eq!(state, ViewState::processing(JobStatus::Waiting));
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn failed_job_is_not_polled_again() {
        let mut backend = Backend::new(0);
        backend.failed = true;
        let url = spawn_backend(backend.clone()).await;

        let state = client(&url, 4).load_document(&job("abc123")).await.expect("load");
        assert_eq!(state, ViewState::processing(JobStatus::Failed));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn corrupt_blob_is_not_retried() {
        let backend = Backend::new(0);
        let url = spawn_backend(backend.clone()).await;

        let err = client(&url, 4)
            .load_document(&job("corrupt"))
            .await
            .expect_err("corrupt blob");
        assert!(matches!(&err, ClientError::Content(inner) if inner.is_blob_failure()));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_attempts_run_out() {
        let mut backend = Backend::new(0);
        backend.server_error = true;
        let url = spawn_backend(backend.clone()).await;

        let err = client(&url, 3)
            .load_document(&job("abc123"))
            .await
            .expect_err("server error");
        assert!(matches!(err, ClientError::Status { status: 500 }));
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn unreachable_backend_is_an_upstream_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let err = client(&format!("http://{addr}"), 2)
            .load_document(&job("abc123"))
            .await
            .expect_err("nothing listening");
        assert!(err.is_upstream_failure());
    }

    #[tokio::test]
    async fn load_many_keeps_request_order() {
        let backend = Backend::new(0);
        let url = spawn_backend(backend).await;

        let results = client(&url, 1)
            .load_many(&[job("first"), job("corrupt"), job("third")])
            .await;

        assert_eq!(results.len(), 3);
        match &results[0] {
            Ok(ViewState::Ready { document }) => assert_eq!(document.name, "first"),
            other => panic!("expected first document, got {other:?}"),
        }
        assert!(results[1].is_err());
        match &results[2] {
            Ok(ViewState::Ready { document }) => assert_eq!(document.name, "third"),
            other => panic!("expected third document, got {other:?}"),
        }
    }

    #[test]
    fn rejects_relative_backend_url() {
        let service = ContentService::new(Arc::new(CoreConfig::utc()));
        let err = ContentClient::new("localhost", service, BackoffPolicy::default())
            .expect_err("relative url");
        assert!(matches!(err, ClientError::InvalidBackendUrl { .. }));
    }

    #[test]
    fn env_values_fall_back_to_defaults() {
        assert_eq!(backend_url_from_env_value(None), DEFAULT_BACKEND_URL);
        assert_eq!(
            backend_url_from_env_value(Some(" http://api:9000 ".into())),
            "http://api:9000"
        );
        assert_eq!(fetch_attempts_from_env_value(None).expect("default"), 4);
        assert_eq!(fetch_attempts_from_env_value(Some("6".into())).expect("parse"), 6);
        assert!(fetch_attempts_from_env_value(Some("0".into())).is_err());
    }
}
