//! The API client: thin endpoint wrappers plus the document-processing
//! convenience flows.
//!
//! `DtcClient` composes three independently testable capabilities instead
//! of owning them: transport ([`crate::transport`]), envelope parsing
//! ([`crate::envelope`]), and retry orchestration ([`crate::submit`]).
//! Every endpoint method is a one-screen translation of arguments into an
//! [`ApiRequest`]; nothing here holds state beyond the shared transport.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use dtc_client::{ClientConfig, DtcClient, SubmitOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), dtc_client::DtcError> {
//! let client = DtcClient::new(ClientConfig::from_env()?)?;
//! let result = client
//!     .process_document("invoice.pdf", &SubmitOptions::new())
//!     .await?;
//! println!("{}", result.extracted_text);
//! # Ok(())
//! # }
//! ```

use crate::config::ClientConfig;
use crate::envelope::{parse_response, Envelope};
use crate::error::DtcError;
use crate::handle::{Handle, PipelineHandle, PipelineSpec, ServiceInfo, TaskHandle, TaskInfo, TaskStatus};
use crate::output::ProcessingResult;
use crate::submit::{orchestrator, SubmitOptions};
use crate::transport::{ApiRequest, HttpTransport, Transport};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Client for the Data Toolchain document-processing API.
pub struct DtcClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl DtcClient {
    /// Create a client with the default HTTP transport.
    pub fn new(config: ClientConfig) -> Result<Self, DtcError> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config)?);
        Ok(Self { config, transport })
    }

    /// Create a client over a caller-supplied transport.
    ///
    /// The injection seam for tests and for callers that need middleware
    /// (caching, request capture) between the client and the wire.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn call(&self, request: ApiRequest) -> Result<Envelope, DtcError> {
        let raw = self.transport.execute(request).await?;
        parse_response(raw.status, &raw.body)
    }

    // ── Health ───────────────────────────────────────────────────────────

    /// Service version string (`GET /version`).
    pub async fn version(&self) -> Result<String, DtcError> {
        let envelope = self.call(ApiRequest::get("/version")).await?;
        Ok(match envelope.into_data() {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    /// Raw server status block (`GET /status`).
    pub async fn server_status(&self) -> Result<Value, DtcError> {
        Ok(self.call(ApiRequest::get("/status")).await?.into_data())
    }

    // ── Pipelines ────────────────────────────────────────────────────────

    /// Create a persistent pipeline and return its handle (`POST /pipe`).
    pub async fn create_pipeline(
        &self,
        spec: &PipelineSpec,
        name: Option<&str>,
    ) -> Result<PipelineHandle, DtcError> {
        let mut request = ApiRequest::post("/pipe").json(spec.as_value().clone());
        if let Some(name) = name {
            request = request.query("name", name);
        }
        let envelope = self.call(request).await?;
        let token = token_from(envelope.into_data()).ok_or_else(|| DtcError::Pipeline {
            message: "pipeline creation returned no token".to_owned(),
        })?;
        info!("Created pipeline {token}");
        Ok(PipelineHandle::new(token))
    }

    /// Delete a pipeline (`DELETE /pipe`).
    pub async fn delete_pipeline(&self, handle: &PipelineHandle) -> Result<(), DtcError> {
        self.call(ApiRequest::delete("/pipe").query("token", handle.token()))
            .await?;
        info!("Deleted pipeline {}", handle.token());
        Ok(())
    }

    /// Validate a pipeline configuration without creating it
    /// (`POST /pipe/validate`).
    pub async fn validate_pipeline(&self, spec: &PipelineSpec) -> Result<(), DtcError> {
        self.call(ApiRequest::post("/pipe/validate").json(spec.as_value().clone()))
            .await?;
        Ok(())
    }

    // ── Tasks ────────────────────────────────────────────────────────────

    /// Start a one-shot task and return its handle (`PUT /task`).
    ///
    /// `threads` must be within 1..=16 when given; the bound is enforced
    /// client-side so a typo fails fast instead of burning a round trip.
    pub async fn execute_task(
        &self,
        spec: &PipelineSpec,
        name: Option<&str>,
        threads: Option<u8>,
    ) -> Result<TaskHandle, DtcError> {
        let mut request = ApiRequest::put("/task").json(spec.as_value().clone());
        if let Some(name) = name {
            request = request.query("name", name);
        }
        if let Some(threads) = threads {
            if !(1..=16).contains(&threads) {
                return Err(DtcError::Validation {
                    message: format!("threads must be between 1 and 16, got {threads}"),
                });
            }
            request = request.query("threads", threads);
        }
        let envelope = self.call(request).await?;
        let token = token_from(envelope.into_data()).ok_or_else(|| DtcError::Task {
            message: "task execution returned no token".to_owned(),
        })?;
        info!("Created task {token}");
        Ok(TaskHandle::new(token))
    }

    /// Current status of a task (`GET /task`).
    pub async fn task_status(&self, handle: &TaskHandle) -> Result<TaskInfo, DtcError> {
        let envelope = self
            .call(ApiRequest::get("/task").query("token", handle.token()))
            .await?;
        let data = envelope.into_data();
        if data.is_object() {
            serde_json::from_value(data).map_err(|e| DtcError::Task {
                message: format!("unexpected status payload: {e}"),
            })
        } else {
            // The service occasionally answers with a bare string; surface
            // it without failing the poll.
            Ok(TaskInfo {
                error_message: Some(format!("unexpected response: {data}")),
                ..TaskInfo::default()
            })
        }
    }

    /// Cancel a running task (`DELETE /task`).
    pub async fn cancel_task(&self, handle: &TaskHandle) -> Result<(), DtcError> {
        self.call(ApiRequest::delete("/task").query("token", handle.token()))
            .await?;
        info!("Cancelled task {}", handle.token());
        Ok(())
    }

    /// Poll a task until it completes.
    ///
    /// Returns the final [`TaskInfo`] on completion; a failed or cancelled
    /// task is a [`DtcError::Task`], and `timeout` elapsing without a
    /// terminal state is a [`DtcError::Timeout`].
    pub async fn wait_for_task(
        &self,
        handle: &TaskHandle,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<TaskInfo, DtcError> {
        let deadline = Instant::now() + timeout;
        loop {
            let info = self.task_status(handle).await?;
            match info.status {
                TaskStatus::Completed => return Ok(info),
                TaskStatus::Failed => {
                    return Err(DtcError::Task {
                        message: info
                            .error_message
                            .unwrap_or_else(|| "task failed".to_owned()),
                    })
                }
                TaskStatus::Cancelled => {
                    return Err(DtcError::Task {
                        message: "task was cancelled".to_owned(),
                    })
                }
                TaskStatus::Pending | TaskStatus::Running => {
                    debug!("Task {} still {:?}", handle.token(), info.status);
                }
            }
            if Instant::now() + poll_interval > deadline {
                return Err(DtcError::Timeout {
                    secs: timeout.as_secs(),
                });
            }
            sleep(poll_interval).await;
        }
    }

    // ── Webhook submission ───────────────────────────────────────────────

    /// Send a structured JSON payload to a task's webhook (`PUT /webhook`).
    pub async fn send_webhook(
        &self,
        handle: &TaskHandle,
        payload: &Value,
    ) -> Result<Value, DtcError> {
        let envelope = self
            .call(
                ApiRequest::put("/webhook")
                    .query("token", handle.token())
                    .json(payload.clone()),
            )
            .await?;
        Ok(envelope.into_data())
    }

    /// Submit a local file to a handle's webhook with retry.
    ///
    /// The core submission path: size-tiered escalating timeouts,
    /// progressive backoff, terminal errors propagated on first
    /// occurrence. See [`crate::submit`] for the full contract. Works with
    /// either handle type — a [`TaskHandle`] for the designed one-shot
    /// flow, a [`PipelineHandle`] for repeated submissions to a persistent
    /// pipeline.
    pub async fn submit_file<H: Handle>(
        &self,
        handle: &H,
        path: impl AsRef<Path>,
        opts: &SubmitOptions,
    ) -> Result<ProcessingResult, DtcError> {
        orchestrator::submit_file(
            &self.transport,
            handle.token(),
            path.as_ref(),
            opts,
            self.config.max_attempts,
        )
        .await
    }

    // ── Services ─────────────────────────────────────────────────────────

    /// List available services, optionally filtered by name
    /// (`GET /services`).
    pub async fn services(&self, name: Option<&str>) -> Result<Vec<ServiceInfo>, DtcError> {
        let mut request = ApiRequest::get("/services");
        if let Some(name) = name {
            request = request.query("service", name);
        }
        let data = self.call(request).await?.into_data();
        let entries = match data {
            Value::Array(entries) => entries,
            Value::Null => Vec::new(),
            single => vec![single],
        };
        Ok(entries
            .into_iter()
            .map(|entry| serde_json::from_value(entry).unwrap_or_default())
            .collect())
    }

    // ── High-level flows ─────────────────────────────────────────────────

    /// Process one document end to end: start a webhook-source parsing
    /// task, give the webhook source a moment to come up, then submit the
    /// file through the retry orchestrator.
    pub async fn process_document(
        &self,
        path: impl AsRef<Path>,
        opts: &SubmitOptions,
    ) -> Result<ProcessingResult, DtcError> {
        let path = path.as_ref();
        let spec = PipelineSpec::webhook_parser("document-processor");
        let task = self
            .execute_task(&spec, Some(&task_name_for(path)), None)
            .await?;

        let warmup = Duration::from_secs(self.config.task_warmup_secs);
        if !warmup.is_zero() {
            debug!("Waiting {}s for webhook source of {task}", warmup.as_secs());
            sleep(warmup).await;
        }

        self.submit_file(&task, path, opts).await
    }

    /// Process several documents concurrently, each on its own one-shot
    /// task. Results come back in input order; one failed document never
    /// aborts the rest.
    pub async fn process_documents(
        &self,
        paths: &[PathBuf],
        opts: &SubmitOptions,
        concurrency: usize,
    ) -> Vec<Result<ProcessingResult, DtcError>> {
        let mut indexed: Vec<(usize, Result<ProcessingResult, DtcError>)> =
            stream::iter(paths.iter().enumerate().map(|(i, path)| async move {
                (i, self.process_document(path, opts).await)
            }))
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        indexed.sort_by_key(|(i, _)| *i);
        indexed.into_iter().map(|(_, result)| result).collect()
    }
}

/// Pull the handle token out of a creation response. The service answers
/// with either `{ "token": "…" }` or a bare token string.
fn token_from(data: Value) -> Option<String> {
    match data {
        Value::Object(map) => map
            .get("token")
            .and_then(Value::as_str)
            .map(str::to_owned),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        _ => None,
    }
}

/// Task name for a document submission, unique enough for the dashboard.
fn task_name_for(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_owned());
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("process_{stem}_{ts}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::ScriptedTransport;
    use serde_json::json;
    use std::io::Write;

    fn config() -> ClientConfig {
        ClientConfig::builder()
            .api_key("test-key")
            .task_warmup_secs(0)
            .build()
            .unwrap()
    }

    fn client_with(script: Vec<Result<crate::transport::RawResponse, DtcError>>) -> (DtcClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(script));
        let client = DtcClient::with_transport(config(), transport.clone());
        (client, transport)
    }

    #[tokio::test]
    async fn version_handles_plain_text_body() {
        let (client, _) = client_with(vec![Ok(crate::transport::RawResponse {
            status: 200,
            body: b"1.4.2".to_vec(),
        })]);
        assert_eq!(client.version().await.unwrap(), "1.4.2");
    }

    #[tokio::test]
    async fn create_pipeline_extracts_token_from_object() {
        let (client, transport) = client_with(vec![ScriptedTransport::ok(
            json!({ "status": "OK", "data": { "token": "pipe-1" } }),
        )]);
        let handle = client
            .create_pipeline(&PipelineSpec::webhook_parser("p"), Some("ingest"))
            .await
            .unwrap();
        assert_eq!(handle.token(), "pipe-1");

        let req = &transport.requests()[0];
        assert_eq!(req.path, "/pipe");
        assert!(!req.raw_auth);
        assert!(req
            .query
            .contains(&("name".to_owned(), "ingest".to_owned())));
    }

    #[tokio::test]
    async fn create_pipeline_accepts_bare_string_token() {
        let (client, _) = client_with(vec![ScriptedTransport::ok(
            json!({ "status": "OK", "data": "  pipe-2  " }),
        )]);
        let handle = client
            .create_pipeline(&PipelineSpec::webhook_parser("p"), None)
            .await
            .unwrap();
        assert_eq!(handle.token(), "pipe-2");
    }

    #[tokio::test]
    async fn create_pipeline_without_token_is_a_pipeline_error() {
        let (client, _) = client_with(vec![ScriptedTransport::ok(
            json!({ "status": "OK", "data": {} }),
        )]);
        let err = client
            .create_pipeline(&PipelineSpec::webhook_parser("p"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DtcError::Pipeline { .. }));
    }

    #[tokio::test]
    async fn execute_task_rejects_bad_thread_counts_without_a_round_trip() {
        let (client, transport) = client_with(vec![]);
        for threads in [0u8, 17] {
            let err = client
                .execute_task(&PipelineSpec::webhook_parser("p"), None, Some(threads))
                .await
                .unwrap_err();
            assert!(matches!(err, DtcError::Validation { .. }));
        }
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn task_status_parses_the_payload() {
        let (client, _) = client_with(vec![ScriptedTransport::ok(json!({
            "status": "OK",
            "data": { "status": "running", "progress": 0.4, "name": "ingest" }
        }))]);
        let info = client
            .task_status(&TaskHandle::new("t-1"))
            .await
            .unwrap();
        assert_eq!(info.status, TaskStatus::Running);
        assert_eq!(info.progress, Some(0.4));
        assert_eq!(info.name.as_deref(), Some("ingest"));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_task_polls_until_completed() {
        let (client, transport) = client_with(vec![
            ScriptedTransport::ok(json!({ "status": "OK", "data": { "status": "pending" } })),
            ScriptedTransport::ok(json!({ "status": "OK", "data": { "status": "running" } })),
            ScriptedTransport::ok(json!({ "status": "OK", "data": { "status": "completed" } })),
        ]);
        let info = client
            .wait_for_task(
                &TaskHandle::new("t-1"),
                Duration::from_secs(5),
                Duration::from_secs(300),
            )
            .await
            .unwrap();
        assert_eq!(info.status, TaskStatus::Completed);
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_task_times_out() {
        let (client, transport) = client_with(vec![
            ScriptedTransport::ok(json!({ "status": "OK", "data": { "status": "pending" } })),
            ScriptedTransport::ok(json!({ "status": "OK", "data": { "status": "pending" } })),
        ]);
        let err = client
            .wait_for_task(
                &TaskHandle::new("t-1"),
                Duration::from_secs(5),
                Duration::from_secs(7),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DtcError::Timeout { .. }));
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn wait_for_task_surfaces_failure_message() {
        let (client, _) = client_with(vec![ScriptedTransport::ok(json!({
            "status": "OK",
            "data": { "status": "failed", "error_message": "parser exploded" }
        }))]);
        let err = client
            .wait_for_task(
                &TaskHandle::new("t-1"),
                Duration::from_secs(5),
                Duration::from_secs(60),
            )
            .await
            .unwrap_err();
        match err {
            DtcError::Task { message } => assert!(message.contains("parser exploded")),
            other => panic!("expected Task, got {other}"),
        }
    }

    #[tokio::test]
    async fn services_normalises_a_single_object_to_a_list() {
        let (client, _) = client_with(vec![ScriptedTransport::ok(json!({
            "status": "OK",
            "data": { "name": "parse", "status": "up", "version": "2.1" }
        }))]);
        let services = client.services(Some("parse")).await.unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "parse");
        assert_eq!(services[0].version.as_deref(), Some("2.1"));
    }

    #[tokio::test(start_paused = true)]
    async fn process_document_creates_a_task_then_submits() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"hello").unwrap();
        file.flush().unwrap();

        let (client, transport) = client_with(vec![
            ScriptedTransport::ok(json!({ "status": "OK", "data": { "token": "task-7" } })),
            ScriptedTransport::ok(json!({
                "status": "OK",
                "data": {
                    "objectsRequested": 1,
                    "objectsCompleted": 1,
                    "objects": { "o": { "text": ["hello"], "metadata": {} } }
                }
            })),
        ]);

        let result = client
            .process_document(file.path(), &SubmitOptions::new())
            .await
            .unwrap();
        assert_eq!(result.extracted_text, "hello");

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].path, "/task");
        assert!(!requests[0].raw_auth);
        assert_eq!(requests[1].path, "/webhook");
        assert!(requests[1].raw_auth);
        assert!(requests[1]
            .query
            .contains(&("token".to_owned(), "task-7".to_owned())));
    }

    #[tokio::test(start_paused = true)]
    async fn process_documents_isolates_per_file_failures() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"only good file").unwrap();
        file.flush().unwrap();

        // Sequential (concurrency 1) so the scripted responses line up:
        // task + webhook for the good file, then a task for the bad file
        // whose submission dies locally on the missing path.
        let (client, transport) = client_with(vec![
            ScriptedTransport::ok(json!({ "status": "OK", "data": { "token": "task-a" } })),
            ScriptedTransport::ok(json!({
                "status": "OK",
                "data": {
                    "objects": { "o": { "text": ["only good file"], "metadata": {} } }
                }
            })),
            ScriptedTransport::ok(json!({ "status": "OK", "data": { "token": "task-b" } })),
        ]);

        let paths = vec![
            file.path().to_path_buf(),
            PathBuf::from("/no/such/file.docx"),
        ];
        let results = client
            .process_documents(&paths, &SubmitOptions::new(), 1)
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].as_ref().unwrap().extracted_text,
            "only good file"
        );
        assert!(matches!(
            results[1].as_ref().unwrap_err(),
            DtcError::FileAccess { .. }
        ));
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn send_webhook_returns_the_data_payload() {
        let (client, transport) = client_with(vec![ScriptedTransport::ok(json!({
            "status": "OK",
            "data": { "received": true }
        }))]);
        let data = client
            .send_webhook(&TaskHandle::new("t-1"), &json!({ "kind": "ping" }))
            .await
            .unwrap();
        assert_eq!(data["received"], true);
        // Structured webhook payloads ride the bearer-auth path.
        assert!(!transport.requests()[0].raw_auth);
    }
}
