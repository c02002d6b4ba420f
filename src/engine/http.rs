//! HTTP client for the remote processing engine.
//!
//! # Wire format
//!
//! Upload is a multipart form with a single `csv` file part; the engine
//! answers `{"csv_path": ..., "html": ...}`.
//!
//! Execute posts `{"csv_path": ..., "steps": [...]}` and receives an object
//! keyed by step id (each with an `html` fragment) plus `latest_csv`, the
//! updated data handle. A rejected pipeline comes back as
//! `{"error": ..., "blocked_step": ...}` with either a 200 or a 4xx status.
use super::{
    check_dataset_path, DataHandle, Engine, ExecuteRequest, ExecuteResponse, ExecutionResult,
    UploadReceipt,
};
use crate::catalog::Step;
use crate::config::EngineConfig;
use crate::error::SequencerError;
use crate::util::truncate_string;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use ureq::Agent;

const UPLOAD_FIELD: &str = "csv";
const ERROR_BODY_PREVIEW_BYTES: usize = 200;

pub struct HttpEngine {
    agent: Agent,
    execute_url: String,
    upload_url: String,
}

impl HttpEngine {
    pub fn new(config: &EngineConfig) -> Self {
        let agent_config = Agent::config_builder()
            .timeout_global(Some(Duration::from_millis(config.timeout_ms)))
            .http_status_as_error(false)
            .build();
        let agent: Agent = agent_config.into();
        let base = config.base_url.trim_end_matches('/');
        Self {
            agent,
            execute_url: format!("{base}{}", config.execute_path),
            upload_url: format!("{base}{}", config.upload_path),
        }
    }
}

impl Engine for HttpEngine {
    fn upload(&self, dataset: &Path) -> Result<UploadReceipt, SequencerError> {
        check_dataset_path(dataset)?;
        let bytes = fs::read(dataset).map_err(|err| SequencerError::UploadFailed {
            message: format!("read {}: {err}", dataset.display()),
        })?;
        let file_name = dataset
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset.csv".to_string());
        let boundary = multipart_boundary();
        let body = multipart_body(&boundary, &file_name, &bytes);
        let content_type = format!("multipart/form-data; boundary={boundary}");

        let start = Instant::now();
        let (status, text) = self
            .agent
            .post(&self.upload_url)
            .header("Content-Type", content_type.as_str())
            .send(&body[..])
            .and_then(|mut response| {
                let status = response.status().as_u16();
                let text = response.body_mut().read_to_string()?;
                Ok((status, text))
            })
            .map_err(|err| SequencerError::UploadFailed {
                message: format!("POST {}: {err}", self.upload_url),
            })?;
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            status,
            dataset_bytes = bytes.len(),
            "engine upload complete"
        );

        let value = parse_json_body(status, &text)
            .map_err(|message| SequencerError::UploadFailed { message })?;
        parse_upload_response(status, &value)
    }

    fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, SequencerError> {
        let start = Instant::now();
        let (status, text) = self
            .agent
            .post(&self.execute_url)
            .send_json(request)
            .and_then(|mut response| {
                let status = response.status().as_u16();
                let text = response.body_mut().read_to_string()?;
                Ok((status, text))
            })
            .map_err(|err| SequencerError::remote(format!("POST {}: {err}", self.execute_url)))?;
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            status,
            steps = request.steps.len(),
            response_bytes = text.len(),
            "engine execute complete"
        );

        let value = parse_json_body(status, &text).map_err(SequencerError::remote)?;
        parse_execute_response(status, &value)
    }
}

fn parse_json_body(status: u16, text: &str) -> Result<Value, String> {
    serde_json::from_str(text).map_err(|err| {
        format!(
            "engine returned HTTP {status} with a non-JSON body ({err}): {}",
            truncate_string(text.trim(), ERROR_BODY_PREVIEW_BYTES)
        )
    })
}

fn error_message(value: &Value) -> Option<String> {
    value
        .get("error")
        .and_then(Value::as_str)
        .map(|message| message.to_string())
}

/// Decode an upload response body.
pub(crate) fn parse_upload_response(
    status: u16,
    value: &Value,
) -> Result<UploadReceipt, SequencerError> {
    if let Some(message) = error_message(value) {
        return Err(SequencerError::UploadFailed { message });
    }
    if !(200..300).contains(&status) {
        return Err(SequencerError::UploadFailed {
            message: format!("engine returned HTTP {status}"),
        });
    }
    let data_handle = value
        .get("csv_path")
        .and_then(Value::as_str)
        .filter(|handle| !handle.is_empty())
        .ok_or_else(|| SequencerError::UploadFailed {
            message: "upload response missing csv_path".to_string(),
        })?;
    let summary_html = value
        .get("html")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(UploadReceipt {
        data_handle: DataHandle::new(data_handle),
        summary_html,
    })
}

/// Decode an execute response body into per-step results and the new handle.
///
/// Keys that are not step identifiers (such as `latest_csv`) are skipped.
pub(crate) fn parse_execute_response(
    status: u16,
    value: &Value,
) -> Result<ExecuteResponse, SequencerError> {
    if let Some(message) = error_message(value) {
        let blocked_step = value
            .get("blocked_step")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse::<Step>().ok());
        return Err(SequencerError::RemoteExecutionFailure {
            message,
            blocked_step,
        });
    }
    if !(200..300).contains(&status) {
        return Err(SequencerError::remote(format!("engine returned HTTP {status}")));
    }
    let object = value
        .as_object()
        .ok_or_else(|| SequencerError::remote("engine response is not a JSON object"))?;

    let mut results = BTreeMap::new();
    for (key, entry) in object {
        let Ok(step) = key.parse::<Step>() else {
            continue;
        };
        let html = entry
            .get("html")
            .and_then(Value::as_str)
            .unwrap_or_default();
        results.insert(step, ExecutionResult::fragment(step, html));
    }
    let data_handle = object
        .get("latest_csv")
        .and_then(Value::as_str)
        .filter(|handle| !handle.is_empty())
        .map(DataHandle::new);
    Ok(ExecuteResponse {
        results,
        data_handle,
    })
}

fn multipart_boundary() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    format!("normflow-{:x}-{nanos:x}", std::process::id())
}

pub(crate) fn multipart_body(boundary: &str, file_name: &str, contents: &[u8]) -> Vec<u8> {
    let safe_name = file_name.replace('"', "_");
    let mut body = Vec::with_capacity(contents.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{UPLOAD_FIELD}\"; filename=\"{safe_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/csv\r\n\r\n");
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
