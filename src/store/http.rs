use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde_json::Value;

use super::{StoreOperation, SubmissionStore};
use crate::core::config::Settings;
use crate::core::metrics;
use crate::domain::models::{AssignmentDescriptor, AttachedFile, SubmissionRecord, SubmissionWrite};
use crate::errors::SubmissionError;
use crate::schemas::assignment::decode_assignment;
use crate::schemas::submission::{
    decode_optional_submission, decode_submission, remote_attachments, SubmissionWritePayload,
};

#[derive(Debug, Clone)]
pub struct HttpSubmissionStore {
    client: Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl HttpSubmissionStore {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(
            &settings.api().base_url,
            settings.api().bearer_token.clone(),
            settings.http().request_timeout(),
            settings.http().connect_timeout(),
        )
    }

    pub fn new(
        base_url: &str,
        bearer_token: Option<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .context("Failed to build EDUMON HTTP client")?;

        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid EDUMON API base url: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("EDUMON API base url cannot hold a path: {base_url}");
        }

        Ok(Self { client, base_url, bearer_token })
    }

    /// Appends `segments` to the base path. Each segment is percent-encoded, so ids
    /// containing `/`, `?` or `#` stay inside their own segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let builder = self.client.request(method, self.url(segments));
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and returns the status with the raw body, mapping transport
    /// failures and recording metrics.
    async fn send(
        &self,
        operation: StoreOperation,
        builder: RequestBuilder,
    ) -> Result<(StatusCode, String), SubmissionError> {
        let timer = Instant::now();
        let result = async {
            let response = builder.send().await.map_err(transport_error)?;
            let status = response.status();
            let body = response.text().await.map_err(transport_error)?;
            Ok((status, body))
        }
        .await;

        let outcome = match &result {
            Ok((status, _)) if status.is_success() => "success",
            Ok(_) => "rejected",
            Err(SubmissionError::Network { timed_out: true, .. }) => "timeout",
            Err(_) => "transport_error",
        };
        metrics::record_store_call(operation.as_str(), outcome, timer.elapsed());

        match &result {
            Ok((status, _)) => tracing::debug!(
                operation = operation.as_str(),
                status = status.as_u16(),
                elapsed_ms = timer.elapsed().as_millis() as u64,
                "Store request completed"
            ),
            Err(err) => tracing::warn!(
                operation = operation.as_str(),
                error = %err,
                "Store request failed"
            ),
        }

        result
    }

    async fn write_request(
        &self,
        method: Method,
        segments: &[&str],
        write: &SubmissionWrite,
    ) -> Result<RequestBuilder, SubmissionError> {
        let builder = self.request(method, segments);
        if write.has_local_files() {
            Ok(builder.multipart(multipart_form(write).await?))
        } else {
            Ok(builder.json(&SubmissionWritePayload::from_write(write)))
        }
    }
}

#[async_trait]
impl SubmissionStore for HttpSubmissionStore {
    async fn fetch_assignment(
        &self,
        assignment_id: &str,
    ) -> Result<AssignmentDescriptor, SubmissionError> {
        let builder = self.request(Method::GET, &["assignment", assignment_id]);
        let (status, body) = self.send(StoreOperation::FetchAssignment, builder).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(SubmissionError::NotFound(format!("assignment {assignment_id}")));
        }
        ensure_success(status, &body)?;
        Ok(decode_assignment(&body)?)
    }

    async fn find_submission(
        &self,
        assignment_id: &str,
        author_id: &str,
    ) -> Result<Option<SubmissionRecord>, SubmissionError> {
        let builder = self
            .request(Method::GET, &["submission"])
            .query(&[("assignmentId", assignment_id), ("authorId", author_id)]);
        let (status, body) = self.send(StoreOperation::FindSubmission, builder).await?;
        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        ensure_success(status, &body)?;
        Ok(decode_optional_submission(&body)?)
    }

    async fn create_submission(
        &self,
        write: &SubmissionWrite,
    ) -> Result<SubmissionRecord, SubmissionError> {
        let builder = self.write_request(Method::POST, &["submission"], write).await?;
        let (status, body) = self.send(StoreOperation::Create, builder).await?;
        ensure_success(status, &body)?;
        Ok(decode_submission(&body)?)
    }

    async fn update_submission(
        &self,
        submission_id: &str,
        write: &SubmissionWrite,
    ) -> Result<SubmissionRecord, SubmissionError> {
        let builder =
            self.write_request(Method::PATCH, &["submission", submission_id], write).await?;
        let (status, body) = self.send(StoreOperation::Update, builder).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(SubmissionError::NotFound(format!("submission {submission_id}")));
        }
        ensure_success(status, &body)?;
        Ok(decode_submission(&body)?)
    }

    async fn submit_submission(
        &self,
        submission_id: &str,
    ) -> Result<SubmissionRecord, SubmissionError> {
        let builder = self.request(Method::POST, &["submission", submission_id, "submit"]);
        let (status, body) = self.send(StoreOperation::Submit, builder).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(SubmissionError::NotFound(format!("submission {submission_id}")));
        }
        ensure_success(status, &body)?;
        Ok(decode_submission(&body)?)
    }

    async fn delete_submission(&self, submission_id: &str) -> Result<(), SubmissionError> {
        let builder = self.request(Method::DELETE, &["submission", submission_id]);
        let (status, body) = self.send(StoreOperation::Delete, builder).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(SubmissionError::NotFound(format!("submission {submission_id}")));
        }
        ensure_success(status, &body)
    }
}

async fn multipart_form(write: &SubmissionWrite) -> Result<Form, SubmissionError> {
    let kept = serde_json::to_string(&remote_attachments(&write.attached_files))
        .map_err(|err| SubmissionError::Decode(err.to_string()))?;

    let mut form = Form::new()
        .text("assignmentId", write.assignment_id.clone())
        .text("authorId", write.author_id.clone())
        .text("attachedFiles", kept);
    if let Some(text) = &write.text_response {
        form = form.text("textResponse", text.clone());
    }
    if let Some(link) = &write.link_response {
        form = form.text("linkResponse", link.clone());
    }

    for file in &write.attached_files {
        let AttachedFile::Local { path, display_name, mime_type } = file else {
            continue;
        };
        let bytes = tokio::fs::read(path).await.map_err(|err| SubmissionError::LocalFile {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        let mut part = Part::bytes(bytes).file_name(display_name.clone());
        if let Some(mime) = mime_type {
            part = part.mime_str(mime).map_err(|err| SubmissionError::LocalFile {
                path: path.display().to_string(),
                message: err.to_string(),
            })?;
        }
        form = form.part("files", part);
    }

    Ok(form)
}

fn transport_error(err: reqwest::Error) -> SubmissionError {
    if err.is_timeout() {
        SubmissionError::timeout(err.to_string())
    } else {
        SubmissionError::network(err.to_string())
    }
}

fn ensure_success(status: StatusCode, body: &str) -> Result<(), SubmissionError> {
    if status.is_success() {
        return Ok(());
    }
    Err(SubmissionError::Server { status: status.as_u16(), message: extract_error_message(body) })
}

fn extract_error_message(body: &str) -> String {
    let Ok(payload) = serde_json::from_str::<Value>(body) else {
        let trimmed = body.trim();
        return if trimmed.is_empty() { "unknown_error".to_string() } else { trimmed.to_string() };
    };

    if let Some(detail) = payload.get("detail") {
        if let Some(text) = detail.as_str() {
            return text.to_string();
        }
        if let Some(items) = detail.as_array() {
            let joined = items
                .iter()
                .filter_map(|item| {
                    item.get("msg")
                        .and_then(Value::as_str)
                        .or_else(|| item.get("message").and_then(Value::as_str))
                })
                .collect::<Vec<_>>()
                .join("; ");
            if !joined.is_empty() {
                return joined;
            }
        }
    }

    payload
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| payload.get("error").and_then(Value::as_str))
        .unwrap_or("unknown_error")
        .to_string()
}
