//! reqwest implementation of the animation service wire contract
//!
//! All uploads are multipart form bodies. Submissions answer HTTP 202 with a
//! JSON job id; polls answer 200 with `{"state": ...}`; fetches answer 200
//! with raw bytes. Any other status is an error, logged with status and body.

use crate::{AnimationService, ClientError, JobHandle, JobStatus, MotionOptions};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use storycast_core::{Artifact, ArtifactKind, StyleTag};

const SUBMIT_ACCEPTED: u16 = 202;
const FETCH_OK: u16 = 200;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct WaspClientConfig {
    /// Base URL of the animation service
    pub base_url: String,
    /// Per-request timeout; uploads of large motion files need headroom
    pub request_timeout: Duration,
}

impl Default for WaspClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    state: String,
}

/// Client for the WASP-style animation service
pub struct WaspClient {
    config: WaspClientConfig,
    http: reqwest::Client,
}

impl WaspClient {
    pub fn new(config: WaspClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Decode {
                endpoint: config.base_url.clone(),
                detail: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { config, http })
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::new(WaspClientConfig {
            base_url: base_url.into(),
            ..Default::default()
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn artifact_part(artifact: &Artifact) -> Result<Part, ClientError> {
        Part::bytes(artifact.bytes.clone())
            .file_name(artifact.upload_name())
            .mime_str(artifact.kind.content_type())
            .map_err(|e| ClientError::Decode {
                endpoint: "multipart".to_string(),
                detail: e.to_string(),
            })
    }

    /// Check the response status, logging status and body on mismatch
    async fn expect_status(
        endpoint: &str,
        response: reqwest::Response,
        expected: u16,
    ) -> Result<reqwest::Response, ClientError> {
        let status = response.status().as_u16();
        if status == expected {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::error!(endpoint, status, body = %body, "animation service request failed");
        Err(ClientError::Status {
            endpoint: endpoint.to_string(),
            status,
            body,
        })
    }

    /// Submissions return the job id as a bare JSON string; tolerate an
    /// object wrapper with a `job_id`/`id` field as well
    async fn read_job_handle(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<JobHandle, ClientError> {
        let value: serde_json::Value =
            response.json().await.map_err(|e| ClientError::Decode {
                endpoint: endpoint.to_string(),
                detail: e.to_string(),
            })?;
        let id = match &value {
            serde_json::Value::String(id) => Some(id.clone()),
            serde_json::Value::Object(map) => map
                .get("job_id")
                .or_else(|| map.get("id"))
                .and_then(|v| v.as_str())
                .map(String::from),
            _ => None,
        };
        id.map(JobHandle::new).ok_or_else(|| ClientError::Decode {
            endpoint: endpoint.to_string(),
            detail: format!("no job id in response: {value}"),
        })
    }

    async fn submit(&self, endpoint: &str, form: Form) -> Result<JobHandle, ClientError> {
        let response = self
            .http
            .post(self.url(endpoint))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                endpoint: endpoint.to_string(),
                source: e,
            })?;
        let response = Self::expect_status(endpoint, response, SUBMIT_ACCEPTED).await?;
        Self::read_job_handle(endpoint, response).await
    }
}

#[async_trait]
impl AnimationService for WaspClient {
    async fn submit_motion(
        &self,
        audio: &Artifact,
        style: StyleTag,
        opts: &MotionOptions,
    ) -> Result<JobHandle, ClientError> {
        let seed = opts.seed.unwrap_or_else(rand::random::<u32>);
        let pose = opts
            .pose
            .clone()
            .unwrap_or_else(|| style.pose_code().to_string());

        tracing::debug!(
            style = %style,
            pose = %pose,
            seed,
            temperature = opts.temperature,
            "submitting motion job"
        );

        let form = Form::new()
            .part("audio", Self::artifact_part(audio)?)
            .text("pose", pose)
            .text("style", style.as_str())
            .text("temperature", opts.temperature.to_string())
            .text("seed", seed.to_string());

        self.submit("/generate_bvh/", form).await
    }

    async fn submit_export(&self, motion: &Artifact) -> Result<JobHandle, ClientError> {
        let form = Form::new().part("motion", Self::artifact_part(motion)?);
        self.submit("/export_fbx/", form).await
    }

    async fn submit_render(
        &self,
        motion: &Artifact,
        audio: &Artifact,
    ) -> Result<JobHandle, ClientError> {
        let form = Form::new()
            .part("motion", Self::artifact_part(motion)?)
            .part("audio", Self::artifact_part(audio)?);
        self.submit("/visualise/", form).await
    }

    async fn poll(&self, job: &JobHandle) -> Result<JobStatus, ClientError> {
        let endpoint = format!("/job_id/{job}/");
        let response = self
            .http
            .get(self.url(&endpoint))
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        let response = Self::expect_status(&endpoint, response, FETCH_OK).await?;
        let poll: PollResponse = response.json().await.map_err(|e| ClientError::Decode {
            endpoint: endpoint.clone(),
            detail: e.to_string(),
        })?;
        tracing::trace!(job = %job, state = %poll.state, "job polled");
        Ok(JobStatus::from_state(&poll.state))
    }

    async fn fetch(&self, job: &JobHandle, kind: ArtifactKind) -> Result<Artifact, ClientError> {
        let endpoint = format!("/get_files/{job}/");
        let response = self
            .http
            .get(self.url(&endpoint))
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        let response = Self::expect_status(&endpoint, response, FETCH_OK).await?;
        let bytes = response.bytes().await.map_err(|e| ClientError::Transport {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        tracing::debug!(job = %job, kind = ?kind, bytes = bytes.len(), "artifact fetched");
        Ok(Artifact::new(kind, bytes.to_vec()))
    }
}
