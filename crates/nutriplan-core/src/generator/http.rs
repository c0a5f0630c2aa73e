//! Structured JSON plan generator over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use tracing::{debug, info};

use super::{GenerationError, GenerationRequest, GenerationResponse, PlanGenerator, decode_response};
use crate::profile::CompleteProfile;

/// Error bodies the service may send with a non-2xx status.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    detail: Option<String>,
}

/// Build a client with the given request timeout.
pub fn build_client(timeout: Duration) -> Result<Client, GenerationError> {
    Ok(Client::builder()
        .connect_timeout(Duration::from_secs(10).min(timeout))
        .timeout(timeout)
        .build()?)
}

/// Parse a generator base URL. It must be able to take path segments.
pub fn parse_base_url(base: &str) -> Result<Url, GenerationError> {
    let url = Url::parse(base).map_err(|e| GenerationError::InvalidUrl(format!("{base}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(GenerationError::InvalidUrl(format!("{base}: not a base URL")));
    }
    Ok(url)
}

/// `base` with `segments` appended, each percent-encoded as one segment.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, GenerationError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| GenerationError::InvalidUrl(format!("{base}: not a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a response into its body text, mapping failures to
/// [`GenerationError::Rejected`] (service-reported) or
/// [`GenerationError::Status`].
pub(crate) async fn success_body(response: Response) -> Result<String, GenerationError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        return Ok(body);
    }
    if let Ok(ErrorBody { error, detail }) = serde_json::from_str::<ErrorBody>(&body) {
        if let Some(message) = error.or(detail) {
            return Err(GenerationError::Rejected(message));
        }
    }
    Err(GenerationError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Calls `POST {base}/plans/{user_id}/generate`.
#[derive(Debug, Clone)]
pub struct HttpPlanGenerator {
    client: Client,
    base_url: Url,
}

impl HttpPlanGenerator {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GenerationError> {
        Self::with_client(build_client(timeout)?, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, GenerationError> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
        })
    }

    fn generate_url(&self, user_id: &str) -> Result<Url, GenerationError> {
        endpoint(&self.base_url, &["plans", user_id, "generate"])
    }
}

#[async_trait]
impl PlanGenerator for HttpPlanGenerator {
    fn name(&self) -> &str {
        "structured"
    }

    async fn generate(
        &self,
        profile: &CompleteProfile,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let url = self.generate_url(&profile.user_id)?;
        debug!(%url, start_state = ?request.start_state, "requesting plan batch");

        let response = self.client.post(url).json(request).send().await?;
        let body = success_body(response).await?;
        let mut decoded = decode_response(&body)?;
        decoded.fill_missing_targets(profile);

        info!(
            user_id = %profile.user_id,
            weeks = decoded.weeks.len(),
            end_week = decoded.end_state.week_offset,
            "plan batch received"
        );
        Ok(decoded)
    }
}
