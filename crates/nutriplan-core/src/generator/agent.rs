//! Free-text plan generator backed by the agent query endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http::{build_client, endpoint, parse_base_url, success_body};
use super::text::response_from_text;
use super::{GenerationError, GenerationRequest, GenerationResponse, PlanGenerator};
use crate::continuation::StartState;
use crate::profile::CompleteProfile;

/// Weeks requested per agent query.
pub const WEEKS_PER_QUERY: i32 = 4;

#[derive(Debug, Serialize)]
struct AgentQuery<'a> {
    user_id: &'a str,
    query: String,
}

#[derive(Debug, Deserialize)]
struct AgentReply {
    response: Option<String>,
}

/// Calls `POST {base}/agent/query` and parses the free-text reply.
#[derive(Debug, Clone)]
pub struct AgentQueryGenerator {
    client: Client,
    base_url: Url,
}

impl AgentQueryGenerator {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GenerationError> {
        Self::with_client(build_client(timeout)?, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, GenerationError> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
        })
    }
}

/// Natural-language request for the next batch of weeks.
pub fn query_text(profile: &CompleteProfile, first_week: i32) -> String {
    format!(
        "Generate my meal plan for weeks {first_week}-{} based on my goal to {} from weight {} to {} over {} months",
        first_week + WEEKS_PER_QUERY - 1,
        profile.goal,
        profile.weight_kg,
        profile.target_weight_kg,
        profile.tenure_months,
    )
}

#[async_trait]
impl PlanGenerator for AgentQueryGenerator {
    fn name(&self) -> &str {
        "agent"
    }

    async fn generate(
        &self,
        profile: &CompleteProfile,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let start = request.start_state.unwrap_or(StartState {
            weight: profile.weight_kg,
            week_offset: 0,
        });
        let body = AgentQuery {
            user_id: &profile.user_id,
            query: query_text(profile, start.week_offset + 1),
        };
        let url = endpoint(&self.base_url, &["agent", "query"])?;
        debug!(%url, query = %body.query, "querying plan agent");

        let response = self.client.post(url).json(&body).send().await?;
        let text = success_body(response).await?;
        let reply: AgentReply = serde_json::from_str(&text)?;
        let raw = reply
            .response
            .ok_or(GenerationError::MissingField("response"))?;

        let decoded = response_from_text(&raw, profile, start)?;
        info!(
            user_id = %profile.user_id,
            weeks = decoded.weeks.len(),
            end_week = decoded.end_state.week_offset,
            "agent plan parsed"
        );
        Ok(decoded)
    }
}
