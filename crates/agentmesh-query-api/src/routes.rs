//! HTTP handlers for the read-only query surface.

use axum::extract::State;
use axum::{routing::get, routing::post, Json, Router};
use axum_extra::extract::Query as ExtraQuery;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use agentmesh_types::{Agent, GraphSnapshot, GraphStats, Insight};

use crate::error::{Error, Result};
use crate::filters::{InsightFilter, InsightQueryParams};
use crate::state::AppState;

const NATURAL_LANGUAGE_QUERY_LIMIT: usize = 10;
const NATURAL_LANGUAGE_MIN_CONFIDENCE: f64 = 0.5;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/insights", get(get_insights))
        .route("/api/insights/search", post(search_insights))
        .route("/api/query", post(natural_language_query))
        .route("/api/agents", get(agents))
        .route("/api/topology", get(topology))
        .route("/api/topology/stats", get(topology_stats))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    timestamp: chrono::DateTime<Utc>,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "agentmesh-query-api",
        timestamp: Utc::now(),
    })
}

#[derive(Serialize)]
struct InsightsResponse {
    query: serde_json::Value,
    insights: Vec<Insight>,
    count: usize,
    timestamp: chrono::DateTime<Utc>,
}

async fn get_insights(
    State(state): State<AppState>,
    ExtraQuery(params): ExtraQuery<InsightQueryParams>,
) -> Result<Json<InsightsResponse>> {
    validate_confidence(params.min_confidence)?;
    let filter: InsightFilter = params.into();
    let query = serde_json::to_value(&filter).unwrap_or(json!({}));
    let insights = filter.apply(all_insights(&state).await?);
    Ok(Json(InsightsResponse {
        count: insights.len(),
        insights,
        query,
        timestamp: Utc::now(),
    }))
}

async fn search_insights(
    State(state): State<AppState>,
    Json(filter): Json<InsightFilter>,
) -> Result<Json<InsightsResponse>> {
    validate_confidence(filter.min_confidence)?;
    let query = serde_json::to_value(&filter).unwrap_or(json!({}));
    let insights = filter.apply(all_insights(&state).await?);
    Ok(Json(InsightsResponse {
        count: insights.len(),
        insights,
        query,
        timestamp: Utc::now(),
    }))
}

#[derive(Deserialize)]
struct NaturalLanguageQuery {
    question: String,
}

#[derive(Serialize)]
struct NaturalLanguageResponse {
    question: String,
    insights: Vec<Insight>,
    count: usize,
    timestamp: chrono::DateTime<Utc>,
}

/// Keyword match over insight topic/content/tags. Vector-similarity
/// retrieval is a future hook, not part of this contract.
async fn natural_language_query(
    State(state): State<AppState>,
    Json(body): Json<NaturalLanguageQuery>,
) -> Result<Json<NaturalLanguageResponse>> {
    if body.question.trim().is_empty() {
        return Err(Error::InvalidParams("question must not be empty".to_string()));
    }
    let keywords: Vec<String> = body
        .question
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let mut matched: Vec<Insight> = all_insights(&state)
        .await?
        .into_iter()
        .filter(|i| i.confidence >= NATURAL_LANGUAGE_MIN_CONFIDENCE)
        .filter(|i| matches_keywords(i, &keywords))
        .collect();
    matched.truncate(NATURAL_LANGUAGE_QUERY_LIMIT);

    Ok(Json(NaturalLanguageResponse {
        count: matched.len(),
        insights: matched,
        question: body.question,
        timestamp: Utc::now(),
    }))
}

fn matches_keywords(insight: &Insight, keywords: &[String]) -> bool {
    let haystack = format!(
        "{} {} {}",
        insight.topic.to_lowercase(),
        insight.content.to_lowercase(),
        insight.tags.join(" ").to_lowercase()
    );
    keywords.iter().any(|k| haystack.contains(k.as_str()))
}

#[derive(Serialize)]
struct AgentsResponse {
    agents: Vec<Agent>,
    count: usize,
    timestamp: chrono::DateTime<Utc>,
}

async fn agents(State(state): State<AppState>) -> Result<Json<AgentsResponse>> {
    let snapshot = latest_snapshot(&state).await?;
    let agents: Vec<Agent> = snapshot
        .agents
        .into_values()
        .filter(|a| a.status == agentmesh_types::AgentStatus::Active)
        .collect();
    Ok(Json(AgentsResponse {
        count: agents.len(),
        agents,
        timestamp: Utc::now(),
    }))
}

async fn topology(State(state): State<AppState>) -> Result<Json<GraphSnapshot>> {
    Ok(Json(latest_snapshot(&state).await?))
}

async fn topology_stats(State(state): State<AppState>) -> Result<Json<GraphStats>> {
    Ok(Json(latest_snapshot(&state).await?.stats))
}

fn validate_confidence(min_confidence: Option<f64>) -> Result<()> {
    match min_confidence {
        Some(c) if !(0.0..=1.0).contains(&c) => {
            Err(Error::InvalidParams(format!("min_confidence must be in [0,1], got {c}")))
        }
        _ => Ok(()),
    }
}

async fn latest_snapshot(state: &AppState) -> Result<GraphSnapshot> {
    state
        .store
        .get::<GraphSnapshot>(&agentmesh_store::graph_snapshot_key())
        .await?
        .ok_or_else(|| Error::NotFound("no topology snapshot has been persisted yet".to_string()))
}

async fn all_insights(state: &AppState) -> Result<Vec<Insight>> {
    let keys = state.store.keys("insight:*").await?;
    let mut insights = Vec::with_capacity(keys.len());
    for key in keys {
        if let Some(insight) = state.store.get::<Insight>(&key).await? {
            insights.push(insight);
        }
    }
    insights.sort_by_key(|i| i.created_at);
    Ok(insights)
}
