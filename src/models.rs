use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::quality::QScoreComponents;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 50;

/// A GitHub issue as persisted in the corpus.
///
/// Created by the ingestion collaborator; mutated only by re-ingestion
/// (upsert) or Janitor deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub node_id: String,
    pub repo_id: String,
    pub title: String,
    pub body_text: String,
    pub labels: Vec<String>,
    pub state: IssueState,
    pub number: Option<i64>,
    pub github_url: Option<String>,
    pub github_created_at: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
    /// Fixed-dimension embedding; absent until the embedding worker fills it.
    pub embedding: Option<Vec<f32>>,
    /// Heuristic quality score; may be negative.
    pub q_score: f64,
    /// Decayed quality score; always finite and > 0.
    pub survival_score: f64,
    pub has_code: bool,
    pub has_headers: bool,
    pub tech_weight: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    Open,
    Closed,
}

/// A tracked repository. Read-only from the engine's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub node_id: String,
    pub full_name: String,
    pub primary_language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub stargazer_count: i64,
}

/// Issue record as delivered by the ingestion pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestIssue {
    pub node_id: String,
    pub repo_id: String,
    pub title: String,
    pub body_text: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub state: IssueState,
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub github_url: Option<String>,
    pub github_created_at: DateTime<Utc>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    pub q_score: f64,
    pub q_components: QScoreComponents,
}

/// Multi-select filters for hybrid search.
/// ANY semantics within a filter, AND across filters; applied post-fusion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub repos: Vec<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty() && self.labels.is_empty() && self.repos.is_empty()
    }

    /// Deterministic string for cache key generation.
    fn to_cache_key(&self) -> String {
        let mut languages = self.languages.clone();
        let mut labels = self.labels.clone();
        let mut repos = self.repos.clone();
        languages.sort();
        labels.sort();
        repos.sort();
        format!(
            "languages={};labels={};repos={}",
            languages.join(","),
            labels.join(","),
            repos.join(",")
        )
    }
}

/// Search request with query, filters, and pagination.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub filters: SearchFilters,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl SearchRequest {
    /// Clamp pagination into the supported window.
    pub fn normalize(&mut self) {
        if self.page < 1 {
            self.page = 1;
        }
        if self.page_size < 1 {
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        if self.page_size > MAX_PAGE_SIZE {
            self.page_size = MAX_PAGE_SIZE;
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.page_size
    }

    /// SHA-256 fingerprint over the normalized request, used as cache key.
    pub fn fingerprint(&self) -> String {
        let key_data = format!(
            "{}|{}|{}|{}",
            self.query,
            self.filters.to_cache_key(),
            self.page,
            self.page_size
        );
        let digest = Sha256::digest(key_data.as_bytes());
        hex::encode(digest)
    }
}

/// Single search result with issue data and scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub node_id: String,
    pub title: String,
    pub body_preview: String,
    pub github_url: Option<String>,
    pub labels: Vec<String>,
    pub q_score: f64,
    pub repo_name: String,
    pub primary_language: Option<String>,
    pub github_created_at: DateTime<Utc>,
    pub rrf_score: f64,
}

/// Paginated search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub search_id: Uuid,
    pub results: Vec<SearchResultItem>,
    pub total: usize,
    /// True when a candidate pool hit its cap, i.e. recall may be incomplete.
    pub total_is_capped: bool,
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
    pub query: String,
    pub filters: SearchFilters,
}

/// Feed consumer profile, produced by out-of-scope profile collaborators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    /// Combined interest vector; absent until the profile is complete.
    #[serde(default)]
    pub combined_vector: Option<Vec<f32>>,
    #[serde(default)]
    pub preferred_languages: Vec<String>,
    #[serde(default)]
    pub min_heat_threshold: f64,
    #[serde(default)]
    pub github_languages: Vec<String>,
    #[serde(default)]
    pub preferred_topics: Vec<String>,
    #[serde(default)]
    pub github_topics: Vec<String>,
    #[serde(default)]
    pub resume_skills: Vec<String>,
}

/// One "why this was recommended" entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhyThisItem {
    pub entity: String,
    pub score: f64,
}

/// Single feed entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub node_id: String,
    pub title: String,
    pub body_preview: String,
    pub github_url: Option<String>,
    pub labels: Vec<String>,
    pub q_score: f64,
    pub repo_name: String,
    pub primary_language: Option<String>,
    pub repo_topics: Vec<String>,
    pub github_created_at: DateTime<Utc>,
    pub similarity_score: Option<f64>,
    pub why_this: Option<Vec<WhyThisItem>>,
}

/// Paginated feed response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPage {
    pub results: Vec<FeedItem>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
    pub is_personalized: bool,
    pub profile_cta: Option<String>,
}

/// Janitor run report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PruneReport {
    pub deleted_count: usize,
    pub remaining_count: usize,
}

/// Feed request: the caller's profile plus pagination.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedRequest {
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

/// Bulk upsert payload from the ingestion pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    pub issues: Vec<IngestIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub ingested: usize,
}

/// Bulk repository upsert payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoUpsertRequest {
    pub repos: Vec<Repository>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluateResponse {
    pub q_score: f64,
    pub passes: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SurvivalScoreRequest {
    pub q_score: f64,
    pub days_old: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurvivalScoreResponse {
    pub survival_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub issues: usize,
    pub open_issues: usize,
    pub repos: usize,
}

impl IngestIssue {
    /// Materialize the stored issue: survival score is computed here, at
    /// ingestion time, and never touched again by the ranking engine.
    pub fn into_issue(self, ingested_at: DateTime<Utc>) -> Issue {
        let days_old = crate::survival::days_since(self.github_created_at);
        let survival_score = crate::survival::calculate_survival_score(self.q_score, days_old);
        Issue {
            node_id: self.node_id,
            repo_id: self.repo_id,
            title: self.title,
            body_text: self.body_text,
            labels: self.labels,
            state: self.state,
            number: self.number,
            github_url: self.github_url,
            github_created_at: self.github_created_at,
            ingested_at,
            embedding: self.embedding,
            q_score: self.q_score,
            survival_score,
            has_code: self.q_components.has_code,
            has_headers: self.q_components.has_headers,
            tech_weight: self.q_components.tech_weight,
        }
    }
}

/// Truncate body text into the preview carried by result items.
pub fn body_preview(body_text: &str) -> String {
    body_text.chars().take(500).collect()
}
