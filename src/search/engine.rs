use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::SearchConfig;
use crate::models::{body_preview, SearchRequest, SearchResponse, SearchResultItem};
use crate::search::lexical::LexicalIndex;
use crate::search::plan::{CompiledFilters, RetrievalStrategy};
use crate::store::{IssueMeta, IssueStore};

/// Two-stage hybrid retrieval over the issue corpus.
///
/// Stage 1 ranks candidates from the vector and lexical paths, fuses them
/// with Reciprocal Rank Fusion, blends in freshness, applies filters after
/// fusion and materializes the full ordered window. Stage 2 hydrates just
/// the requested page, re-imposing the Stage-1 order.
pub struct HybridSearchEngine {
    store: Arc<IssueStore>,
    lexical: Arc<LexicalIndex>,
    config: SearchConfig,
    embedding_dim: usize,
}

/// Ordered ids with scores and totals from Stage 1. Built and discarded
/// within one search call.
pub struct Stage1Result {
    pub node_ids: Vec<String>,
    pub rrf_scores: HashMap<String, f64>,
    pub total: usize,
    pub is_capped: bool,
}

struct FusedCandidate {
    meta: IssueMeta,
    rrf_score: f64,
}

struct RankedCandidate {
    final_score: f64,
    q_score: f64,
    node_id: String,
    rrf_score: f64,
}

/// `final_score DESC, q_score DESC, node_id ASC` — the one ordering used for
/// every search result, with no fall-through to storage order.
fn stage1_ordering(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.final_score
        .partial_cmp(&a.final_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.q_score.partial_cmp(&a.q_score).unwrap_or(Ordering::Equal))
        .then_with(|| a.node_id.cmp(&b.node_id))
}

/// Exponential freshness decay: halves every `half_life_days`, never below
/// `floor`. Age zero (or negative clock skew) is fully fresh.
pub fn freshness_decay(age_days: f64, half_life_days: f64, floor: f64) -> f64 {
    if half_life_days <= 0.0 {
        return floor.clamp(0.0, 1.0);
    }
    if age_days <= 0.0 {
        return 1.0;
    }
    0.5_f64.powf(age_days / half_life_days).max(floor)
}

/// Age basis for freshness: the more recent of ingestion and creation.
fn age_days(meta: &IssueMeta, now: DateTime<Utc>) -> f64 {
    let basis = meta.ingested_at.max(meta.github_created_at);
    now.signed_duration_since(basis).num_milliseconds() as f64 / 86_400_000.0
}

impl HybridSearchEngine {
    pub fn new(
        store: Arc<IssueStore>,
        lexical: Arc<LexicalIndex>,
        config: SearchConfig,
        embedding_dim: usize,
    ) -> Self {
        Self {
            store,
            lexical,
            config,
            embedding_dim,
        }
    }

    /// Execute a search. `query_embedding` is whatever the embedding provider
    /// produced; absence or a dimension mismatch silently degrades to
    /// lexical-only retrieval.
    pub fn search(
        &self,
        request: &SearchRequest,
        query_embedding: Option<Vec<f32>>,
    ) -> Result<SearchResponse> {
        let search_id = Uuid::new_v4();

        let strategy = RetrievalStrategy::select(query_embedding, self.embedding_dim);
        if !strategy.is_hybrid() {
            tracing::warn!("No usable query embedding for search_id={search_id}; using lexical-only");
        }
        let filters = CompiledFilters::compile(&request.filters);

        let stage1 = self.execute_stage1(&request.query, &strategy, &filters)?;

        if stage1.total == 0 {
            tracing::info!("Search completed: search_id={search_id}, results=0, total=0");
            return Ok(SearchResponse {
                search_id,
                results: Vec::new(),
                total: 0,
                total_is_capped: false,
                page: request.page,
                page_size: request.page_size,
                has_more: false,
                query: request.query.clone(),
                filters: request.filters.clone(),
            });
        }

        let start_idx = request.offset();
        let end_idx = (start_idx + request.page_size).min(stage1.node_ids.len());
        let page_ids: &[String] = if start_idx < stage1.node_ids.len() {
            &stage1.node_ids[start_idx..end_idx]
        } else {
            &[]
        };

        // Offset beyond the materialized window: empty page, accurate total.
        if page_ids.is_empty() {
            tracing::info!(
                "Search completed: search_id={search_id}, page={} beyond available results, total={}",
                request.page,
                stage1.total
            );
            return Ok(SearchResponse {
                search_id,
                results: Vec::new(),
                total: stage1.total,
                total_is_capped: stage1.is_capped,
                page: request.page,
                page_size: request.page_size,
                has_more: false,
                query: request.query.clone(),
                filters: request.filters.clone(),
            });
        }

        let results = self.execute_stage2(page_ids, &stage1.rrf_scores);

        if results.len() < page_ids.len() {
            let missing = page_ids.len() - results.len();
            tracing::warn!(
                "Stage 2 returned {} of {} expected rows for search_id={search_id}; \
                 {missing} issues may have been deleted",
                results.len(),
                page_ids.len()
            );
        }

        let has_more = request.offset() + results.len() < stage1.total;

        tracing::info!(
            "Search completed: search_id={search_id}, results={}, total={}",
            results.len(),
            stage1.total
        );

        Ok(SearchResponse {
            search_id,
            results,
            total: stage1.total,
            total_is_capped: stage1.is_capped,
            page: request.page,
            page_size: request.page_size,
            has_more,
            query: request.query.clone(),
            filters: request.filters.clone(),
        })
    }

    /// Stage 1: candidate retrieval (no filters), RRF fusion, freshness
    /// blending, post-fusion filtering, deterministic ordering.
    pub fn execute_stage1(
        &self,
        query_text: &str,
        strategy: &RetrievalStrategy,
        filters: &CompiledFilters,
    ) -> Result<Stage1Result> {
        let limit = self.config.candidate_limit;

        let vector_metas = match strategy {
            RetrievalStrategy::Hybrid(query_vec) => self.store.vector_candidates(query_vec, limit),
            RetrievalStrategy::LexicalOnly => Vec::new(),
        };
        let lexical_ids = self.lexical.search(query_text, limit)?;
        let lexical_metas = self.store.metas(&lexical_ids);

        let vector_capped = vector_metas.len() >= limit;
        let lexical_capped = lexical_metas.len() >= limit;

        // RRF accumulation: each path contributes 1/(k + rank); an issue
        // missing from one path just gets no contribution from it.
        let k = self.config.rrf_k;
        let mut fused: HashMap<String, FusedCandidate> = HashMap::new();

        for (rank, meta) in vector_metas.into_iter().enumerate() {
            let rrf = 1.0 / (k + (rank + 1) as f64);
            fused
                .entry(meta.node_id.clone())
                .or_insert_with(|| FusedCandidate { meta, rrf_score: 0.0 })
                .rrf_score += rrf;
        }
        for (rank, meta) in lexical_metas.into_iter().enumerate() {
            let rrf = 1.0 / (k + (rank + 1) as f64);
            fused
                .entry(meta.node_id.clone())
                .or_insert_with(|| FusedCandidate { meta, rrf_score: 0.0 })
                .rrf_score += rrf;
        }

        let now = Utc::now();
        let freshness = self.config.freshness;

        // Filters apply only here, after fusion over the full pools.
        let mut ranked: Vec<RankedCandidate> = fused
            .into_values()
            .filter(|c| filters.matches(&c.meta))
            .map(|c| {
                let fresh = freshness_decay(
                    age_days(&c.meta, now),
                    freshness.half_life_days,
                    freshness.floor,
                );
                RankedCandidate {
                    final_score: c.rrf_score + freshness.weight * fresh,
                    q_score: c.meta.q_score,
                    node_id: c.meta.node_id,
                    rrf_score: c.rrf_score,
                }
            })
            .collect();

        ranked.sort_by(stage1_ordering);

        let total = ranked.len();
        let mut node_ids = Vec::with_capacity(total);
        let mut rrf_scores = HashMap::with_capacity(total);
        for candidate in ranked {
            rrf_scores.insert(candidate.node_id.clone(), candidate.rrf_score);
            node_ids.push(candidate.node_id);
        }

        Ok(Stage1Result {
            node_ids,
            rrf_scores,
            total,
            is_capped: vector_capped || lexical_capped,
        })
    }

    /// Stage 2: hydrate the page ids with full metadata in Stage-1 order,
    /// restricted to currently-open issues.
    fn execute_stage2(
        &self,
        page_ids: &[String],
        rrf_scores: &HashMap<String, f64>,
    ) -> Vec<SearchResultItem> {
        self.store
            .hydrate_open(page_ids)
            .into_iter()
            .map(|row| SearchResultItem {
                rrf_score: rrf_scores.get(&row.node_id).copied().unwrap_or(0.0),
                node_id: row.node_id,
                title: row.title,
                body_preview: body_preview(&row.body_text),
                github_url: row.github_url,
                labels: row.labels,
                q_score: row.q_score,
                repo_name: row.repo_name,
                primary_language: row.primary_language,
                github_created_at: row.github_created_at,
            })
            .collect()
    }
}
