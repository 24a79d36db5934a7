//! Personalized feed ranking with a trending fallback.

pub mod why_this;

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::config::FeedConfig;
use crate::models::{
    body_preview, FeedItem, FeedPage, IssueState, UserProfile, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use crate::search::engine::freshness_decay;
use crate::store::{cosine_similarity, IssueStore};

/// Call-to-action attached to every trending (non-personalized) page.
pub const TRENDING_CTA: &str =
    "These are trending issues. Complete your profile for personalized recommendations.";

/// Ranks the feed for one profile: vector similarity plus freshness when the
/// profile has a combined interest vector, trending quality order otherwise.
pub struct FeedRanker {
    store: Arc<IssueStore>,
    config: FeedConfig,
    embedding_dim: usize,
}

struct ScoredItem {
    final_score: f64,
    item: FeedItem,
}

impl FeedRanker {
    pub fn new(store: Arc<IssueStore>, config: FeedConfig, embedding_dim: usize) -> Self {
        Self {
            store,
            config,
            embedding_dim,
        }
    }

    pub fn get_feed(&self, profile: &UserProfile, page: usize, page_size: usize) -> FeedPage {
        let page = page.max(1);
        let page_size = match page_size {
            0 => DEFAULT_PAGE_SIZE,
            s if s > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
            s => s,
        };

        if let Some(combined_vector) = &profile.combined_vector {
            if combined_vector.len() == self.embedding_dim {
                return self.personalized(profile, combined_vector, page, page_size);
            }
            tracing::warn!(
                "Profile vector dimension {} does not match corpus dimension {}; serving trending feed",
                combined_vector.len(),
                self.embedding_dim
            );
        }

        self.trending(page, page_size)
    }

    /// Vector similarity against issue embeddings with preference filters.
    fn personalized(
        &self,
        profile: &UserProfile,
        combined_vector: &[f32],
        page: usize,
        page_size: usize,
    ) -> FeedPage {
        let language_filter: Option<HashSet<&str>> = if profile.preferred_languages.is_empty() {
            None
        } else {
            Some(profile.preferred_languages.iter().map(|s| s.as_str()).collect())
        };

        let now = Utc::now();
        let freshness = self.config.freshness;
        let mut scored: Vec<ScoredItem> = Vec::new();

        // One pass yields both the page and the exact total.
        self.store.scan(|issue, repo| {
            if issue.state != IssueState::Open {
                return;
            }
            if issue.q_score < profile.min_heat_threshold {
                return;
            }
            let Some(embedding) = &issue.embedding else {
                return;
            };
            if embedding.len() != combined_vector.len() {
                return;
            }
            let Some(repo) = repo else {
                return;
            };
            if let Some(languages) = &language_filter {
                match &repo.primary_language {
                    Some(lang) if languages.contains(lang.as_str()) => {}
                    _ => return,
                }
            }

            let similarity = f64::from(cosine_similarity(combined_vector, embedding));
            let age_basis = issue.ingested_at.max(issue.github_created_at);
            let age_days =
                now.signed_duration_since(age_basis).num_milliseconds() as f64 / 86_400_000.0;
            let fresh = freshness_decay(age_days, freshness.half_life_days, freshness.floor);

            scored.push(ScoredItem {
                final_score: similarity + freshness.weight * fresh,
                item: FeedItem {
                    node_id: issue.node_id.clone(),
                    title: issue.title.clone(),
                    body_preview: body_preview(&issue.body_text),
                    github_url: issue.github_url.clone(),
                    labels: issue.labels.clone(),
                    q_score: issue.q_score,
                    repo_name: repo.full_name.clone(),
                    primary_language: repo.primary_language.clone(),
                    repo_topics: repo.topics.clone(),
                    github_created_at: issue.github_created_at,
                    similarity_score: Some(similarity),
                    why_this: None,
                },
            });
        });

        scored.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    b.item
                        .q_score
                        .partial_cmp(&a.item.q_score)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.item.node_id.cmp(&b.item.node_id))
        });

        let total = scored.len();
        let offset = (page - 1) * page_size;
        let mut results: Vec<FeedItem> = scored
            .into_iter()
            .skip(offset)
            .take(page_size)
            .map(|s| s.item)
            .collect();

        // Explanations only for items actually returned, from fields already
        // in hand.
        for item in &mut results {
            item.why_this = Some(why_this::compute_why_this(
                profile,
                &item.title,
                &item.body_preview,
                &item.labels,
                item.primary_language.as_deref(),
                &item.repo_topics,
                self.config.why_this_top_k,
            ));
        }

        let has_more = offset + results.len() < total;

        tracing::info!(
            "Personalized feed: returned {} of {total}",
            results.len()
        );

        FeedPage {
            results,
            total,
            page,
            page_size,
            has_more,
            is_personalized: true,
            profile_cta: None,
        }
    }

    /// Trending issues: high q_score, open, newest first within a score.
    /// Preference filters deliberately do not apply here.
    fn trending(&self, page: usize, page_size: usize) -> FeedPage {
        let min_q_score = self.config.trending_min_q_score;
        let mut scored: Vec<FeedItem> = Vec::new();

        self.store.scan(|issue, repo| {
            if issue.state != IssueState::Open {
                return;
            }
            if issue.q_score < min_q_score {
                return;
            }
            let Some(repo) = repo else {
                return;
            };

            scored.push(FeedItem {
                node_id: issue.node_id.clone(),
                title: issue.title.clone(),
                body_preview: body_preview(&issue.body_text),
                github_url: issue.github_url.clone(),
                labels: issue.labels.clone(),
                q_score: issue.q_score,
                repo_name: repo.full_name.clone(),
                primary_language: repo.primary_language.clone(),
                repo_topics: repo.topics.clone(),
                github_created_at: issue.github_created_at,
                similarity_score: None,
                why_this: None,
            });
        });

        scored.sort_by(|a, b| {
            b.q_score
                .partial_cmp(&a.q_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.github_created_at.cmp(&a.github_created_at))
                .then_with(|| a.node_id.cmp(&b.node_id))
        });

        let total = scored.len();
        let offset = (page - 1) * page_size;
        let results: Vec<FeedItem> = scored.into_iter().skip(offset).take(page_size).collect();
        let has_more = offset + results.len() < total;

        tracing::info!("Trending feed: returned {} of {total}", results.len());

        FeedPage {
            results,
            total,
            page,
            page_size,
            has_more,
            is_personalized: false,
            profile_cta: Some(TRENDING_CTA.to_string()),
        }
    }
}
