use std::collections::HashSet;

use crate::models::SearchFilters;
use crate::store::IssueMeta;

/// Retrieval strategy chosen once per request and threaded through both
/// stages. The vector path only exists when a usable query embedding does.
#[derive(Debug, Clone)]
pub enum RetrievalStrategy {
    Hybrid(Vec<f32>),
    LexicalOnly,
}

impl RetrievalStrategy {
    /// Pick the strategy for this request. An absent or wrong-dimension
    /// embedding degrades to lexical-only; never an error.
    pub fn select(query_embedding: Option<Vec<f32>>, expected_dim: usize) -> Self {
        match query_embedding {
            Some(vec) if vec.len() == expected_dim => RetrievalStrategy::Hybrid(vec),
            Some(vec) => {
                tracing::warn!(
                    "Query embedding dimension {} does not match corpus dimension {}; using lexical-only",
                    vec.len(),
                    expected_dim
                );
                RetrievalStrategy::LexicalOnly
            }
            None => RetrievalStrategy::LexicalOnly,
        }
    }

    pub fn is_hybrid(&self) -> bool {
        matches!(self, RetrievalStrategy::Hybrid(_))
    }
}

/// Filters compiled once per request into set-membership predicates.
///
/// Applied only after fusion: filtering inside a candidate pool would shrink
/// it and create recall gaps. ANY semantics within a filter, AND across.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    languages: Option<HashSet<String>>,
    labels: Option<HashSet<String>>,
    repos: Option<HashSet<String>>,
}

impl CompiledFilters {
    pub fn compile(filters: &SearchFilters) -> Self {
        fn to_set(values: &[String]) -> Option<HashSet<String>> {
            if values.is_empty() {
                None
            } else {
                Some(values.iter().cloned().collect())
            }
        }

        Self {
            languages: to_set(&filters.languages),
            labels: to_set(&filters.labels),
            repos: to_set(&filters.repos),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_none() && self.labels.is_none() && self.repos.is_none()
    }

    /// Post-fusion predicate. Candidates without a repository record never
    /// match (the hydration join would drop them anyway).
    pub fn matches(&self, meta: &IssueMeta) -> bool {
        let Some(repo) = &meta.repo else {
            return false;
        };

        if let Some(languages) = &self.languages {
            match &repo.primary_language {
                Some(lang) if languages.contains(lang) => {}
                _ => return false,
            }
        }

        if let Some(labels) = &self.labels {
            if !meta.labels.iter().any(|l| labels.contains(l)) {
                return false;
            }
        }

        if let Some(repos) = &self.repos {
            if !repos.contains(&repo.full_name) {
                return false;
            }
        }

        true
    }
}
