use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::models::{Issue, IssueState, Repository};

/// Issue + repository store with disk persistence.
///
/// Backs every retrieval path: nearest-neighbor candidate ordering for the
/// search engine and feed ranker, ordered hydration for Stage 2, and the
/// survival-score percentile/prune operations the Janitor runs. A composite
/// ordering index over `(survival_score, ingested_at, node_id)` is maintained
/// on every upsert and delete so percentile scans and pruning walk issues in
/// score order instead of re-sorting the corpus.
pub struct IssueStore {
    inner: RwLock<StoreInner>,
    persist_path: PathBuf,
}

#[derive(Default)]
struct StoreInner {
    issues: HashMap<String, Issue>,
    repos: HashMap<String, Repository>,
    score_index: BTreeSet<ScoreIndexKey>,
}

/// Composite index key. Scores are mapped to totally-ordered bits so f64
/// values can live in a BTreeSet without an ordering wrapper.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ScoreIndexKey {
    score_bits: u64,
    ingested_at_micros: i64,
    node_id: String,
}

impl ScoreIndexKey {
    fn new(issue: &Issue) -> Self {
        Self {
            score_bits: score_order_bits(issue.survival_score),
            ingested_at_micros: issue.ingested_at.timestamp_micros(),
            node_id: issue.node_id.clone(),
        }
    }

    fn score(&self) -> f64 {
        f64::from_bits(order_bits_to_raw(self.score_bits))
    }
}

/// Map an f64 to bits whose unsigned ordering matches the numeric ordering.
fn score_order_bits(score: f64) -> u64 {
    let bits = score.to_bits();
    if bits & (1 << 63) != 0 {
        !bits
    } else {
        bits | (1 << 63)
    }
}

fn order_bits_to_raw(ordered: u64) -> u64 {
    if ordered & (1 << 63) != 0 {
        ordered & !(1 << 63)
    } else {
        !ordered
    }
}

#[derive(Serialize, Deserialize, Default)]
struct PersistedState {
    issues: Vec<Issue>,
    repos: Vec<Repository>,
}

/// Light projection used during Stage-1 fusion and filtering.
#[derive(Debug, Clone)]
pub struct IssueMeta {
    pub node_id: String,
    pub q_score: f64,
    pub labels: Vec<String>,
    pub github_created_at: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
    /// None when the owning repository record is missing; such candidates
    /// are dropped from results, matching the repository join.
    pub repo: Option<RepoMeta>,
}

#[derive(Debug, Clone)]
pub struct RepoMeta {
    pub full_name: String,
    pub primary_language: Option<String>,
}

/// Full projection returned by Stage-2 hydration and the feed ranker.
#[derive(Debug, Clone)]
pub struct HydratedIssue {
    pub node_id: String,
    pub title: String,
    pub body_text: String,
    pub github_url: Option<String>,
    pub labels: Vec<String>,
    pub q_score: f64,
    pub github_created_at: DateTime<Utc>,
    pub repo_name: String,
    pub primary_language: Option<String>,
    pub repo_topics: Vec<String>,
}

impl IssueStore {
    pub fn open_or_create(store_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(store_dir)?;
        let persist_path = store_dir.join("store.json");

        let state: PersistedState = if persist_path.exists() {
            let data =
                std::fs::read_to_string(&persist_path).context("Failed to read issue store")?;
            serde_json::from_str(&data).unwrap_or_default()
        } else {
            PersistedState::default()
        };

        let mut inner = StoreInner::default();
        for repo in state.repos {
            inner.repos.insert(repo.node_id.clone(), repo);
        }
        for issue in state.issues {
            inner.score_index.insert(ScoreIndexKey::new(&issue));
            inner.issues.insert(issue.node_id.clone(), issue);
        }

        Ok(Self {
            inner: RwLock::new(inner),
            persist_path,
        })
    }

    /// Insert or replace issues, keeping the score index in step.
    pub fn upsert_issues(&self, issues: Vec<Issue>) -> Result<()> {
        let mut inner = self.inner.write();
        for issue in issues {
            if let Some(previous) = inner.issues.remove(&issue.node_id) {
                inner.score_index.remove(&ScoreIndexKey::new(&previous));
            }
            inner.score_index.insert(ScoreIndexKey::new(&issue));
            inner.issues.insert(issue.node_id.clone(), issue);
        }
        self.persist(&inner)
    }

    pub fn upsert_repos(&self, repos: Vec<Repository>) -> Result<()> {
        let mut inner = self.inner.write();
        for repo in repos {
            inner.repos.insert(repo.node_id.clone(), repo);
        }
        self.persist(&inner)
    }

    pub fn issue_count(&self) -> usize {
        self.inner.read().issues.len()
    }

    pub fn repo_count(&self) -> usize {
        self.inner.read().repos.len()
    }

    pub fn open_issue_count(&self) -> usize {
        self.inner
            .read()
            .issues
            .values()
            .filter(|i| i.state == IssueState::Open)
            .count()
    }

    pub fn list_repos(&self) -> Vec<Repository> {
        let mut repos: Vec<Repository> = self.inner.read().repos.values().cloned().collect();
        repos.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        repos
    }

    pub fn get_issue(&self, node_id: &str) -> Option<Issue> {
        self.inner.read().issues.get(node_id).cloned()
    }

    /// Nearest-neighbor candidate ordering by cosine similarity.
    ///
    /// Considers open issues whose embedding matches the query dimension.
    /// Returned metas are ordered best-first; the caller assigns ranks.
    pub fn vector_candidates(&self, query_embedding: &[f32], limit: usize) -> Vec<IssueMeta> {
        let inner = self.inner.read();

        let mut scored: Vec<(f32, &Issue)> = inner
            .issues
            .values()
            .filter(|i| i.state == IssueState::Open)
            .filter_map(|i| {
                let embedding = i.embedding.as_ref()?;
                if embedding.len() != query_embedding.len() {
                    return None;
                }
                Some((cosine_similarity(query_embedding, embedding), i))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.node_id.cmp(&b.1.node_id))
        });
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(_, issue)| inner.meta_of(issue))
            .collect()
    }

    /// Look up metas for an id list, preserving the caller's order.
    /// Missing ids are skipped.
    pub fn metas(&self, node_ids: &[String]) -> Vec<IssueMeta> {
        let inner = self.inner.read();
        node_ids
            .iter()
            .filter_map(|id| inner.issues.get(id).map(|i| inner.meta_of(i)))
            .collect()
    }

    /// Hydrate full metadata for the given ids, re-imposing the caller's
    /// order. Closed or vanished issues and issues without a repository
    /// record are omitted.
    pub fn hydrate_open(&self, node_ids: &[String]) -> Vec<HydratedIssue> {
        let inner = self.inner.read();
        node_ids
            .iter()
            .filter_map(|id| {
                let issue = inner.issues.get(id)?;
                if issue.state != IssueState::Open {
                    return None;
                }
                let repo = inner.repos.get(&issue.repo_id)?;
                Some(HydratedIssue {
                    node_id: issue.node_id.clone(),
                    title: issue.title.clone(),
                    body_text: issue.body_text.clone(),
                    github_url: issue.github_url.clone(),
                    labels: issue.labels.clone(),
                    q_score: issue.q_score,
                    github_created_at: issue.github_created_at,
                    repo_name: repo.full_name.clone(),
                    primary_language: repo.primary_language.clone(),
                    repo_topics: repo.topics.clone(),
                })
            })
            .collect()
    }

    /// Visit every issue with its repository record, under one read lock.
    pub fn scan<F>(&self, mut visit: F)
    where
        F: FnMut(&Issue, Option<&Repository>),
    {
        let inner = self.inner.read();
        for issue in inner.issues.values() {
            visit(issue, inner.repos.get(&issue.repo_id));
        }
    }

    /// Continuous percentile of `survival_score` over the whole corpus,
    /// linearly interpolated between closest ranks (the PERCENTILE_CONT
    /// convention). None for an empty corpus.
    pub fn survival_percentile(&self, percentile: f64) -> Option<f64> {
        let inner = self.inner.read();
        let n = inner.score_index.len();
        if n == 0 {
            return None;
        }

        let p = percentile.clamp(0.0, 1.0);
        let rank = p * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let fraction = rank - lower as f64;

        let mut iter = inner.score_index.iter().skip(lower);
        let low = iter.next()?.score();
        if fraction == 0.0 {
            return Some(low);
        }
        let high = iter.next().map(|k| k.score()).unwrap_or(low);
        Some(low + fraction * (high - low))
    }

    /// Delete every issue with survival score strictly below `threshold`
    /// in one critical section. Returns the deleted ids.
    pub fn prune_below(&self, threshold: f64) -> Result<Vec<String>> {
        let mut inner = self.inner.write();

        let cutoff = ScoreIndexKey {
            score_bits: score_order_bits(threshold),
            ingested_at_micros: i64::MIN,
            node_id: String::new(),
        };
        let doomed: Vec<ScoreIndexKey> = inner.score_index.range(..cutoff).cloned().collect();

        let mut deleted = Vec::with_capacity(doomed.len());
        for key in doomed {
            inner.score_index.remove(&key);
            inner.issues.remove(&key.node_id);
            deleted.push(key.node_id);
        }

        self.persist(&inner)?;
        Ok(deleted)
    }

    /// Persist the full state to disk (atomic write via temp file + rename).
    fn persist(&self, inner: &StoreInner) -> Result<()> {
        let state = PersistedState {
            issues: inner.issues.values().cloned().collect(),
            repos: inner.repos.values().cloned().collect(),
        };
        let data = serde_json::to_string(&state)?;
        let tmp_path = self.persist_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &data).context("Failed to write issue store")?;
        std::fs::rename(&tmp_path, &self.persist_path).context("Failed to replace issue store")?;
        Ok(())
    }
}

impl StoreInner {
    fn meta_of(&self, issue: &Issue) -> IssueMeta {
        IssueMeta {
            node_id: issue.node_id.clone(),
            q_score: issue.q_score,
            labels: issue.labels.clone(),
            github_created_at: issue.github_created_at,
            ingested_at: issue.ingested_at,
            repo: self.repos.get(&issue.repo_id).map(|r| RepoMeta {
                full_name: r.full_name.clone(),
                primary_language: r.primary_language.clone(),
            }),
        }
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn issue(node_id: &str, survival: f64) -> Issue {
        Issue {
            node_id: node_id.to_string(),
            repo_id: "R1".to_string(),
            title: format!("issue {node_id}"),
            body_text: "body".to_string(),
            labels: vec![],
            state: IssueState::Open,
            number: None,
            github_url: None,
            github_created_at: Utc::now(),
            ingested_at: Utc::now(),
            embedding: None,
            q_score: 0.5,
            survival_score: survival,
            has_code: false,
            has_headers: false,
            tech_weight: 0.0,
        }
    }

    fn store() -> (tempfile::TempDir, IssueStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = IssueStore::open_or_create(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_upsert_replaces_and_reindexes() {
        let (_dir, store) = store();
        store.upsert_issues(vec![issue("a", 0.5)]).unwrap();
        store.upsert_issues(vec![issue("a", 0.9)]).unwrap();
        assert_eq!(store.issue_count(), 1);
        // Old index entry must be gone: a prune below 0.6 deletes nothing.
        let deleted = store.prune_below(0.6).unwrap();
        assert!(deleted.is_empty());
    }

    #[test]
    fn test_percentile_empty_corpus() {
        let (_dir, store) = store();
        assert!(store.survival_percentile(0.2).is_none());
    }

    #[test]
    fn test_percentile_single_row_is_own_score() {
        let (_dir, store) = store();
        store.upsert_issues(vec![issue("only", 0.42)]).unwrap();
        let t = store.survival_percentile(0.2).unwrap();
        assert!((t - 0.42).abs() < 1e-9);
        // Strict comparison deletes nothing on a single-row corpus.
        assert_eq!(store.prune_below(t).unwrap().len(), 0);
    }

    #[test]
    fn test_percentile_interpolates_between_ranks() {
        let (_dir, store) = store();
        let issues: Vec<Issue> = (1..=100)
            .map(|i| issue(&format!("i{i:03}"), i as f64 / 100.0))
            .collect();
        store.upsert_issues(issues).unwrap();
        // rank = 0.2 * 99 = 19.8 -> 0.20 + 0.8 * 0.01 = 0.208
        let t = store.survival_percentile(0.2).unwrap();
        assert!((t - 0.208).abs() < 1e-9, "got {t}");
    }

    #[test]
    fn test_prune_below_deletes_strictly_less() {
        let (_dir, store) = store();
        let issues: Vec<Issue> = (1..=100)
            .map(|i| issue(&format!("i{i:03}"), i as f64 / 100.0))
            .collect();
        store.upsert_issues(issues).unwrap();
        let t = store.survival_percentile(0.2).unwrap();
        let deleted = store.prune_below(t).unwrap();
        assert_eq!(deleted.len(), 20);
        assert_eq!(store.issue_count(), 80);
    }

    #[test]
    fn test_prune_all_equal_scores_deletes_nothing() {
        let (_dir, store) = store();
        let issues: Vec<Issue> = (0..100).map(|i| issue(&format!("i{i:03}"), 0.5)).collect();
        store.upsert_issues(issues).unwrap();
        let t = store.survival_percentile(0.2).unwrap();
        assert!((t - 0.5).abs() < 1e-9);
        assert_eq!(store.prune_below(t).unwrap().len(), 0);
        assert_eq!(store.issue_count(), 100);
    }

    #[test]
    fn test_vector_candidates_skip_dim_mismatch_and_closed() {
        let (_dir, store) = store();
        let mut a = issue("a", 0.5);
        a.embedding = Some(vec![1.0, 0.0]);
        let mut b = issue("b", 0.5);
        b.embedding = Some(vec![1.0, 0.0, 0.0]); // wrong dimension
        let mut c = issue("c", 0.5);
        c.embedding = Some(vec![0.9, 0.1]);
        c.state = IssueState::Closed;
        store.upsert_issues(vec![a, b, c]).unwrap();

        let hits = store.vector_candidates(&[1.0, 0.0], 10);
        let ids: Vec<&str> = hits.iter().map(|m| m.node_id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn test_vector_candidates_ordered_by_similarity() {
        let (_dir, store) = store();
        let mut near = issue("near", 0.5);
        near.embedding = Some(vec![1.0, 0.0]);
        let mut far = issue("far", 0.5);
        far.embedding = Some(vec![0.0, 1.0]);
        let mut mid = issue("mid", 0.5);
        mid.embedding = Some(vec![0.7, 0.7]);
        store.upsert_issues(vec![near, far, mid]).unwrap();

        let hits = store.vector_candidates(&[1.0, 0.0], 10);
        let ids: Vec<&str> = hits.iter().map(|m| m.node_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
    }

    #[test]
    fn test_hydrate_preserves_order_and_drops_closed() {
        let (_dir, store) = store();
        store
            .upsert_repos(vec![Repository {
                node_id: "R1".to_string(),
                full_name: "acme/widgets".to_string(),
                primary_language: Some("Rust".to_string()),
                topics: vec![],
                stargazer_count: 10,
            }])
            .unwrap();
        let mut closed = issue("closed", 0.5);
        closed.state = IssueState::Closed;
        store
            .upsert_issues(vec![issue("b", 0.5), issue("a", 0.5), closed])
            .unwrap();

        let ids = vec![
            "a".to_string(),
            "gone".to_string(),
            "closed".to_string(),
            "b".to_string(),
        ];
        let rows = store.hydrate_open(&ids);
        let got: Vec<&str> = rows.iter().map(|r| r.node_id.as_str()).collect();
        assert_eq!(got, vec!["a", "b"]);
        assert_eq!(rows[0].repo_name, "acme/widgets");
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = IssueStore::open_or_create(dir.path()).unwrap();
            store.upsert_issues(vec![issue("a", 0.3), issue("b", 0.7)]).unwrap();
        }
        let reopened = IssueStore::open_or_create(dir.path()).unwrap();
        assert_eq!(reopened.issue_count(), 2);
        // Index is rebuilt on load: percentile works immediately.
        assert!(reopened.survival_percentile(0.5).is_some());
    }

    #[test]
    fn test_cosine_similarity_basics() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
