//! Integration tests for the issue ranking and retrieval pipeline.
//!
//! These tests exercise ingestion scoring, hybrid search, pruning and the
//! feed without a running embedding provider (searches use synthetic vectors
//! or run lexical-only).

use std::sync::Arc;

use chrono::{Duration, Utc};

use issue_search::config::{FeedConfig, JanitorConfig, SearchConfig};
use issue_search::feed::{FeedRanker, TRENDING_CTA};
use issue_search::janitor::Janitor;
use issue_search::models::{
    Issue, IssueState, Repository, SearchFilters, SearchRequest, UserProfile,
};
use issue_search::quality;
use issue_search::search::engine::HybridSearchEngine;
use issue_search::search::lexical::LexicalIndex;
use issue_search::store::IssueStore;
use issue_search::survival;

const DIM: usize = 4;

/// Helper: a repository record the way the ingestion pipeline delivers it.
fn repo(node_id: &str, full_name: &str, language: &str, topics: &[&str]) -> Repository {
    Repository {
        node_id: node_id.to_string(),
        full_name: full_name.to_string(),
        primary_language: Some(language.to_string()),
        topics: topics.iter().map(|s| s.to_string()).collect(),
        stargazer_count: 1200,
    }
}

/// Helper: an ingested issue with quality signals already evaluated.
fn issue(
    node_id: &str,
    repo_id: &str,
    title: &str,
    body: &str,
    language: &str,
    age_days: i64,
    embedding: Option<Vec<f32>>,
) -> Issue {
    let components = quality::extract_components(title, body, language);
    let q_score = quality::compute_q_score(&components);
    let created = Utc::now() - Duration::days(age_days);
    let survival_score = survival::calculate_survival_score(q_score, age_days as f64);
    Issue {
        node_id: node_id.to_string(),
        repo_id: repo_id.to_string(),
        title: title.to_string(),
        body_text: body.to_string(),
        labels: vec!["bug".to_string()],
        state: IssueState::Open,
        number: Some(42),
        github_url: Some(format!("https://github.com/acme/x/issues/{node_id}")),
        github_created_at: created,
        ingested_at: created,
        embedding,
        q_score,
        survival_score,
        has_code: components.has_code,
        has_headers: components.has_headers,
        tech_weight: components.tech_weight,
    }
}

/// Helper: a well-formed bug report body for the given topic.
fn report_body(topic: &str) -> String {
    format!(
        "## Description\n{topic} crashes under load.\n\n## Steps to Reproduce\n\
         1. start the server\n2. send traffic\n\n```rust\nhandle.unwrap();\n```\n\
         The task panics with a tokio runtime error."
    )
}

struct Corpus {
    _dir: tempfile::TempDir,
    store: Arc<IssueStore>,
    lexical: Arc<LexicalIndex>,
}

fn corpus(issues: Vec<Issue>, repos: Vec<Repository>) -> Corpus {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(IssueStore::open_or_create(&dir.path().join("store")).unwrap());
    let lexical = Arc::new(LexicalIndex::open_or_create(&dir.path().join("index")).unwrap());
    store.upsert_repos(repos).unwrap();
    lexical.upsert_issues(&issues).unwrap();
    store.upsert_issues(issues).unwrap();
    Corpus {
        _dir: dir,
        store,
        lexical,
    }
}

fn engine(corpus: &Corpus, config: SearchConfig) -> HybridSearchEngine {
    HybridSearchEngine::new(corpus.store.clone(), corpus.lexical.clone(), config, DIM)
}

fn request(query: &str) -> SearchRequest {
    SearchRequest {
        query: query.to_string(),
        filters: SearchFilters::default(),
        page: 1,
        page_size: 20,
    }
}

#[test]
fn test_quality_to_survival_scenario() {
    // Issue A: code + headers + tech_weight 0.5, no junk -> Q = 0.8.
    let components = issue_search::quality::QScoreComponents {
        has_code: true,
        has_headers: true,
        tech_weight: 0.5,
        is_junk: false,
    };
    let q = quality::compute_q_score(&components);
    assert!((q - 0.8).abs() < 1e-9);
    assert!(quality::passes_quality_gate(q, 0.6));

    // At age 0 the survival score is ~0.636.
    let fresh = survival::calculate_survival_score(q, 0.0);
    assert!((fresh - 0.636).abs() < 1e-2);

    // Decay ordering used by both the Janitor and the rankers.
    let day1 = survival::calculate_survival_score(q, 1.0);
    let day30 = survival::calculate_survival_score(q, 30.0);
    assert!(day30 < day1 && day1 < fresh);
}

#[test]
fn test_end_to_end_hybrid_search() {
    // Embeddings are 4-dimensional for simplicity: "async" direction vs
    // "build" direction.
    let c = corpus(
        vec![
            issue(
                "I_async",
                "R_tokio",
                "tokio runtime panics on shutdown",
                &report_body("the async runtime"),
                "Rust",
                1,
                Some(vec![0.9, 0.1, 0.0, 0.0]),
            ),
            issue(
                "I_build",
                "R_cargo",
                "build fails with linker error",
                &report_body("the linker"),
                "Rust",
                1,
                Some(vec![0.0, 0.1, 0.9, 0.0]),
            ),
            issue(
                "I_py",
                "R_django",
                "runtime TypeError in view",
                &report_body("the template renderer"),
                "Python",
                1,
                Some(vec![0.8, 0.2, 0.1, 0.0]),
            ),
        ],
        vec![
            repo("R_tokio", "tokio-rs/tokio", "Rust", &["async", "runtime"]),
            repo("R_cargo", "rust-lang/cargo", "Rust", &["build"]),
            repo("R_django", "django/django", "Python", &["web"]),
        ],
    );
    let engine = engine(&c, SearchConfig::default());

    // Query in the "async" embedding direction with matching text.
    let resp = engine
        .search(&request("runtime panics"), Some(vec![1.0, 0.0, 0.0, 0.0]))
        .unwrap();

    assert!(resp.total >= 2);
    assert_eq!(resp.results[0].node_id, "I_async");
    assert!(resp.results.iter().all(|r| r.rrf_score > 0.0));
    assert!(!resp.total_is_capped);

    // Language filter restricts every returned item.
    let mut filtered = request("runtime");
    filtered.filters.languages = vec!["Python".to_string()];
    let resp = engine
        .search(&filtered, Some(vec![1.0, 0.0, 0.0, 0.0]))
        .unwrap();
    assert!(resp
        .results
        .iter()
        .all(|r| r.primary_language.as_deref() == Some("Python")));

    // A filter matching nothing returns an empty, well-formed response.
    let mut nothing = request("runtime");
    nothing.filters.repos = vec!["acme/nonexistent".to_string()];
    let resp = engine.search(&nothing, None).unwrap();
    assert_eq!(resp.total, 0);
    assert!(resp.results.is_empty());
    assert!(!resp.has_more);
}

#[test]
fn test_search_is_capped_and_pagination() {
    let issues: Vec<Issue> = (0..6)
        .map(|i| {
            issue(
                &format!("I{i:02}"),
                "R1",
                &format!("deadlock variant {i}"),
                &report_body("the lock manager"),
                "Go",
                i,
                None,
            )
        })
        .collect();
    let c = corpus(issues, vec![repo("R1", "acme/locks", "Go", &[])]);

    let capped_engine = engine(
        &c,
        SearchConfig {
            candidate_limit: 4,
            ..SearchConfig::default()
        },
    );

    let mut req = request("deadlock");
    req.page_size = 2;
    let first = capped_engine.search(&req, None).unwrap();
    assert!(first.total_is_capped);
    assert_eq!(first.results.len(), 2);
    assert!(first.has_more);

    // Pages never overlap and stay in Stage-1 order.
    req.page = 2;
    let second = capped_engine.search(&req, None).unwrap();
    let first_ids: Vec<&str> = first.results.iter().map(|r| r.node_id.as_str()).collect();
    let second_ids: Vec<&str> = second.results.iter().map(|r| r.node_id.as_str()).collect();
    assert!(first_ids.iter().all(|id| !second_ids.contains(id)));

    // Beyond the window: empty results, accurate total.
    req.page = 40;
    let deep = capped_engine.search(&req, None).unwrap();
    assert!(deep.results.is_empty());
    assert_eq!(deep.total, first.total);
    assert!(!deep.has_more);
}

#[test]
fn test_closed_issue_never_surfaces() {
    let mut closed = issue(
        "I_closed",
        "R1",
        "panic on empty config",
        &report_body("the config loader"),
        "Rust",
        1,
        None,
    );
    closed.state = IssueState::Closed;
    let open = issue(
        "I_open",
        "R1",
        "panic on malformed config",
        &report_body("the config parser"),
        "Rust",
        1,
        None,
    );
    let c = corpus(vec![closed, open], vec![repo("R1", "acme/cfg", "Rust", &[])]);
    let engine = engine(&c, SearchConfig::default());

    let resp = engine.search(&request("panic config"), None).unwrap();
    let ids: Vec<&str> = resp.results.iter().map(|r| r.node_id.as_str()).collect();
    assert_eq!(ids, vec!["I_open"]);
}

#[test]
fn test_janitor_end_to_end() {
    // 100 issues with survival scores evenly spaced 0.01..1.00.
    let mut issues = Vec::new();
    for i in 1..=100 {
        let mut it = issue(
            &format!("I{i:03}"),
            "R1",
            &format!("report {i}"),
            &report_body("a subsystem"),
            "Rust",
            0,
            None,
        );
        it.survival_score = i as f64 / 100.0;
        issues.push(it);
    }
    let c = corpus(issues, vec![repo("R1", "acme/x", "Rust", &[])]);
    let janitor = Janitor::new(c.store.clone(), c.lexical.clone(), JanitorConfig::default());

    let report = janitor.execute_pruning().unwrap();
    assert_eq!(report.deleted_count, 20);
    assert_eq!(report.remaining_count, 80);

    // Pruned issues are gone from the lexical path too.
    let hits = c.lexical.search("report", 200).unwrap();
    assert_eq!(hits.len(), 80);

    // A second run prunes the new bottom slice, not the old one.
    let report = janitor.execute_pruning().unwrap();
    assert_eq!(report.deleted_count, 16);
    assert_eq!(report.remaining_count, 64);
}

#[test]
fn test_janitor_empty_and_uniform_corpora() {
    let c = corpus(vec![], vec![]);
    let janitor = Janitor::new(c.store.clone(), c.lexical.clone(), JanitorConfig::default());
    let report = janitor.execute_pruning().unwrap();
    assert_eq!(report.deleted_count, 0);
    assert_eq!(report.remaining_count, 0);

    let mut issues = Vec::new();
    for i in 0..50 {
        let mut it = issue(
            &format!("I{i:02}"),
            "R1",
            "same quality everywhere",
            &report_body("everything"),
            "Rust",
            0,
            None,
        );
        it.survival_score = 0.5;
        issues.push(it);
    }
    let c = corpus(issues, vec![repo("R1", "acme/x", "Rust", &[])]);
    let janitor = Janitor::new(c.store.clone(), c.lexical.clone(), JanitorConfig::default());
    let report = janitor.execute_pruning().unwrap();
    assert_eq!(report.deleted_count, 0);
    assert_eq!(report.remaining_count, 50);
}

#[test]
fn test_feed_trending_vs_personalized() {
    let c = corpus(
        vec![
            issue(
                "I_rust",
                "R_rust",
                "unsafe block miscompiles",
                &report_body("the optimizer"),
                "Rust",
                1,
                Some(vec![1.0, 0.0, 0.0, 0.0]),
            ),
            issue(
                "I_py",
                "R_py",
                "asyncio task leak",
                &report_body("the event loop"),
                "Python",
                1,
                Some(vec![0.0, 1.0, 0.0, 0.0]),
            ),
        ],
        vec![
            repo("R_rust", "acme/fast", "Rust", &["compiler"]),
            repo("R_py", "acme/loop", "Python", &["asyncio"]),
        ],
    );
    let ranker = FeedRanker::new(c.store.clone(), FeedConfig::default(), DIM);

    // No combined vector: trending with the fixed CTA, preferences ignored.
    let anonymous = UserProfile {
        preferred_languages: vec!["Python".to_string()],
        ..UserProfile::default()
    };
    let page = ranker.get_feed(&anonymous, 1, 20);
    assert!(!page.is_personalized);
    assert_eq!(page.profile_cta.as_deref(), Some(TRENDING_CTA));
    assert_eq!(page.total, 2);

    // Combined vector pointing at the Rust issue: personalized, explained.
    let profile = UserProfile {
        combined_vector: Some(vec![1.0, 0.0, 0.0, 0.0]),
        preferred_languages: vec!["Rust".to_string()],
        min_heat_threshold: 0.0,
        ..UserProfile::default()
    };
    let page = ranker.get_feed(&profile, 1, 20);
    assert!(page.is_personalized);
    assert!(page.profile_cta.is_none());
    assert_eq!(page.results[0].node_id, "I_rust");
    let why = page.results[0].why_this.as_ref().unwrap();
    assert!(why.iter().any(|w| w.entity == "Rust"));
}

#[test]
fn test_reingestion_updates_ranking_inputs() {
    let original = issue("I1", "R1", "flaky integration test", "+1", "Rust", 0, None);
    assert!(original.q_score < 0.0); // junk-only body

    let c = corpus(vec![original], vec![repo("R1", "acme/ci", "Rust", &[])]);

    // Re-ingestion with a real report replaces the junk record.
    let improved = issue(
        "I1",
        "R1",
        "flaky integration test",
        &report_body("the test harness"),
        "Rust",
        0,
        None,
    );
    assert!(improved.q_score >= 0.6);
    c.lexical
        .upsert_issues(std::slice::from_ref(&improved))
        .unwrap();
    c.store.upsert_issues(vec![improved]).unwrap();

    assert_eq!(c.store.issue_count(), 1);
    let stored = c.store.get_issue("I1").unwrap();
    assert!(stored.q_score >= 0.6);
    assert!(stored.survival_score > 0.0);
}
