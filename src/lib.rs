//! # issue-search
//!
//! An issue ranking and retrieval engine for a GitHub-issue recommendation
//! product: quality-gated ingestion, time-decayed survival scoring,
//! percentile-based eviction, two-stage hybrid search with Reciprocal Rank
//! Fusion, and a personalized feed with a trending fallback.
//!
//! ## Architecture
//!
//! One data model, one algorithmic theme: combining heterogeneous signals
//! (semantic similarity, lexical relevance, heuristic quality, recency) into
//! a single deterministic ordering.
//!
//! ```text
//!   ingestion pipeline (external)
//!        │  q_score + components
//!        ▼
//!   ┌───────────────┐   survival_score    ┌──────────────┐
//!   │  IssueStore    │◄────────────────── │ SurvivalScore │
//!   │  + LexicalIndex│                    └──────▲───────┘
//!   └──┬─────────┬──┘                            │
//!      │         │                         ┌─────┴─────┐
//!      │         │ percentile + delete     │ QualityGate│
//!      │         ▼                         └───────────┘
//!      │   ┌──────────┐
//!      │   │  Janitor  │  bottom-percentile eviction
//!      │   └──────────┘
//!      │
//!      ├──────────────────────────────┐
//!      ▼                              ▼
//!   ┌────────────────────┐   ┌──────────────┐
//!   │ HybridSearchEngine  │   │  FeedRanker  │
//!   │ vector ┐            │   │ personalized │
//!   │ lexical┴─ RRF fusion│   │ or trending  │
//!   │ + freshness, filters│   │ + why-this   │
//!   └────────────────────┘   └──────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration; per-component config values
//! - [`models`] - Shared data types: `Issue`, `Repository`, request/response types
//! - [`keywords`] - Static signal tables: tech keywords, headers, junk phrases
//! - [`quality`] - Q-score heuristics applied at ingestion
//! - [`survival`] - Decayed quality score for ranking and pruning
//! - [`store`] - Issue/repository store: NN ordering, hydration, percentile, prune
//! - [`search::lexical`] - Full-text relevance index powered by tantivy
//! - [`search::plan`] - Per-request retrieval strategy and compiled filters
//! - [`search::engine`] - Two-stage hybrid search with RRF fusion
//! - [`search::cache`] - TTL caches for responses and search contexts
//! - [`feed`] - Personalized/trending feed ranking with explanations
//! - [`janitor`] - Percentile-threshold corpus eviction
//! - [`llm::embeddings`] - Query embedding via Ollama or OpenAI-compatible APIs
//! - [`api`] - Axum HTTP handlers for search, feed, ingestion, and maintenance
//! - [`state`] - Shared application state wiring the components together

pub mod api;
pub mod config;
pub mod feed;
pub mod janitor;
pub mod keywords;
pub mod llm;
pub mod models;
pub mod quality;
pub mod search;
pub mod state;
pub mod store;
pub mod survival;
