//! Axum HTTP handlers: search, feed, ingestion seams, and maintenance.

pub mod admin;
pub mod feed;
pub mod issues;
pub mod repos;
pub mod search;
