use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;

/// Maximum characters to send per query to the embedding API.
/// Search queries are short; this guard only matters when a caller pastes a
/// whole stack trace into the search box.
const MAX_EMBED_CHARS: usize = 3_000;

/// Truncate `text` to at most `MAX_EMBED_CHARS`, splitting on a UTF-8 char boundary.
fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_CHARS {
        return text;
    }
    // Find the last char boundary at or before the limit
    let mut end = MAX_EMBED_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Embed a single query text using the configured provider.
///
/// Callers treat any error as "no embedding" and fall back to lexical-only
/// retrieval; this function never needs to succeed for a search to work.
pub async fn embed_query(
    client: &reqwest::Client,
    config: &LlmConfig,
    text: &str,
) -> Result<Vec<f32>> {
    let truncated = truncate_for_embedding(text);

    match config.provider.as_str() {
        "ollama" => embed_ollama(client, config, truncated).await,
        "openai" => embed_openai(client, config, truncated).await,
        other => anyhow::bail!("Unknown LLM provider: {other}"),
    }
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: Vec<String>,
    /// Ask Ollama to silently truncate inputs that exceed the model's context
    /// length instead of returning a 400 error.
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

async fn embed_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    text: &str,
) -> Result<Vec<f32>> {
    let url = format!("{}/api/embed", config.base_url);

    let req = OllamaEmbedRequest {
        model: config.embedding_model.clone(),
        input: vec![text.to_string()],
        truncate: true,
    };

    let resp = client
        .post(&url)
        .json(&req)
        .send()
        .await
        .context("Failed to call Ollama embed API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Ollama embed API returned {status}: {body}");
    }

    let body: OllamaEmbedResponse = resp
        .json()
        .await
        .context("Failed to parse Ollama embed response")?;

    body.embeddings
        .into_iter()
        .next()
        .context("No embedding returned")
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vec<f32>,
}

async fn embed_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    text: &str,
) -> Result<Vec<f32>> {
    let url = format!("{}/v1/embeddings", config.base_url);
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = OpenAiEmbedRequest {
        model: config.embedding_model.clone(),
        input: vec![text.to_string()],
    };

    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&req)
        .send()
        .await
        .context("Failed to call OpenAI embed API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI embed API returned {status}: {body}");
    }

    let body: OpenAiEmbedResponse = resp
        .json()
        .await
        .context("Failed to parse OpenAI embed response")?;

    body.data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .context("No embedding returned")
}
