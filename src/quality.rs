//! Heuristic quality scoring applied to raw issue text at ingestion time.
//!
//! The Q-score combines four signals extracted from the title and body:
//! fenced code blocks, template section headers, technical keyword density,
//! and junk phrases. All functions here are pure and deterministic.

use serde::{Deserialize, Serialize};

use crate::keywords::{
    DEFAULT_TECH_KEYWORDS, JUNK_REGEXES, TECH_KEYWORDS_BY_LANGUAGE, TEMPLATE_HEADERS,
};

/// Default gate threshold applied by the ingestion pipeline.
pub const DEFAULT_QUALITY_THRESHOLD: f64 = 0.6;

/// Signals extracted from an issue's text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QScoreComponents {
    pub has_code: bool,
    pub has_headers: bool,
    /// Normalized technical keyword density in [0, 1].
    pub tech_weight: f64,
    pub is_junk: bool,
}

/// Extract quality signals from issue title and body.
///
/// `language` selects the keyword table; unknown languages fall back to the
/// default set. Keyword and header matching is case-insensitive.
pub fn extract_components(title: &str, body: &str, language: &str) -> QScoreComponents {
    let has_code = body.contains("```");

    let body_lower = body.to_lowercase();
    let has_headers = TEMPLATE_HEADERS
        .iter()
        .any(|header| body_lower.contains(&header.to_lowercase()));

    let keywords = TECH_KEYWORDS_BY_LANGUAGE
        .get(language)
        .copied()
        .unwrap_or(DEFAULT_TECH_KEYWORDS);
    let combined_text = format!("{title} {body}").to_lowercase();
    let keyword_hits = keywords
        .iter()
        .filter(|kw| combined_text.contains(&kw.to_lowercase()))
        .count();
    let tech_weight = (keyword_hits as f64 / 3.0).min(1.0);

    let is_junk = JUNK_REGEXES.iter().any(|re| re.is_match(body));

    QScoreComponents {
        has_code,
        has_headers,
        tech_weight,
        is_junk,
    }
}

/// Combine components into a single quality score.
///
/// Not clamped: a junk-only issue legitimately scores -0.5.
pub fn compute_q_score(components: &QScoreComponents) -> f64 {
    0.4 * f64::from(components.has_code as u8)
        + 0.3 * f64::from(components.has_headers as u8)
        + 0.2 * components.tech_weight
        - 0.5 * f64::from(components.is_junk as u8)
}

/// Gate check. The boundary is inclusive: a score equal to the threshold passes.
pub fn passes_quality_gate(score: f64, threshold: f64) -> bool {
    score >= threshold
}

/// Score an issue and check it against the gate in one call.
pub fn evaluate_issue(title: &str, body: &str, language: &str, threshold: f64) -> (f64, bool) {
    let components = extract_components(title, body, language);
    let score = compute_q_score(&components);
    (score, passes_quality_gate(score, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(has_code: bool, has_headers: bool, tech_weight: f64, is_junk: bool) -> QScoreComponents {
        QScoreComponents {
            has_code,
            has_headers,
            tech_weight,
            is_junk,
        }
    }

    #[test]
    fn test_q_score_all_signals_no_junk() {
        let score = compute_q_score(&components(true, true, 1.0, false));
        assert!((score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_q_score_individual_signals() {
        assert!((compute_q_score(&components(true, false, 0.0, false)) - 0.4).abs() < 1e-9);
        assert!((compute_q_score(&components(false, true, 0.0, false)) - 0.3).abs() < 1e-9);
        assert!((compute_q_score(&components(false, false, 0.5, false)) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_q_score_junk_only_is_negative() {
        let score = compute_q_score(&components(false, false, 0.0, true));
        assert!((score - (-0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_q_score_mixed() {
        let score = compute_q_score(&components(true, true, 0.5, false));
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_q_score_all_false_is_zero() {
        assert_eq!(compute_q_score(&components(false, false, 0.0, false)), 0.0);
    }

    #[test]
    fn test_gate_boundary_inclusive() {
        assert!(passes_quality_gate(0.6, 0.6));
        assert!(!passes_quality_gate(0.59, 0.6));
    }

    #[test]
    fn test_extract_detects_fenced_code() {
        let c = extract_components("title", "look:\n```rust\npanic!()\n```", "Rust");
        assert!(c.has_code);
        let c = extract_components("title", "no code here", "Rust");
        assert!(!c.has_code);
    }

    #[test]
    fn test_extract_detects_headers_case_insensitive() {
        let c = extract_components("t", "## STEPS TO REPRODUCE\n1. run it", "Go");
        assert!(c.has_headers);
    }

    #[test]
    fn test_extract_tech_weight_capped_at_one() {
        let body = "TypeError ImportError KeyError ValueError RuntimeError in asyncio";
        let c = extract_components("crash", body, "Python");
        assert_eq!(c.tech_weight, 1.0);
    }

    #[test]
    fn test_extract_tech_weight_partial() {
        // One keyword hit out of three needed for full weight.
        let c = extract_components("plain", "hit a deadlock somewhere", "SQL");
        assert!((c.tech_weight - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_extract_unknown_language_uses_default_keywords() {
        let c = extract_components("weird", "stacktrace attached, crash on boot", "Haskell");
        assert!(c.tech_weight > 0.0);
    }

    #[test]
    fn test_extract_flags_junk_phrases() {
        for body in ["+1", "Me Too!", "same issue here", "bump", "any update?"] {
            let c = extract_components("t", body, "Rust");
            assert!(c.is_junk, "expected junk: {body}");
        }
        let c = extract_components("t", "detailed report with repro steps", "Rust");
        assert!(!c.is_junk);
    }

    #[test]
    fn test_evaluate_issue_composes() {
        let body = "## Description\nPanic in tokio runtime\n```rust\nhandle.unwrap();\n```\nasync task leaks";
        let (score, passes) = evaluate_issue("tokio panic", body, "Rust", DEFAULT_QUALITY_THRESHOLD);
        assert!(score >= 0.6, "score was {score}");
        assert!(passes);
    }
}
