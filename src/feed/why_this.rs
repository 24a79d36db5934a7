use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::keywords::{
    normalize_skill, DEFAULT_TECH_KEYWORDS, PROFILE_LANGUAGES, TECH_KEYWORDS_BY_LANGUAGE,
};
use crate::models::{UserProfile, WhyThisItem};

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z0-9\+\#\.]+").expect("static pattern compiles"));

/// Strip everything but ascii alphanumerics for fuzzy-but-deterministic
/// comparisons ("Next.js" == "nextjs").
fn norm(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Whitelisted profile entities eligible to appear in an explanation.
/// Free-form topics and skills only survive if the taxonomy knows them.
fn extract_profile_entities(profile: &UserProfile) -> HashSet<String> {
    let mut entities = HashSet::new();

    for lang in profile
        .preferred_languages
        .iter()
        .chain(profile.github_languages.iter())
    {
        if PROFILE_LANGUAGES.contains(&lang.as_str()) {
            entities.insert(lang.clone());
        }
    }

    for raw in profile
        .preferred_topics
        .iter()
        .chain(profile.github_topics.iter())
        .chain(profile.resume_skills.iter())
    {
        if let Some(canonical) = normalize_skill(raw) {
            entities.insert(canonical.to_string());
        }
    }

    entities
}

/// Compute deterministic "why this was recommended" explanations from fields
/// already fetched for the feed item — no extra queries. Returns the top-k
/// entities by score descending, entity ascending.
pub fn compute_why_this(
    profile: &UserProfile,
    issue_title: &str,
    issue_body_preview: &str,
    issue_labels: &[String],
    repo_primary_language: Option<&str>,
    repo_topics: &[String],
    top_k: usize,
) -> Vec<WhyThisItem> {
    let entities = extract_profile_entities(profile);
    if entities.is_empty() {
        return Vec::new();
    }

    let label_norms: HashSet<String> = issue_labels
        .iter()
        .filter(|l| !l.is_empty())
        .map(|l| norm(l))
        .collect();

    let topic_norms: HashSet<String> = repo_topics
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| norm(normalize_skill(t).unwrap_or(t)))
        .collect();

    let lang_norm = repo_primary_language.map(norm).unwrap_or_default();

    let text = format!("{issue_title}\n{issue_body_preview}").to_lowercase();
    let token_norms: HashSet<String> = TOKEN_RE
        .find_iter(&text)
        .map(|m| norm(m.as_str()))
        .collect();

    let tech_norms: HashSet<String> = match repo_primary_language
        .and_then(|lang| TECH_KEYWORDS_BY_LANGUAGE.get(lang))
    {
        Some(keywords) => keywords.iter().map(|k| norm(k)).collect(),
        None => DEFAULT_TECH_KEYWORDS.iter().map(|k| norm(k)).collect(),
    };

    let mut ranked: Vec<WhyThisItem> = entities
        .into_iter()
        .filter_map(|entity| {
            let entity_norm = norm(&entity);
            if entity_norm.is_empty() {
                return None;
            }

            let mut score = 0.0;
            if label_norms.contains(&entity_norm) {
                score += 3.0;
            }
            if !lang_norm.is_empty() && entity_norm == lang_norm {
                score += 2.5;
            }
            if topic_norms.contains(&entity_norm) {
                score += 2.0;
            }
            if token_norms.contains(&entity_norm)
                || tech_norms.contains(&entity_norm)
                || text.contains(&entity.to_lowercase())
            {
                score += 1.0;
            }

            (score > 0.0).then_some(WhyThisItem { entity, score })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.entity.to_lowercase().cmp(&b.entity.to_lowercase()))
    });
    ranked.truncate(top_k);
    ranked
}
