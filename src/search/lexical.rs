use anyhow::{Context, Result};
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::*;
use tantivy::{doc, Index, IndexWriter, ReloadPolicy};

use crate::models::{Issue, IssueState};

/// Full-text relevance index over issue titles and bodies, built on tantivy.
///
/// Only candidate ordering lives here: search returns ranked node ids and the
/// store hydrates everything else.
pub struct LexicalIndex {
    index: Index,
    #[allow(dead_code)]
    schema: Schema,
    // Field handles
    f_node_id: Field,
    f_title: Field,
    f_body: Field,
    f_state: Field,
}

impl LexicalIndex {
    /// Create or open the index at the given directory.
    pub fn open_or_create(index_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(index_dir)?;

        let mut schema_builder = Schema::builder();
        let f_node_id = schema_builder.add_text_field("node_id", STRING | STORED);
        let f_title = schema_builder.add_text_field("title", TEXT);
        let f_body = schema_builder.add_text_field("body", TEXT);
        let f_state = schema_builder.add_text_field("state", STRING | STORED);

        let schema = schema_builder.build();

        let index = if index_dir.join("meta.json").exists() {
            Index::open_in_dir(index_dir).context("Failed to open existing tantivy index")?
        } else {
            Index::create_in_dir(index_dir, schema.clone())
                .context("Failed to create tantivy index")?
        };

        Ok(Self {
            index,
            schema,
            f_node_id,
            f_title,
            f_body,
            f_state,
        })
    }

    /// Index a batch of issues, replacing any previous document per node id.
    pub fn upsert_issues(&self, issues: &[Issue]) -> Result<()> {
        let mut writer: IndexWriter = self
            .index
            .writer(50_000_000)
            .context("Failed to create index writer")?;

        for issue in issues {
            let term = tantivy::Term::from_field_text(self.f_node_id, &issue.node_id);
            writer.delete_term(term);

            let state = match issue.state {
                IssueState::Open => "open",
                IssueState::Closed => "closed",
            };
            writer.add_document(doc!(
                self.f_node_id => issue.node_id.clone(),
                self.f_title => issue.title.clone(),
                self.f_body => issue.body_text.clone(),
                self.f_state => state,
            ))?;
        }

        writer.commit().context("Failed to commit index")?;
        Ok(())
    }

    /// Delete documents for the given node ids (Janitor path).
    pub fn delete_issues(&self, node_ids: &[String]) -> Result<()> {
        if node_ids.is_empty() {
            return Ok(());
        }

        let mut writer: IndexWriter = self
            .index
            .writer(50_000_000)
            .context("Failed to create index writer")?;

        for node_id in node_ids {
            let term = tantivy::Term::from_field_text(self.f_node_id, node_id);
            writer.delete_term(term);
        }
        writer.commit().context("Failed to commit delete")?;
        Ok(())
    }

    /// Search the index and return node ids of open issues, best first.
    pub fn search(&self, query_str: &str, limit: usize) -> Result<Vec<String>> {
        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .context("Failed to create reader")?;

        let searcher = reader.searcher();

        let query_parser = QueryParser::for_index(&self.index, vec![self.f_title, self.f_body]);
        // Lenient parse: user queries are free text, not tantivy syntax.
        let (query, _errors) = query_parser.parse_query_lenient(query_str);

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit((limit * 2).max(1)))
            .context("Search failed")?;

        let mut hits = Vec::new();

        for (_score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(doc_address)
                .context("Failed to retrieve document")?;

            let state = doc
                .get_first(self.f_state)
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            if state != "open" {
                continue;
            }

            let node_id = doc
                .get_first(self.f_node_id)
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            if node_id.is_empty() {
                continue;
            }

            hits.push(node_id.to_string());

            if hits.len() >= limit {
                break;
            }
        }

        Ok(hits)
    }
}
