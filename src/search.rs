//! Ranked full-text search over the generated record list.
//!
//! Loads the flat record list written by [`crate::search_index`] into an
//! in-memory tantivy index. Titles and excerpts are stemmed English text;
//! title matches are boosted well above excerpt matches. Results are unique
//! by slug and capped at the caller's limit.

use crate::types::SearchRecord;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{
    Field, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions, Value,
};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, doc};
use thiserror::Error;
use tracing::{debug, warn};

/// Title matches weigh this much more than excerpt matches.
pub const TITLE_BOOST: f32 = 10.0;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("index error: {0}")]
    Index(#[from] tantivy::TantivyError),
}

pub struct SearchIndex {
    records: Vec<SearchRecord>,
    by_slug: HashMap<String, usize>,
    reader: IndexReader,
    query_parser: QueryParser,
    slug_field: Field,
}

impl SearchIndex {
    /// Build the index from records. The first record wins for a repeated slug.
    pub fn build(records: Vec<SearchRecord>) -> Result<Self, SearchError> {
        let mut schema_builder = Schema::builder();
        let text_options = TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer("en_stem")
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        );
        let slug_field = schema_builder.add_text_field("slug", STRING | STORED);
        let title_field = schema_builder.add_text_field("title", text_options.clone());
        let excerpt_field = schema_builder.add_text_field("excerpt", text_options);
        let index = Index::create_in_ram(schema_builder.build());

        let mut by_slug = HashMap::new();
        let mut writer: IndexWriter = index.writer(50_000_000)?;
        for (i, record) in records.iter().enumerate() {
            if by_slug.contains_key(&record.slug) {
                continue;
            }
            by_slug.insert(record.slug.clone(), i);
            writer.add_document(doc!(
                slug_field => record.slug.clone(),
                title_field => record.title.clone(),
                excerpt_field => record.excerpt.clone(),
            ))?;
        }
        writer.commit()?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        let mut query_parser = QueryParser::for_index(&index, vec![title_field, excerpt_field]);
        query_parser.set_field_boost(title_field, TITLE_BOOST);

        debug!(documents = by_slug.len(), "built search index");
        Ok(Self {
            records,
            by_slug,
            reader,
            query_parser,
            slug_field,
        })
    }

    /// Load the JSON record list at `path` and index it.
    pub fn load(path: &Path) -> Result<Self, SearchError> {
        let raw = fs::read_to_string(path)?;
        let records: Vec<SearchRecord> = serde_json::from_str(&raw)?;
        Self::build(records)
    }

    /// Number of indexed (unique) documents.
    pub fn len(&self) -> usize {
        self.by_slug.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slug.is_empty()
    }

    /// Ranked records matching `query`, unique by slug, at most `limit`.
    ///
    /// Blank queries match nothing. Query syntax errors are tolerated: the
    /// parseable part of the query is still run.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchRecord> {
        let query = query.trim();
        if query.is_empty() || limit == 0 || self.is_empty() {
            return Vec::new();
        }

        let (parsed, errors) = self.query_parser.parse_query_lenient(query);
        if !errors.is_empty() {
            debug!(query, errors = errors.len(), "query parsed leniently");
        }

        let searcher = self.reader.searcher();
        let top_docs = match searcher.search(&parsed, &TopDocs::with_limit(self.len())) {
            Ok(docs) => docs,
            Err(e) => {
                warn!(query, error = %e, "search failed");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        top_docs
            .into_iter()
            .filter_map(|(_score, address)| {
                let doc: TantivyDocument = searcher.doc(address).ok()?;
                let slug = doc.get_first(self.slug_field)?.as_str()?.to_string();
                seen.insert(slug.clone()).then_some(slug)
            })
            .filter_map(|slug| self.by_slug.get(&slug).map(|&i| self.records[i].clone()))
            .take(limit)
            .collect()
    }
}
