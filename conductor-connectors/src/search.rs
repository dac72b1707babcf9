//! A query connector over documents held in memory.

use crate::request_map;
use async_trait::async_trait;
use flow0::connector::{Capability, Connector};
use flow0::error::ConnectorError;
use flow0::id::ConnectorName;
use flow0::value::Value;
use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: i64 = 5;

/// A searchable document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier, returned with each hit.
    pub id: String,
    /// Searchable text.
    pub text: String,
}

impl Document {
    /// Create a document.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Case-insensitive keyword search.
///
/// Requests carry `query` (text) and an optional positive `limit`
/// (default 5). A document scores one point per occurrence of each query
/// term among its words. The response is `{hits: [{id, text, score}],
/// total}` with hits ordered by score, then id; `total` counts every
/// matching document before the limit is applied.
pub struct MemorySearch {
    name: ConnectorName,
    documents: Vec<Document>,
}

impl MemorySearch {
    /// Search over `documents`.
    pub fn new(name: impl Into<ConnectorName>, documents: Vec<Document>) -> Self {
        Self {
            name: name.into(),
            documents,
        }
    }

    /// Number of documents held.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no documents are held.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn score(query: &[String], document: &Document) -> i64 {
    let words = terms(&document.text);
    query
        .iter()
        .map(|q| words.iter().filter(|w| *w == q).count() as i64)
        .sum()
}

#[async_trait]
impl Connector for MemorySearch {
    fn name(&self) -> &ConnectorName {
        &self.name
    }

    fn capability(&self) -> Capability {
        Capability::Query
    }

    async fn call(&self, request: Value) -> Result<Value, ConnectorError> {
        let request = request_map(&request)?;
        let query = match request.get("query") {
            Some(Value::Text(q)) => terms(q),
            Some(other) => {
                return Err(ConnectorError::InvalidRequest(format!(
                    "query must be text, got {}",
                    other.kind()
                )));
            }
            None => return Err(ConnectorError::InvalidRequest("missing field query".into())),
        };
        if query.is_empty() {
            return Err(ConnectorError::InvalidRequest("empty query".into()));
        }
        let limit = match request.get("limit") {
            None => DEFAULT_LIMIT,
            Some(v) => match v.as_i64() {
                Some(n) if n > 0 => n,
                _ => {
                    return Err(ConnectorError::InvalidRequest(
                        "limit must be a positive integer".into(),
                    ));
                }
            },
        };

        let mut hits: Vec<(i64, &Document)> = self
            .documents
            .iter()
            .map(|d| (score(&query, d), d))
            .filter(|(s, _)| *s > 0)
            .collect();
        hits.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
        let total = hits.len() as i64;

        tracing::debug!(connector = %self.name, total, limit, "conductor.search.query");

        let hits = hits
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|(score, d)| {
                Value::map([
                    ("id", Value::text(d.id.clone())),
                    ("text", Value::text(d.text.clone())),
                    ("score", Value::Int(score)),
                ])
            })
            .collect();
        Ok(Value::map([
            ("hits", Value::List(hits)),
            ("total", Value::Int(total)),
        ]))
    }
}
