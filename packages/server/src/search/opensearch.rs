use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use super::{
    SearchHit, SearchIndex, SearchIndexError, SearchPage, SearchRequest, WEIGHTED_FIELDS,
};
use crate::projection::SearchDocument;

/// Gateway to an OpenSearch-compatible cluster over its REST API.
pub struct OpenSearchGateway {
    http: Client,
    base_url: String,
    index: String,
}

impl OpenSearchGateway {
    pub fn new(base_url: &str, index: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            index: index.to_string(),
        }
    }

    fn doc_url(&self, id: &str) -> String {
        format!("{}/{}/_doc/{}", self.base_url, self.index, id)
    }

    /// Create the index with its field mappings. Safe to call on every
    /// startup: an already-existing index is left untouched.
    pub async fn ensure_index(&self) -> Result<(), SearchIndexError> {
        let body = json!({
            "mappings": {
                "properties": {
                    "id":           { "type": "keyword" },
                    "name":         { "type": "text" },
                    "description":  { "type": "text" },
                    "content":      { "type": "text" },
                    "use_cases":    { "type": "keyword" },
                    "categories":   { "type": "keyword" },
                    "tags":         { "type": "keyword" },
                    "licence_type": { "type": "keyword" },
                    "is_free":      { "type": "boolean" },
                    "creator": {
                        "properties": {
                            "id":       { "type": "keyword" },
                            "username": { "type": "text" },
                        }
                    },
                    "created_at":   { "type": "date" },
                }
            }
        });

        let res = self
            .http
            .put(format!("{}/{}", self.base_url, self.index))
            .json(&body)
            .send()
            .await?;

        if res.status() == StatusCode::BAD_REQUEST {
            let body = res.text().await.unwrap_or_default();
            if body.contains("resource_already_exists_exception") {
                return Ok(());
            }
            return Err(SearchIndexError::Backend { status: 400, body });
        }

        Self::check(res).await.map(|_| ())
    }

    async fn check(res: reqwest::Response) -> Result<Value, SearchIndexError> {
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(SearchIndexError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res.json::<Value>().await?)
    }
}

#[async_trait]
impl SearchIndex for OpenSearchGateway {
    async fn upsert(&self, id: &str, document: &SearchDocument) -> Result<(), SearchIndexError> {
        let res = self.http.put(self.doc_url(id)).json(document).send().await?;
        Self::check(res).await.map(|_| ())
    }

    async fn delete(&self, id: &str) -> Result<(), SearchIndexError> {
        let res = self.http.delete(self.doc_url(id)).send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(res).await.map(|_| ())
    }

    async fn query(&self, request: &SearchRequest) -> Result<SearchPage, SearchIndexError> {
        let mut filters = Vec::new();
        if !request.use_cases.is_empty() {
            filters.push(json!({ "terms": { "use_cases": request.use_cases } }));
        }
        if !request.categories.is_empty() {
            filters.push(json!({ "terms": { "categories": request.categories } }));
        }
        if let Some(is_free) = request.is_free {
            filters.push(json!({ "term": { "is_free": is_free } }));
        }
        if let Some(ref licence_type) = request.licence_type {
            filters.push(json!({ "term": { "licence_type": licence_type } }));
        }

        let body = json!({
            "from": request.offset,
            "size": request.limit,
            "query": {
                "bool": {
                    "must": [{
                        "multi_match": {
                            "query": request.text,
                            "fields": WEIGHTED_FIELDS,
                        }
                    }],
                    "filter": filters,
                }
            }
        });

        let res = self
            .http
            .post(format!("{}/{}/_search", self.base_url, self.index))
            .json(&body)
            .send()
            .await?;
        let value = Self::check(res).await?;

        let total = value["hits"]["total"]["value"]
            .as_u64()
            .ok_or_else(|| SearchIndexError::Decode("missing hits.total.value".into()))?;

        let mut results = Vec::new();
        if let Some(hits) = value["hits"]["hits"].as_array() {
            for hit in hits {
                let document: SearchDocument = serde_json::from_value(hit["_source"].clone())
                    .map_err(|e| SearchIndexError::Decode(e.to_string()))?;
                results.push(SearchHit {
                    score: hit["_score"].as_f64().unwrap_or_default(),
                    document,
                });
            }
        }

        Ok(SearchPage { total, results })
    }
}
