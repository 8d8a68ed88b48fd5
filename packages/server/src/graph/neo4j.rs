use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::{EdgeSpec, GraphError, GraphStore, Relation};

/// Gateway to Neo4j over its HTTP transactional endpoint.
///
/// Every call is a single auto-committed transaction; the batched
/// statements within it either all apply or none do.
pub struct Neo4jGateway {
    http: Client,
    tx_url: String,
    username: String,
    password: String,
}

impl Neo4jGateway {
    pub fn new(base_url: &str, database: &str, username: &str, password: &str) -> Self {
        Self {
            http: Client::new(),
            tx_url: format!("{}/db/{}/tx/commit", base_url.trim_end_matches('/'), database),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    async fn commit(&self, statements: Vec<Value>) -> Result<(), GraphError> {
        if statements.is_empty() {
            return Ok(());
        }

        let res = self
            .http
            .post(&self.tx_url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&json!({ "statements": statements }))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(GraphError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = res.json().await?;
        if let Some(first) = body["errors"].as_array().and_then(|errors| errors.first()) {
            return Err(GraphError::Statement(
                first["message"].as_str().unwrap_or("unknown error").to_string(),
            ));
        }

        Ok(())
    }

    fn merge_statement(edge: &EdgeSpec) -> Value {
        json!({
            "statement": format!(
                "MERGE (p:Prefab {{id: $prefab_id}}) \
                 MERGE (t:{} {{name: $name}}) \
                 MERGE (p)-[:{}]->(t)",
                edge.relation.node_label(),
                edge.relation.rel_type(),
            ),
            "parameters": { "prefab_id": edge.prefab_id, "name": edge.target },
        })
    }

    fn prune_statement(prefab_id: &str, relation: Relation, keep: Vec<&str>) -> Value {
        json!({
            "statement": format!(
                "MATCH (p:Prefab {{id: $prefab_id}})-[r:{}]->(t:{}) \
                 WHERE NOT t.name IN $keep DELETE r",
                relation.rel_type(),
                relation.node_label(),
            ),
            "parameters": { "prefab_id": prefab_id, "keep": keep },
        })
    }
}

#[async_trait]
impl GraphStore for Neo4jGateway {
    async fn apply_edges(&self, edges: &[EdgeSpec]) -> Result<(), GraphError> {
        self.commit(edges.iter().map(Self::merge_statement).collect())
            .await
    }

    async fn replace_edges(&self, prefab_id: &str, edges: &[EdgeSpec]) -> Result<(), GraphError> {
        let mut statements: Vec<Value> = edges.iter().map(Self::merge_statement).collect();

        // Prune per relation kind, with an empty keep list dropping them all.
        for relation in Relation::ALL {
            let keep: Vec<&str> = edges
                .iter()
                .filter(|edge| edge.relation == relation)
                .map(|edge| edge.target.as_str())
                .collect();
            statements.push(Self::prune_statement(prefab_id, relation, keep));
        }

        self.commit(statements).await
    }

    async fn remove_prefab(&self, prefab_id: &str) -> Result<(), GraphError> {
        self.commit(vec![json!({
            "statement": "MATCH (p:Prefab {id: $prefab_id}) DETACH DELETE p",
            "parameters": { "prefab_id": prefab_id },
        })])
        .await
    }
}
