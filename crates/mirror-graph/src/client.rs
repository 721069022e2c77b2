//! Neo4j connection client.

use anyhow::{Context, Result};
use neo4rs::{ConfigBuilder, Graph, Query, Row, Txn};
use serde::Deserialize;

/// Configuration for one graph endpoint (source or sink).
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Database name; empty means the server default.
    #[serde(default)]
    pub database: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "password".to_string(),
            database: String::new(),
        }
    }
}

/// Client for one graph database endpoint.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Create a new GraphClient from config.
    ///
    /// Note: neo4rs uses a lazy deadpool — `Graph::connect` only creates
    /// the pool object and does NOT establish a real bolt connection yet.
    /// We run a cheap `RETURN 1` ping immediately so that callers can
    /// wrap this in a timeout and get a fast failure when the endpoint is
    /// unreachable instead of hanging silently.
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let mut builder = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(4)
            .fetch_size(200);
        if !config.database.is_empty() {
            builder = builder.db(config.database.as_str());
        }
        let neo4j_config = builder
            .build()
            .with_context(|| format!("Failed to build driver config for {}", config.uri))?;

        let graph = Graph::connect(neo4j_config)
            .await
            .with_context(|| format!("Failed to create connection pool for {}", config.uri))?;

        // Ping to force an actual TCP+bolt handshake so the caller's timeout works.
        graph
            .run(Query::new("RETURN 1".to_string()))
            .await
            .with_context(|| format!("{} is not responding to queries", config.uri))?;

        Ok(Self { graph })
    }

    /// Execute a cypher query that returns no results.
    pub async fn run(&self, query: Query) -> Result<()> {
        self.graph.run(query).await.context("query execution failed")?;
        Ok(())
    }

    /// Execute a cypher query and collect all result rows.
    pub async fn rows(&self, query: Query) -> Result<Vec<Row>> {
        let mut result = self.graph.execute(query).await.context("query failed")?;

        let mut rows = Vec::new();
        while let Some(row) = result.next().await.context("result stream failed")? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Open an explicit transaction.
    pub async fn begin(&self) -> Result<Txn> {
        self.graph
            .start_txn()
            .await
            .context("unable to start transaction")
    }

    /// Get a reference to the underlying neo4rs Graph.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }
}
