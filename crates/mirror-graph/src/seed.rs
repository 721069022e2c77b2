//! Source-side test-data seeding.
//!
//! Creates `(:Resource)-[:RELATES_TO]->(:Resource)` triples on the
//! source so the replicator has changes to pick up.

use anyhow::{Context, Result};
use neo4rs::Query;
use serde_json::json;
use uuid::Uuid;

use crate::client::GraphClient;
use crate::params::bolt_value;

const SEED_QUERY: &str = "UNWIND $triples AS triple\n\
MERGE (s:Resource:Unique {id: triple.source, external_id: triple.source})\n\
MERGE (t:Resource:Unique {id: triple.target, external_id: triple.target})\n\
MERGE (s)-[:RELATES_TO {id: triple.edge}]->(t)";

/// Create `count` triples in one write. Node and edge identifiers are
/// fresh UUIDs, so repeated seeding keeps adding new data.
pub async fn seed_triples(client: &GraphClient, count: usize) -> Result<()> {
    let triples = generate_triples(count);
    let query = Query::new(SEED_QUERY.to_string()).param("triples", bolt_value(&triples));
    client.run(query).await.context("seed write failed")
}

fn generate_triples(count: usize) -> serde_json::Value {
    let triples: Vec<_> = (0..count)
        .map(|_| {
            json!({
                "source": Uuid::new_v4().to_string(),
                "target": Uuid::new_v4().to_string(),
                "edge": Uuid::new_v4().to_string(),
            })
        })
        .collect();
    json!(triples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_triples_shape() {
        let triples = generate_triples(3);
        let triples = triples.as_array().unwrap();
        assert_eq!(triples.len(), 3);
        for triple in triples {
            assert!(triple["source"].is_string());
            assert!(triple["target"].is_string());
            assert!(triple["edge"].is_string());
            assert_ne!(triple["source"], triple["target"]);
        }
    }
}
