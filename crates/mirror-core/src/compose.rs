//! Mutation-query composition.
//!
//! One entry point per operation, each dispatching on the entity kind
//! and assembling a complete cypher mutation from pattern fragments.
//! Re-executing any generated query is semantically safe: relationship
//! creates MERGE on key properties, updates and deletes MATCH by keys.
//! That idempotence is what makes at-least-once delivery acceptable.

use crate::error::EventError;
use crate::event::{ChangeEvent, EntityChange, EntityState, RelationshipChange, StateChange};
use crate::pattern::{
    attribute_assignments, label_pattern, node_pattern, relationship_pattern, Params,
};

const NODE_VAR: &str = "n";
const START_VAR: &str = "start";
const REL_VAR: &str = "rel";
const END_VAR: &str = "end";

/// A composed mutation: cypher text plus its parameter bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub cypher: String,
    pub params: Params,
}

/// Translate a validated change event into a sink mutation.
///
/// `Ok(None)` means the event is recognized but there is nothing to do
/// (e.g. an update whose attribute diff is empty and whose label list is
/// empty). Callers must skip cleanly but still advance the cursor.
pub fn compose(event: &ChangeEvent) -> Result<Option<Mutation>, EventError> {
    match event {
        ChangeEvent::Create(entity) => create(entity),
        ChangeEvent::Update(entity) => update(entity),
        ChangeEvent::Delete(entity) => delete(entity),
    }
}

fn create(entity: &EntityChange) -> Result<Option<Mutation>, EventError> {
    match entity {
        EntityChange::Node(node) => {
            let (state, after) = after_state(node.state.as_ref(), "create")?;

            let (pattern, mut params) = node_pattern(&node.keys, NODE_VAR);
            let labels = label_pattern(&after.labels);
            let (assignments, assignment_params) = attribute_assignments(state, NODE_VAR);
            params.extend(assignment_params);

            let mut cypher = format!("CREATE {pattern}");
            if !labels.is_empty() {
                cypher.push_str(&format!("\nSET {NODE_VAR}{labels}"));
            }
            if !assignments.is_empty() {
                cypher.push_str(&format!("\nSET {assignments}"));
            }
            Ok(Some(Mutation { cypher, params }))
        }
        EntityChange::Relationship(rel) => {
            let (state, _) = after_state(rel.state.as_ref(), "create")?;
            let (start, end, pattern, mut params) = endpoint_patterns(rel);
            let (assignments, assignment_params) = attribute_assignments(state, REL_VAR);
            params.extend(assignment_params);

            let mut cypher = format!("MATCH {start}\nMATCH {end}\nMERGE {pattern}");
            if !assignments.is_empty() {
                cypher.push_str(&format!("\nSET {assignments}"));
            }
            Ok(Some(Mutation { cypher, params }))
        }
    }
}

fn update(entity: &EntityChange) -> Result<Option<Mutation>, EventError> {
    match entity {
        EntityChange::Node(node) => {
            let (state, after) = after_state(node.state.as_ref(), "update")?;

            let (pattern, mut params) = node_pattern(&node.keys, NODE_VAR);
            let labels = label_pattern(&after.labels);
            let (assignments, assignment_params) = attribute_assignments(state, NODE_VAR);
            if labels.is_empty() && assignments.is_empty() {
                return Ok(None);
            }
            params.extend(assignment_params);

            let mut cypher = format!("MATCH {pattern}");
            if !assignments.is_empty() {
                cypher.push_str(&format!("\nSET {assignments}"));
            }
            if !labels.is_empty() {
                cypher.push_str(&format!("\nSET {NODE_VAR}{labels}"));
            }
            Ok(Some(Mutation { cypher, params }))
        }
        EntityChange::Relationship(rel) => {
            let (state, _) = after_state(rel.state.as_ref(), "update")?;
            let (assignments, assignment_params) = attribute_assignments(state, REL_VAR);
            if assignments.is_empty() {
                return Ok(None);
            }

            let (start, end, pattern, mut params) = endpoint_patterns(rel);
            params.extend(assignment_params);

            let cypher =
                format!("MATCH {start}\nMATCH {end}\nMATCH {pattern}\nSET {assignments}");
            Ok(Some(Mutation { cypher, params }))
        }
    }
}

fn delete(entity: &EntityChange) -> Result<Option<Mutation>, EventError> {
    match entity {
        EntityChange::Node(node) => {
            let (pattern, params) = node_pattern(&node.keys, NODE_VAR);
            let cypher = format!("MATCH {pattern}\nDETACH DELETE {NODE_VAR}");
            Ok(Some(Mutation { cypher, params }))
        }
        EntityChange::Relationship(rel) => {
            let (start, end, pattern, params) = endpoint_patterns(rel);
            let cypher =
                format!("MATCH {start}\nMATCH {end}\nMATCH {pattern}\nDELETE {REL_VAR}");
            Ok(Some(Mutation { cypher, params }))
        }
    }
}

/// Build both endpoint patterns and the relationship pattern, merging
/// their parameter maps. Names never collide: the maps are namespaced by
/// the `start`/`end`/`rel` variables.
fn endpoint_patterns(rel: &RelationshipChange) -> (String, String, String, Params) {
    let (start, mut params) = node_pattern(&rel.start, START_VAR);
    let (end, end_params) = node_pattern(&rel.end, END_VAR);
    let (pattern, key_params) = relationship_pattern(rel, START_VAR, REL_VAR, END_VAR);
    params.extend(end_params);
    params.extend(key_params);
    (start, end, pattern, params)
}

fn after_state<'a>(
    state: Option<&'a StateChange>,
    operation: &'static str,
) -> Result<(&'a StateChange, &'a EntityState), EventError> {
    state
        .and_then(|state| state.after.as_ref().map(|after| (state, after)))
        .ok_or(EventError::MissingAfterState { operation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RawEvent;
    use serde_json::json;

    fn event(value: serde_json::Value) -> ChangeEvent {
        let raw: RawEvent = serde_json::from_value(value).unwrap();
        ChangeEvent::try_from(raw).unwrap()
    }

    #[test]
    fn test_create_node() {
        let mutation = compose(&event(json!({
            "operation": "c",
            "eventType": "n",
            "keys": {"Car": {"id": "A"}},
            "state": {"after": {"labels": ["Car", "Unique"], "properties": {"color": "red"}}}
        })))
        .unwrap()
        .unwrap();

        assert_eq!(
            mutation.cypher,
            "CREATE (n:Car {id: $n_merge_value_0})\n\
             SET n:Car:Unique\n\
             SET n.color=$n_value_0"
        );
        assert_eq!(mutation.params["n_merge_value_0"], json!("A"));
        assert_eq!(mutation.params["n_value_0"], json!("red"));
    }

    #[test]
    fn test_create_node_without_new_attributes_omits_attribute_set() {
        let mutation = compose(&event(json!({
            "operation": "c",
            "eventType": "n",
            "keys": {"Car": {"id": "A"}},
            "state": {"after": {"labels": ["Car"], "properties": {}}}
        })))
        .unwrap()
        .unwrap();

        assert_eq!(
            mutation.cypher,
            "CREATE (n:Car {id: $n_merge_value_0})\nSET n:Car"
        );
    }

    #[test]
    fn test_create_relationship_merges_on_key() {
        let mutation = compose(&event(json!({
            "operation": "c",
            "eventType": "r",
            "type": "OWNS",
            "key": {"since": 2020},
            "start": {"keys": {"Car": {"id": "A"}}},
            "end": {"keys": {"Person": {"id": "P"}}},
            "state": {"after": {"properties": {"note": "x"}}}
        })))
        .unwrap()
        .unwrap();

        assert_eq!(
            mutation.cypher,
            "MATCH (start:Car {id: $start_merge_value_0})\n\
             MATCH (end:Person {id: $end_merge_value_0})\n\
             MERGE (start)-[rel:OWNS {since: $rel_rel_attr_0}]->(end)\n\
             SET rel.note=$rel_value_0"
        );
        assert_eq!(mutation.params["start_merge_value_0"], json!("A"));
        assert_eq!(mutation.params["end_merge_value_0"], json!("P"));
        assert_eq!(mutation.params["rel_rel_attr_0"], json!(2020));
        assert_eq!(mutation.params["rel_value_0"], json!("x"));
    }

    #[test]
    fn test_update_node_label_only() {
        let mutation = compose(&event(json!({
            "operation": "u",
            "eventType": "n",
            "keys": {"Car": {"id": "A"}},
            "state": {
                "before": {"properties": {"color": "red"}},
                "after": {"labels": ["Car", "Classic"], "properties": {"color": "red"}}
            }
        })))
        .unwrap()
        .unwrap();

        assert_eq!(
            mutation.cypher,
            "MATCH (n:Car {id: $n_merge_value_0})\nSET n:Car:Classic"
        );
        assert_eq!(mutation.params.len(), 1);
    }

    #[test]
    fn test_update_node_noop() {
        let result = compose(&event(json!({
            "operation": "u",
            "eventType": "n",
            "keys": {"Car": {"id": "A"}},
            "state": {
                "before": {"properties": {"color": "red"}},
                "after": {"labels": [], "properties": {"color": "red"}}
            }
        })))
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_update_relationship() {
        let mutation = compose(&event(json!({
            "operation": "u",
            "eventType": "r",
            "type": "OWNS",
            "key": {"since": 2020},
            "start": {"keys": {"Car": {"id": "A"}}},
            "end": {"keys": {"Person": {"id": "P"}}},
            "state": {
                "before": {"properties": {"note": "x"}},
                "after": {"properties": {"note": "y"}}
            }
        })))
        .unwrap()
        .unwrap();

        assert_eq!(
            mutation.cypher,
            "MATCH (start:Car {id: $start_merge_value_0})\n\
             MATCH (end:Person {id: $end_merge_value_0})\n\
             MATCH (start)-[rel:OWNS {since: $rel_rel_attr_0}]->(end)\n\
             SET rel.note=$rel_value_0"
        );
        assert_eq!(mutation.params["rel_value_0"], json!("y"));
    }

    #[test]
    fn test_update_relationship_noop_when_diff_empty() {
        let result = compose(&event(json!({
            "operation": "u",
            "eventType": "r",
            "type": "OWNS",
            "key": {},
            "start": {"keys": {"Car": {"id": "A"}}},
            "end": {"keys": {"Person": {"id": "P"}}},
            "state": {
                "before": {"properties": {"note": "x"}},
                "after": {"properties": {"note": "x"}}
            }
        })))
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_delete_node() {
        let mutation = compose(&event(json!({
            "operation": "d",
            "eventType": "n",
            "keys": {"Car": {"id": "A"}}
        })))
        .unwrap()
        .unwrap();

        assert_eq!(
            mutation.cypher,
            "MATCH (n:Car {id: $n_merge_value_0})\nDETACH DELETE n"
        );
        assert_eq!(mutation.params["n_merge_value_0"], json!("A"));
    }

    #[test]
    fn test_delete_relationship() {
        let mutation = compose(&event(json!({
            "operation": "d",
            "eventType": "r",
            "type": "OWNS",
            "key": {"since": 2020},
            "start": {"keys": {"Car": {"id": "A"}}},
            "end": {"keys": {"Person": {"id": "P"}}}
        })))
        .unwrap()
        .unwrap();

        assert_eq!(
            mutation.cypher,
            "MATCH (start:Car {id: $start_merge_value_0})\n\
             MATCH (end:Person {id: $end_merge_value_0})\n\
             MATCH (start)-[rel:OWNS {since: $rel_rel_attr_0}]->(end)\n\
             DELETE rel"
        );
    }

    #[test]
    fn test_create_requires_after_state() {
        let err = compose(&event(json!({
            "operation": "c",
            "eventType": "n",
            "keys": {"Car": {"id": "A"}}
        })))
        .unwrap_err();
        assert_eq!(err, EventError::MissingAfterState { operation: "create" });
    }

    #[test]
    fn test_update_requires_after_state() {
        let err = compose(&event(json!({
            "operation": "u",
            "eventType": "r",
            "type": "OWNS",
            "key": {},
            "start": {"keys": {}},
            "end": {"keys": {}},
            "state": {"before": {"properties": {"note": "x"}}}
        })))
        .unwrap_err();
        assert_eq!(err, EventError::MissingAfterState { operation: "update" });
    }

    #[test]
    fn test_compose_is_deterministic() {
        let e = event(json!({
            "operation": "c",
            "eventType": "n",
            "keys": {"Car": {"plate": "X", "id": "A"}, "Unique": {"vin": "V"}},
            "state": {"after": {
                "labels": ["Car", "Unique"],
                "properties": {"color": "red", "doors": 4}
            }}
        }));
        let first = compose(&e).unwrap().unwrap();
        let second = compose(&e).unwrap().unwrap();
        assert_eq!(first, second);
    }
}
