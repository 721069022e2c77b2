//! Cypher pattern fragments.
//!
//! Four pure builders turn pieces of a validated change event into
//! textual pattern fragments plus parameter bindings. Parameter names
//! are synthesized deterministically per fragment (`{var}_merge_value_{n}`,
//! `{var}_rel_attr_{n}`, `{var}_value_{n}`) and namespaced by variable,
//! so maps from one event merge without collisions. Iteration is over
//! sorted maps, which makes the rendered text deterministic and lets
//! tests compare queries by string equality.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::event::{LabelKeys, RelationshipChange, StateChange};

/// Flat parameter map for one generated query.
pub type Params = BTreeMap<String, Value>;

/// Render a node pattern `(var:L1:L2 {k: $var_merge_value_0, ...})` from
/// a `keys` block.
///
/// Labels are joined in sorted order. Key properties are unioned across
/// all label buckets; on a name collision the later bucket wins (a known
/// source quirk, preserved). The property block is omitted entirely when
/// the union is empty.
pub fn node_pattern(keys: &LabelKeys, var: &str) -> (String, Params) {
    let mut labels = String::new();
    let mut union: BTreeMap<&str, &Value> = BTreeMap::new();
    for (label, bucket) in keys {
        labels.push(':');
        labels.push_str(label);
        for (name, value) in bucket {
            union.insert(name, value);
        }
    }

    let mut pairs = Vec::with_capacity(union.len());
    let mut params = Params::new();
    for (n, (name, value)) in union.into_iter().enumerate() {
        let param = format!("{var}_merge_value_{n}");
        pairs.push(format!("{name}: ${param}"));
        params.insert(param, value.clone());
    }

    let pattern = if pairs.is_empty() {
        format!("({var}{labels})")
    } else {
        format!("({var}{labels} {{{}}})", pairs.join(", "))
    };
    (pattern, params)
}

/// Render `:L1:L2...` for re-asserting labels after a create or update.
/// Empty when the sequence is empty; order is preserved as given.
pub fn label_pattern(labels: &[String]) -> String {
    let mut out = String::new();
    for label in labels {
        out.push(':');
        out.push_str(label);
    }
    out
}

/// Render `(start)-[rel:TYPE {k: $rel_rel_attr_0}]->(end)` for a
/// relationship change. The property block is emitted only when the
/// relationship key is non-empty.
pub fn relationship_pattern(
    rel: &RelationshipChange,
    start_var: &str,
    rel_var: &str,
    end_var: &str,
) -> (String, Params) {
    let mut pairs = Vec::with_capacity(rel.key.len());
    let mut params = Params::new();
    for (n, (name, value)) in rel.key.iter().enumerate() {
        let param = format!("{rel_var}_rel_attr_{n}");
        pairs.push(format!("{name}: ${param}"));
        params.insert(param, value.clone());
    }

    let props = if pairs.is_empty() {
        String::new()
    } else {
        format!(" {{{}}}", pairs.join(", "))
    };
    let pattern = format!(
        "({start_var})-[{rel_var}:{}{props}]->({end_var})",
        rel.rel_type
    );
    (pattern, params)
}

/// Render the assignment list `var.k=$var_value_0, ...` for the
/// properties that actually changed between `before` and `after`.
///
/// A property is included when it is absent from `before` or its value
/// is not deep-equal to the `before` value. When `before` is absent, all
/// `after` properties are emitted. An empty diff yields an empty string;
/// callers must omit the enclosing SET clause in that case.
pub fn attribute_assignments(state: &StateChange, var: &str) -> (String, Params) {
    let empty = BTreeMap::new();
    let before = state
        .before
        .as_ref()
        .map(|s| &s.properties)
        .unwrap_or(&empty);
    let after = state
        .after
        .as_ref()
        .map(|s| &s.properties)
        .unwrap_or(&empty);

    let mut pairs = Vec::new();
    let mut params = Params::new();
    let mut n = 0;
    for (name, value) in after {
        if before.get(name) == Some(value) {
            continue;
        }
        let param = format!("{var}_value_{n}");
        pairs.push(format!("{var}.{name}=${param}"));
        params.insert(param, value.clone());
        n += 1;
    }
    (pairs.join(", "), params)
}
