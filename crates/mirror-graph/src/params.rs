//! Parameter binding for composer-generated queries.
//!
//! The composer emits parameter maps of `serde_json::Value`; the driver
//! wants `BoltType`. Conversion is total: every JSON value has a bolt
//! representation.

use neo4rs::{
    BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltString, BoltType, Query,
};
use serde_json::Value;

use mirror_core::pattern::Params;

/// Convert a JSON value into its bolt representation.
pub fn bolt_value(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::Boolean(BoltBoolean::new(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => BoltType::Integer(BoltInteger::new(i)),
            None => BoltType::Float(BoltFloat::new(n.as_f64().unwrap_or(f64::NAN))),
        },
        Value::String(s) => BoltType::String(BoltString::from(s.as_str())),
        Value::Array(items) => {
            let mut list = BoltList::default();
            for item in items {
                list.push(bolt_value(item));
            }
            BoltType::List(list)
        }
        Value::Object(map) => {
            let mut out = BoltMap::default();
            for (name, item) in map {
                out.put(BoltString::from(name.as_str()), bolt_value(item));
            }
            BoltType::Map(out)
        }
    }
}

/// Bind a flat parameter map onto a query.
pub fn bind(query: Query, params: &Params) -> Query {
    params
        .iter()
        .fold(query, |query, (name, value)| query.param(name, bolt_value(value)))
}
