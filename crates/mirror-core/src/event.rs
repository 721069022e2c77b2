//! Change-event model.
//!
//! The source emits heterogeneous event maps. [`RawEvent`] mirrors the
//! wire shape verbatim via serde; [`ChangeEvent`] is the validated
//! discriminated sum the rest of the crate works with. Validation
//! happens once, at the `TryFrom` boundary — pattern builders and the
//! composer take already-validated structures.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::EventError;

/// Label → (key property → value). All listed labels together with the
/// union of their key properties uniquely identify an entity.
pub type LabelKeys = BTreeMap<String, BTreeMap<String, Value>>;

/// Key property → value for a relationship.
pub type KeyProperties = BTreeMap<String, Value>;

/// Wire shape of the `event` field of a CDC record.
///
/// Every field except `operation` and `eventType` is optional on the
/// wire; which ones are required depends on the operation/type pair and
/// is enforced by [`ChangeEvent::try_from`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    pub operation: String,
    #[serde(rename = "eventType")]
    pub event_type: String,
    #[serde(default)]
    pub keys: Option<LabelKeys>,
    #[serde(default)]
    pub start: Option<RawEndpoint>,
    #[serde(default)]
    pub end: Option<RawEndpoint>,
    #[serde(rename = "type", default)]
    pub rel_type: Option<String>,
    #[serde(default)]
    pub key: Option<KeyProperties>,
    #[serde(default)]
    pub state: Option<RawState>,
}

/// A relationship endpoint: shaped like a node event's `keys` block.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEndpoint {
    #[serde(default)]
    pub keys: LabelKeys,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawState {
    #[serde(default)]
    pub before: Option<EntityState>,
    #[serde(default)]
    pub after: Option<EntityState>,
}

/// One side of a state change. `before` is absent for creates; `after`
/// is absent for deletes on some sources.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct EntityState {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

/// Before/after pair of a change.
#[derive(Debug, Clone, Default)]
pub struct StateChange {
    pub before: Option<EntityState>,
    pub after: Option<EntityState>,
}

/// A validated node change.
#[derive(Debug, Clone)]
pub struct NodeChange {
    pub keys: LabelKeys,
    pub state: Option<StateChange>,
}

/// A validated relationship change.
#[derive(Debug, Clone)]
pub struct RelationshipChange {
    pub rel_type: String,
    pub key: KeyProperties,
    pub start: LabelKeys,
    pub end: LabelKeys,
    pub state: Option<StateChange>,
}

/// Inner variant of the event sum: what kind of entity changed.
#[derive(Debug, Clone)]
pub enum EntityChange {
    Node(NodeChange),
    Relationship(RelationshipChange),
}

/// Outer variant of the event sum: what happened to it.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    Create(EntityChange),
    Update(EntityChange),
    Delete(EntityChange),
}

impl ChangeEvent {
    /// The change's before/after state, if the event carried one.
    pub fn state(&self) -> Option<&StateChange> {
        self.entity().state()
    }

    pub fn entity(&self) -> &EntityChange {
        match self {
            Self::Create(e) | Self::Update(e) | Self::Delete(e) => e,
        }
    }
}

impl EntityChange {
    pub fn state(&self) -> Option<&StateChange> {
        match self {
            Self::Node(n) => n.state.as_ref(),
            Self::Relationship(r) => r.state.as_ref(),
        }
    }
}

impl TryFrom<RawEvent> for ChangeEvent {
    type Error = EventError;

    fn try_from(raw: RawEvent) -> Result<Self, EventError> {
        let entity = match raw.event_type.as_str() {
            "n" => {
                let keys = raw
                    .keys
                    .ok_or_else(|| EventError::missing("node", "keys"))?;
                EntityChange::Node(NodeChange {
                    keys,
                    state: raw.state.map(StateChange::from),
                })
            }
            "r" => {
                let rel_type = raw
                    .rel_type
                    .ok_or_else(|| EventError::missing("relationship", "type"))?;
                let start = raw
                    .start
                    .ok_or_else(|| EventError::missing("relationship", "start"))?;
                let end = raw
                    .end
                    .ok_or_else(|| EventError::missing("relationship", "end"))?;
                EntityChange::Relationship(RelationshipChange {
                    rel_type,
                    key: raw.key.unwrap_or_default(),
                    start: start.keys,
                    end: end.keys,
                    state: raw.state.map(StateChange::from),
                })
            }
            other => return Err(EventError::UnknownEventType(other.to_string())),
        };

        match raw.operation.as_str() {
            "c" => Ok(ChangeEvent::Create(entity)),
            "u" => Ok(ChangeEvent::Update(entity)),
            "d" => Ok(ChangeEvent::Delete(entity)),
            other => Err(EventError::UnknownOperation(other.to_string())),
        }
    }
}

impl From<RawState> for StateChange {
    fn from(raw: RawState) -> Self {
        Self {
            before: raw.before,
            after: raw.after,
        }
    }
}
