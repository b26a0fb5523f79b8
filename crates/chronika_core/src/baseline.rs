use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    AttributeKey, ChangeEvent, ChronikaError, ChronikaResult, ValidTime, Value,
};

/// The entity's live current values: fold seed for state reconstruction,
/// fallback source for storage-required attributes, and the content written
/// into the existing first version when no snapshot data exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityBaseline {
    pub entity_id: i64,
    pub author_id: i64,
    pub created_at: ValidTime,
    pub state: BTreeMap<AttributeKey, Value>,
}

impl EntityBaseline {
    pub fn validate(&self) -> ChronikaResult<()> {
        if self.entity_id <= 0 {
            return Err(ChronikaError::validation(format!(
                "baseline entity id {} is not positive",
                self.entity_id
            )));
        }
        if self.author_id <= 0 {
            return Err(ChronikaError::validation(format!(
                "entity {}: baseline author id {} is not positive",
                self.entity_id, self.author_id
            )));
        }
        for key in [
            AttributeKey::ContainerId,
            AttributeKey::KindId,
            AttributeKey::StatusId,
        ] {
            if !self.state.contains_key(&key) {
                return Err(ChronikaError::validation(format!(
                    "entity {}: baseline is missing required attribute {key:?}",
                    self.entity_id
                )));
            }
        }
        Ok(())
    }

    /// Baseline value for a storage-required key. `AuthorId` and the boolean
    /// flags have intrinsic fallbacks even when absent from `state`.
    pub fn required_fallback(&self, key: AttributeKey) -> Option<Value> {
        if let Some(value) = self.state.get(&key) {
            return Some(value.clone());
        }
        match key {
            AttributeKey::AuthorId => Some(Value::I64(self.author_id)),
            AttributeKey::IsPrivate | AttributeKey::ManualScheduling => {
                Some(Value::Bool(false))
            }
            _ => None,
        }
    }
}

/// One entity's replay input: its baseline and its unordered change events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityInput {
    pub baseline: EntityBaseline,
    pub events: Vec<ChangeEvent>,
}

#[cfg(test)]
mod tests {
    use super::EntityBaseline;
    use crate::{AttributeKey, ValidTime, Value};

    fn baseline() -> EntityBaseline {
        EntityBaseline {
            entity_id: 7,
            author_id: 3,
            created_at: ValidTime(1_000),
            state: [
                (AttributeKey::ContainerId, Value::I64(1)),
                (AttributeKey::KindId, Value::I64(2)),
                (AttributeKey::StatusId, Value::I64(4)),
            ]
            .into_iter()
            .collect(),
        }
    }

    #[test]
    fn valid_baseline_passes() {
        assert!(baseline().validate().is_ok());
    }

    #[test]
    fn non_positive_ids_fail_validation() {
        let mut bad = baseline();
        bad.entity_id = 0;
        assert!(bad.validate().is_err());

        let mut bad = baseline();
        bad.author_id = -1;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn missing_required_state_fails_validation() {
        let mut bad = baseline();
        bad.state.remove(&AttributeKey::KindId);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn required_fallback_covers_intrinsic_defaults() {
        let base = baseline();
        assert_eq!(
            base.required_fallback(AttributeKey::AuthorId),
            Some(Value::I64(3))
        );
        assert_eq!(
            base.required_fallback(AttributeKey::IsPrivate),
            Some(Value::Bool(false))
        );
        assert_eq!(base.required_fallback(AttributeKey::MilestoneId), None);
    }
}
