use std::collections::BTreeMap;

use log::debug;
use serde_json::Value as JsonValue;

use chronika_core::{AttributeKey, EntityBaseline, RefLookup, ValidTime, Value, ValueType};

use crate::normalize::OrderedEvent;

pub type AttributeMap = BTreeMap<AttributeKey, Value>;

/// Folds attribute diffs into one full-state snapshot per retained event.
///
/// The running state is seeded from the baseline. An explicit snapshot
/// replaces it wholesale; otherwise each diff entry is coerced and applied.
/// Every emitted snapshot has the storage-required keys populated.
pub fn build_snapshots(
    events: &[OrderedEvent],
    baseline: &EntityBaseline,
    lookup: &RefLookup,
) -> Vec<AttributeMap> {
    let mut running = baseline.state.clone();
    let mut snapshots = Vec::with_capacity(events.len());
    for entry in events {
        if let Some(explicit) = &entry.event.snapshot {
            running = sanitize_snapshot(explicit, baseline, lookup);
        } else if let Some(diff) = &entry.event.diff {
            for (key, change) in diff {
                match coerce(*key, &change.new, baseline, lookup) {
                    Some(value) => {
                        running.insert(*key, value);
                    }
                    None => debug!(
                        "snapshot: skipping {key:?} at source index {} (value {:?})",
                        entry.source_index, change.new
                    ),
                }
            }
        }
        let mut snapshot = running.clone();
        backfill_required(&mut snapshot, baseline);
        snapshots.push(snapshot);
    }
    snapshots
}

/// Coerces one explicit snapshot into typed state, dropping entries whose
/// values do not coerce.
fn sanitize_snapshot(
    explicit: &BTreeMap<AttributeKey, JsonValue>,
    baseline: &EntityBaseline,
    lookup: &RefLookup,
) -> AttributeMap {
    explicit
        .iter()
        .filter_map(|(key, raw)| coerce(*key, raw, baseline, lookup).map(|value| (*key, value)))
        .collect()
}

/// Coerces one raw diff value for `key`. `None` means "skip this field":
/// JSON null, the empty string, and non-scalar values never reach the
/// snapshot, and an empty string never coerces a numeric key to zero.
pub fn coerce(
    key: AttributeKey,
    raw: &JsonValue,
    baseline: &EntityBaseline,
    lookup: &RefLookup,
) -> Option<Value> {
    if raw.is_null() || raw.is_array() || raw.is_object() {
        return None;
    }
    if raw.as_str().is_some_and(|text| text.trim().is_empty()) {
        return None;
    }
    match key.value_type() {
        ValueType::Str => raw.as_str().map(|text| Value::Str(text.to_string())),
        ValueType::Bool => json_bool(raw).map(Value::Bool),
        ValueType::F64 => json_f64(raw).map(Value::F64),
        ValueType::Time => json_i64(raw).map(|micros| Value::Time(ValidTime(micros))),
        ValueType::I64 => {
            if let Some(value) = json_i64(raw) {
                return Some(Value::I64(value));
            }
            let kind = key.reference()?;
            let name = raw.as_str()?;
            match lookup.resolve(kind, name) {
                Some(id) => Some(Value::I64(id)),
                // Unresolved names keep the version alive with the
                // baseline's current id for this key.
                None => baseline.state.get(&key).cloned(),
            }
        }
    }
}

pub(crate) fn backfill_required(snapshot: &mut AttributeMap, baseline: &EntityBaseline) {
    for key in AttributeKey::REQUIRED {
        if !snapshot.contains_key(&key) {
            if let Some(value) = baseline.required_fallback(key) {
                snapshot.insert(key, value);
            }
        }
    }
}

fn json_i64(raw: &JsonValue) -> Option<i64> {
    if let Some(value) = raw.as_i64() {
        return Some(value);
    }
    raw.as_str().and_then(|text| text.trim().parse().ok())
}

fn json_f64(raw: &JsonValue) -> Option<f64> {
    if let Some(value) = raw.as_f64() {
        return Some(value);
    }
    raw.as_str().and_then(|text| text.trim().parse().ok())
}

fn json_bool(raw: &JsonValue) -> Option<bool> {
    if let Some(value) = raw.as_bool() {
        return Some(value);
    }
    raw.as_i64().map(|value| value != 0)
}
