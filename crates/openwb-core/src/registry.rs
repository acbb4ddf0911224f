// ── Key registry ──
//
// Append-only record of every status key a device has ever reported.
// Identity and display metadata are fixed when a key first appears; only
// the value, its timestamp and the availability flag change afterwards.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use openwb_api::RawSnapshot;

use crate::metadata::SensorMeta;
use crate::names::{Language, NameTable};
use crate::value::{MetricValue, ValueKind};

/// The durable per-key record exposed to metric sinks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricEntry {
    /// Raw status key; stable identity.
    pub key: String,
    /// Friendly display name, resolved once at creation.
    pub name: String,
    /// Last coerced value. `None` only between creation and the first
    /// applied snapshot, which happen in the same poll cycle.
    pub value: Option<MetricValue>,
    /// Whether the last poll of the device succeeded.
    pub available: bool,
    /// When `value` was last written.
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub meta: SensorMeta,
}

impl MetricEntry {
    fn new(key: String, name: String) -> Self {
        let meta = SensorMeta::for_key(&key);
        Self {
            key,
            name,
            value: None,
            available: false,
            updated_at: None,
            meta,
        }
    }

    /// Type tag of the current value.
    pub fn kind(&self) -> Option<ValueKind> {
        self.value.as_ref().map(MetricValue::kind)
    }

    /// The value after presentation transforms (charging mode labels,
    /// timestamps, sign conventions). Falls back to the coerced value.
    pub fn native_value(&self) -> Option<MetricValue> {
        self.value.as_ref().map(|v| self.meta.present(v))
    }
}

/// Result of reconciling one key of a snapshot against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub key: String,
    /// `true` if this call created the entry.
    pub created: bool,
}

/// Per-device registry of metric entries, in discovery order.
#[derive(Debug)]
pub struct KeyRegistry {
    entries: IndexMap<String, Arc<MetricEntry>>,
    names: Arc<NameTable>,
    language: Language,
}

impl KeyRegistry {
    pub fn new(names: Arc<NameTable>, language: Language) -> Self {
        Self {
            entries: IndexMap::new(),
            names,
            language,
        }
    }

    /// Create entries for keys of `snapshot` not seen before. Existing
    /// entries keep their identity and name. Nothing is ever removed.
    pub fn reconcile(&mut self, snapshot: &RawSnapshot) -> Vec<Reconciled> {
        snapshot
            .keys()
            .map(|key| {
                let created = !self.entries.contains_key(key);
                if created {
                    let name = self.names.resolve(key, self.language);
                    self.entries
                        .insert(key.clone(), Arc::new(MetricEntry::new(key.clone(), name)));
                }
                Reconciled {
                    key: key.clone(),
                    created,
                }
            })
            .collect()
    }

    /// Write coerced values for the keys present and mark every entry
    /// available. Keys absent from `values` keep their last value.
    ///
    /// Returns the entries whose value was written, in `values` order.
    /// Keys that were never reconciled are ignored.
    pub fn apply<I>(&mut self, values: I, at: DateTime<Utc>) -> Vec<Arc<MetricEntry>>
    where
        I: IntoIterator<Item = (String, MetricValue)>,
    {
        let mut updated = Vec::new();
        for (key, value) in values {
            if let Some(entry) = self.entries.get_mut(&key) {
                let e = Arc::make_mut(entry);
                e.value = Some(value);
                e.updated_at = Some(at);
                e.available = true;
                updated.push(Arc::clone(entry));
            }
        }
        for entry in self.entries.values_mut() {
            if !entry.available {
                Arc::make_mut(entry).available = true;
            }
        }
        updated
    }

    /// Mark every entry unavailable. Values are left untouched.
    pub fn mark_unavailable(&mut self) {
        for entry in self.entries.values_mut() {
            if entry.available {
                Arc::make_mut(entry).available = false;
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<MetricEntry>> {
        self.entries.get(key).cloned()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in discovery order (cheap `Arc` clones).
    pub fn snapshot(&self) -> Vec<Arc<MetricEntry>> {
        self.entries.values().cloned().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::value::coerce;

    fn registry() -> KeyRegistry {
        KeyRegistry::new(Arc::new(NameTable::builtin()), Language::En)
    }

    fn snap(value: serde_json::Value) -> RawSnapshot {
        RawSnapshot::try_from(value).unwrap()
    }

    fn coerced(snapshot: &RawSnapshot) -> Vec<(String, MetricValue)> {
        snapshot
            .iter()
            .map(|(k, v)| (k.clone(), coerce(v)))
            .collect()
    }

    #[test]
    fn reconcile_creates_unseen_keys() {
        let mut reg = registry();
        let s = snap(json!({"soc": "76.5", "speichersoc": "40"}));

        let result = reg.reconcile(&s);

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|r| r.created));
        assert_eq!(reg.get("speichersoc").unwrap().name, "Battery state of charge");
        assert_eq!(reg.get("soc").unwrap().name, "Soc");
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut reg = registry();
        let s = snap(json!({"a": "1", "b": "2"}));

        reg.reconcile(&s);
        let first = reg.snapshot();
        let second = reg.reconcile(&s);

        assert!(second.iter().all(|r| !r.created));
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.snapshot(), first);
    }

    #[test]
    fn vanished_keys_are_kept_with_last_value() {
        let mut reg = registry();
        let n = snap(json!({"a": "1", "b": "2"}));
        reg.reconcile(&n);
        reg.apply(coerced(&n), Utc::now());

        let n1 = snap(json!({"a": "3"}));
        reg.reconcile(&n1);
        let updated = reg.apply(coerced(&n1), Utc::now());

        assert_eq!(updated.len(), 1);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get("a").unwrap().value, Some(MetricValue::Integer(3)));
        assert_eq!(reg.get("b").unwrap().value, Some(MetricValue::Integer(2)));
        assert!(reg.get("b").unwrap().available);
    }

    #[test]
    fn names_are_fixed_at_creation() {
        let mut reg = KeyRegistry::new(Arc::new(NameTable::empty()), Language::De);
        let s = snap(json!({"new_sensor_42": "5"}));
        reg.reconcile(&s);
        reg.apply(coerced(&s), Utc::now());
        reg.reconcile(&snap(json!({"new_sensor_42": "six"})));

        let entry = reg.get("new_sensor_42").unwrap();
        assert_eq!(entry.name, "New Sensor 42");
    }

    #[test]
    fn latest_classification_wins() {
        let mut reg = registry();
        let s = snap(json!({"state": "idle"}));
        reg.reconcile(&s);
        reg.apply(coerced(&s), Utc::now());
        assert_eq!(reg.get("state").unwrap().kind(), Some(ValueKind::Text));

        let s = snap(json!({"state": "3"}));
        reg.reconcile(&s);
        reg.apply(coerced(&s), Utc::now());
        assert_eq!(reg.get("state").unwrap().kind(), Some(ValueKind::Integer));
    }

    #[test]
    fn mark_unavailable_keeps_values() {
        let mut reg = registry();
        let s = snap(json!({"soc": "76.5"}));
        reg.reconcile(&s);
        reg.apply(coerced(&s), Utc::now());

        reg.mark_unavailable();

        let entry = reg.get("soc").unwrap();
        assert!(!entry.available);
        assert_eq!(entry.value, Some(MetricValue::Float(76.5)));
    }

    #[test]
    fn snapshot_preserves_discovery_order() {
        let mut reg = registry();
        reg.reconcile(&snap(json!({"b": "1"})));
        reg.reconcile(&snap(json!({"a": "1", "b": "2"})));

        let keys: Vec<&str> = reg.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn native_value_applies_presentation() {
        let mut reg = registry();
        let s = snap(json!({"lademodus": "3"}));
        reg.reconcile(&s);
        reg.apply(coerced(&s), Utc::now());

        let entry = reg.get("lademodus").unwrap();
        assert_eq!(entry.value, Some(MetricValue::Integer(3)));
        assert_eq!(entry.native_value(), Some(MetricValue::Text("Stop".into())));
    }
}
