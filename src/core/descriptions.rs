// src/core/descriptions.rs
use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::core::cube::FlowCube;
use crate::core::response::{DescriptionEntry, DescriptionMap};

/// Prunes a candidate description map against the current set of items.
///
/// Entries keyed by a display name with no matching item are dropped
/// whole; parameter notes survive only when the item still carries a
/// parameter with that display name (falling back to the machine name;
/// parameters with neither never match). The item-level note of a
/// surviving entry is copied unconditionally. Nothing is ever
/// manufactured, so the pass is idempotent.
///
/// When two items share a display name the later one wins the lookup.
pub fn reconcile(candidate: &DescriptionMap, items: &[FlowCube]) -> DescriptionMap {
    let mut by_display_name: HashMap<&str, &FlowCube> = HashMap::new();
    for item in items {
        by_display_name.insert(item.display_name(), item);
    }

    let mut cleaned = DescriptionMap::new();
    for (key, entry) in candidate {
        let Some(item) = by_display_name.get(key.as_str()) else {
            debug!("dropping stale description entry for '{key}'");
            continue;
        };

        let current_labels: BTreeSet<&str> = item
            .parameters
            .iter()
            .filter_map(|p| p.display_label())
            .collect();

        let mut kept = DescriptionEntry {
            note: entry.note.clone(),
            ..Default::default()
        };
        for (label, note) in &entry.parameters {
            if current_labels.contains(label.as_str()) {
                kept.parameters.insert(label.clone(), note.clone());
            } else {
                debug!("dropping stale parameter note '{label}' on '{key}'");
            }
        }
        cleaned.insert(key.clone(), kept);
    }
    cleaned
}
