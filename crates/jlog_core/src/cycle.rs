//! Self-reference detection
//!
//! A composite is self-referential when it can reach itself through its
//! children. Only such values fall back to text; a cycle buried below
//! acyclic ancestors leaves those ancestors structured.

use crate::value::Value;
use std::collections::HashSet;

/// True iff `value` is a shared node reachable from its own children
pub fn is_self_referential(value: &Value) -> bool {
    let Some(target) = value.node_id() else {
        return false;
    };

    let mut seen: HashSet<usize> = HashSet::new();
    let mut pending = value.children();

    while let Some(next) = pending.pop() {
        let Some(id) = next.node_id() else {
            continue;
        };
        if id == target {
            return true;
        }
        if seen.insert(id) {
            pending.extend(next.children());
        }
    }
    false
}
