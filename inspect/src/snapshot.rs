//! Snapshot serialization of a live state graph.
//!
//! A snapshot is a point-in-time, depth-bounded, cycle-safe, filtered JSON
//! rendering of the debuggee's root object. Nodes that cannot or should not
//! be expanded are replaced by sentinel strings so the rest of the graph
//! still serializes.
//!
//! Traversal is read-only and bounded: each node descends at most
//! `max_depth` containment steps, and a node already on the containment
//! stack (an ancestor cycle) is never re-entered. Siblings and unrelated
//! subtrees are not tracked, so DAG-style reconvergence is expanded again
//! rather than collapsed.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::{Field, Inspect, ObjectId};

/// Default maximum containment depth.
pub const MAX_DEPTH: usize = 18;

/// Captures slower than this get an advisory warning: a signal to tighten
/// the exclusion rules, not a failure.
pub const SLOW_CAPTURE: Duration = Duration::from_millis(500);

/// Sentinel for nodes beyond the depth limit.
pub const DEPTH_SENTINEL: &str = "[max depth reached]";

/// Sentinel for excluded keys and excluded subtrees.
pub const EXCLUDED_SENTINEL: &str = "[removed from snapshot]";

/// Sentinel for members that cannot be serialized.
pub const OPAQUE_SENTINEL: &str = "[not serializable]";

/// What to leave out of a snapshot.
///
/// Key rules drop a property wherever it appears; value rules drop a whole
/// subtree by object identity, regardless of which property references it
/// (used for bulky shared assets).
#[derive(Debug, Default, Clone)]
pub struct ExclusionRules {
    keys: HashSet<String>,
    values: HashSet<ObjectId>,
}

impl ExclusionRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every property with this name.
    pub fn drop_key(mut self, key: impl Into<String>) -> Self {
        self.keys.insert(key.into());
        self
    }

    /// Drop this object wherever it is referenced.
    pub fn drop_value(mut self, object: &dyn Inspect) -> Self {
        self.values.insert(ObjectId::of(object));
        self
    }

    fn excludes_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    fn excludes_value(&self, id: ObjectId) -> bool {
        self.values.contains(&id)
    }
}

struct Ancestor {
    id: ObjectId,
    /// Dotted path from the root; empty for the root itself.
    path: String,
}

/// Serialize a live graph to a JSON value.
///
/// The traversal never mutates the graph and always terminates: cycles and
/// over-deep chains are cut with sentinels. Elapsed time is logged, with a
/// warning past [`SLOW_CAPTURE`].
pub fn capture(
    root: &dyn Inspect,
    rules: &ExclusionRules,
    max_depth: usize,
) -> serde_json::Value {
    let started = Instant::now();
    let mut stack = vec![Ancestor {
        id: ObjectId::of(root),
        path: String::new(),
    }];
    let payload = render(root, rules, max_depth, &mut stack);

    let elapsed = started.elapsed();
    tracing::debug!(?elapsed, "state serialization finished");
    if elapsed > SLOW_CAPTURE {
        tracing::warn!(
            ?elapsed,
            "serialization took a long time: check if some objects should be excluded from the snapshot"
        );
    }
    payload
}

/// Serialize a live graph to its textual form.
pub fn capture_string(root: &dyn Inspect, rules: &ExclusionRules, max_depth: usize) -> String {
    capture(root, rules, max_depth).to_string()
}

fn render(
    object: &dyn Inspect,
    rules: &ExclusionRules,
    max_depth: usize,
    stack: &mut Vec<Ancestor>,
) -> serde_json::Value {
    let mut map = serde_json::Map::new();

    for name in object.field_names() {
        if rules.excludes_key(&name) {
            map.insert(name, EXCLUDED_SENTINEL.into());
            continue;
        }

        let Some(field) = object.field(&name) else {
            continue;
        };

        let rendered = match field {
            Field::Scalar(value) => value.to_json(),
            Field::Opaque => OPAQUE_SENTINEL.into(),
            Field::Object(child) => {
                let id = ObjectId::of(child);
                if rules.excludes_value(id) {
                    EXCLUDED_SENTINEL.into()
                } else if let Some(ancestor) = stack.iter().find(|a| a.id == id) {
                    cycle_sentinel(&ancestor.path).into()
                } else if stack.len() > max_depth {
                    DEPTH_SENTINEL.into()
                } else {
                    let parent_path = stack.last().map(|a| a.path.clone()).unwrap_or_default();
                    let path = if parent_path.is_empty() {
                        name.clone()
                    } else {
                        format!("{parent_path}.{name}")
                    };
                    stack.push(Ancestor { id, path });
                    let value = render(child, rules, max_depth, stack);
                    stack.pop();
                    value
                }
            }
        };
        map.insert(name, rendered);
    }

    serde_json::Value::Object(map)
}

/// Name the ancestor path at which a cycle closes.
fn cycle_sentinel(path: &str) -> String {
    if path.is_empty() {
        "[circular reference at root]".to_string()
    } else {
        format!("[circular reference at .{path}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{chain, SceneStack, TestGame};

    #[test]
    fn renders_scalars_and_nested_objects() {
        let game = TestGame::new();
        let payload = capture(&game, &ExclusionRules::new(), MAX_DEPTH);

        assert_eq!(payload["score"], serde_json::json!(10.0));
        assert_eq!(payload["title"], serde_json::json!("space shooter"));
        assert_eq!(
            payload["sceneStack"]["scene"]["name"],
            serde_json::json!("level 1")
        );
    }

    #[test]
    fn opaque_members_become_placeholders() {
        let game = TestGame::new();
        let payload = capture(&game, &ExclusionRules::new(), MAX_DEPTH);

        assert_eq!(payload["renderer"], serde_json::json!(OPAQUE_SENTINEL));
    }

    #[test]
    fn ancestor_cycle_is_cut_with_a_path_naming_sentinel() {
        let game = TestGame::new();
        let payload = capture(&game, &ExclusionRules::new(), MAX_DEPTH);

        // The scene reports a back-reference to itself under "parent".
        assert_eq!(
            payload["sceneStack"]["scene"]["parent"],
            serde_json::json!("[circular reference at .sceneStack.scene]")
        );
    }

    #[test]
    fn self_cycle_at_the_root_is_cut() {
        let stack = SceneStack::new("menu");
        // SceneStack's scene points back to itself one level down.
        let payload = capture(&stack.scene, &ExclusionRules::new(), MAX_DEPTH);
        assert_eq!(
            payload["parent"],
            serde_json::json!("[circular reference at root]")
        );
    }

    #[test]
    fn chains_beyond_the_depth_limit_are_cut() {
        let head = chain(6);
        let payload = capture(&head, &ExclusionRules::new(), 3);

        // Links at depth 1..=3 expand, the one past the limit does not.
        let mut node = &payload;
        for _ in 0..3 {
            assert!(node["next"].is_object(), "expected an expanded link");
            node = &node["next"];
        }
        assert_eq!(node["next"], serde_json::json!(DEPTH_SENTINEL));
    }

    #[test]
    fn chains_within_the_depth_limit_are_complete() {
        let head = chain(4);
        let payload = capture(&head, &ExclusionRules::new(), MAX_DEPTH);

        let mut node = &payload;
        let mut links = 0;
        while node["next"].is_object() {
            node = &node["next"];
            links += 1;
        }
        assert_eq!(links, 4);
    }

    #[test]
    fn excluded_keys_are_redacted_with_no_descendants() {
        let game = TestGame::new();
        let rules = ExclusionRules::new().drop_key("sceneStack");
        let payload = capture(&game, &rules, MAX_DEPTH);

        assert_eq!(payload["sceneStack"], serde_json::json!(EXCLUDED_SENTINEL));
        assert_eq!(payload.get("scene"), None);
    }

    #[test]
    fn excluded_values_are_redacted_by_identity() {
        let game = TestGame::new();
        let rules = ExclusionRules::new().drop_value(&game.assets);
        let payload = capture(&game, &rules, MAX_DEPTH);

        assert_eq!(payload["assets"], serde_json::json!(EXCLUDED_SENTINEL));
        // Other subtrees are unaffected.
        assert!(payload["sceneStack"].is_object());
    }

    #[test]
    fn capture_string_is_valid_json() {
        let game = TestGame::new();
        let text = capture_string(&game, &ExclusionRules::new(), MAX_DEPTH);
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(parsed.is_object());
    }
}
