use crate::error::{Result, TreeError};
use crate::model::{Mapping, Node};
use std::collections::HashSet;
use tracing::warn;

/// Default ceiling on tree depth for a single conversation.
pub const DEFAULT_MAX_DEPTH: usize = 5000;

/// Find the parentless node the conversation hangs from.
///
/// Exports are expected to have exactly one. If several exist, the
/// lexicographically smallest key is used so the choice is stable.
pub fn root_key(mapping: &Mapping) -> Result<&str> {
    let mut roots: Vec<&str> = mapping
        .iter()
        .filter(|(_, node)| node.parent.is_none())
        .map(|(key, _)| key.as_str())
        .collect();
    roots.sort_unstable();

    match roots.as_slice() {
        [] => Err(TreeError::NoRoot),
        [only] => Ok(*only),
        [first, ..] => {
            warn!(
                count = roots.len(),
                root = *first,
                "multiple parentless nodes; using the first"
            );
            Ok(*first)
        }
    }
}

/// Depth-first, pre-order walk over the nodes reachable from `root`.
///
/// Children are visited in their listed order. Each node is visited at most
/// once, so cyclic or diamond-shaped mappings still terminate. `visit`
/// receives the node and the context handed down by its parent and returns
/// the context for the node's children; siblings each start from the same
/// parent context.
///
/// The walk keeps its own stack, so deep trees cannot overflow the call
/// stack; `max_depth` bounds how far from the root it will go.
pub fn walk<'a, C, F>(
    root: &'a str,
    mapping: &'a Mapping,
    max_depth: usize,
    initial: C,
    mut visit: F,
) -> Result<()>
where
    C: Clone,
    F: FnMut(&'a Node, &C) -> C,
{
    let mut visited: HashSet<&'a str> = HashSet::new();
    let mut stack: Vec<(&'a str, C, usize)> = vec![(root, initial, 0)];

    while let Some((key, context, depth)) = stack.pop() {
        if !visited.insert(key) {
            continue;
        }
        if depth > max_depth {
            return Err(TreeError::TooDeep {
                key: key.to_string(),
                limit: max_depth,
            });
        }
        let node = mapping
            .get(key)
            .ok_or_else(|| TreeError::MissingNode(key.to_string()))?;

        let child_context = visit(node, &context);

        // Reversed so the first child is popped first.
        for child in node.children.iter().rev() {
            stack.push((child.as_str(), child_context.clone(), depth + 1));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(value: serde_json::Value) -> Mapping {
        serde_json::from_value(value).unwrap()
    }

    fn count_visits(root: &str, m: &Mapping) -> Result<usize> {
        let mut visits = 0;
        walk(root, m, DEFAULT_MAX_DEPTH, (), |_, _| visits += 1)?;
        Ok(visits)
    }

    #[test]
    fn finds_single_root() {
        let m = mapping(json!({
            "r": { "parent": null, "children": ["a"] },
            "a": { "parent": "r", "children": [] }
        }));
        assert_eq!(root_key(&m).unwrap(), "r");
    }

    #[test]
    fn missing_root_is_an_error() {
        let m = mapping(json!({
            "a": { "parent": "b", "children": ["b"] },
            "b": { "parent": "a", "children": ["a"] }
        }));
        assert_eq!(root_key(&m), Err(TreeError::NoRoot));
    }

    #[test]
    fn several_roots_pick_smallest_key() {
        let m = mapping(json!({
            "z": { "children": [] },
            "m": { "children": [] }
        }));
        assert_eq!(root_key(&m).unwrap(), "m");
    }

    #[test]
    fn visits_pre_order_in_child_order() {
        let m = mapping(json!({
            "r": { "children": ["a", "d"] },
            "a": { "parent": "r", "children": ["b", "c"] },
            "b": { "parent": "a", "children": [] },
            "c": { "parent": "a", "children": [] },
            "d": { "parent": "r", "children": [] }
        }));
        let mut seen = Vec::new();
        walk("r", &m, DEFAULT_MAX_DEPTH, (), |node, _| {
            seen.push(std::ptr::from_ref(node));
        })
        .unwrap();
        let expected: Vec<_> = ["r", "a", "b", "c", "d"]
            .iter()
            .map(|k| std::ptr::from_ref(&m[*k]))
            .collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn children_inherit_parent_context_not_siblings() {
        let m = mapping(json!({
            "r": { "children": ["a", "b"] },
            "a": { "parent": "r", "children": [] },
            "b": { "parent": "r", "children": [] }
        }));
        let mut depths = Vec::new();
        walk("r", &m, DEFAULT_MAX_DEPTH, 0usize, |_, depth| {
            depths.push(*depth);
            depth + 1
        })
        .unwrap();
        assert_eq!(depths, vec![0, 1, 1]);
    }

    #[test]
    fn cycle_terminates_and_visits_once() {
        let m = mapping(json!({
            "r": { "children": ["a"] },
            "a": { "parent": "r", "children": ["r", "a"] }
        }));
        assert_eq!(count_visits("r", &m).unwrap(), 2);
    }

    #[test]
    fn diamond_visits_shared_child_once() {
        let m = mapping(json!({
            "r": { "children": ["a", "b"] },
            "a": { "parent": "r", "children": ["c"] },
            "b": { "parent": "r", "children": ["c"] },
            "c": { "parent": "a", "children": [] }
        }));
        assert_eq!(count_visits("r", &m).unwrap(), 4);
    }

    #[test]
    fn dangling_child_is_reported() {
        let m = mapping(json!({
            "r": { "children": ["ghost"] }
        }));
        assert_eq!(
            count_visits("r", &m),
            Err(TreeError::MissingNode("ghost".into()))
        );
    }

    #[test]
    fn depth_ceiling_is_enforced() {
        let m = mapping(json!({
            "r": { "children": ["a"] },
            "a": { "parent": "r", "children": ["b"] },
            "b": { "parent": "a", "children": [] }
        }));
        let err = walk("r", &m, 1, (), |_, _| ()).unwrap_err();
        assert_eq!(
            err,
            TreeError::TooDeep {
                key: "b".into(),
                limit: 1
            }
        );
        assert!(walk("r", &m, 2, (), |_, _| ()).is_ok());
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let mut table = serde_json::Map::new();
        for i in 0..20_000 {
            let parent = (i > 0).then(|| format!("n{}", i - 1));
            let child = format!("n{}", i + 1);
            table.insert(
                format!("n{i}"),
                json!({ "parent": parent, "children": [child] }),
            );
        }
        table.insert("n20000".into(), json!({ "parent": "n19999", "children": [] }));
        let m: Mapping = serde_json::from_value(serde_json::Value::Object(table)).unwrap();
        let mut count = 0usize;
        walk("n0", &m, usize::MAX, (), |_, _| count += 1).unwrap();
        assert_eq!(count, 20_001);
    }
}
