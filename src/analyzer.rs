//! Aggregate statistics over a conversation tree.

use crate::error::Result;
use crate::model::{Mapping, Part, Role};
use crate::tree;
use std::collections::BTreeMap;

/// Counts gathered from one conversation, or summed over many.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationStats {
    /// Messages per author role.
    pub roles: BTreeMap<String, usize>,
    /// Structured tool parts per tool name (`unknown` when unnamed).
    pub tool_types: BTreeMap<String, usize>,
    /// Structured assistant parts carrying a `query` key.
    pub assistant_query_parts: usize,
}

impl ConversationStats {
    pub fn merge(&mut self, other: &ConversationStats) {
        for (role, count) in &other.roles {
            *self.roles.entry(role.clone()).or_default() += count;
        }
        for (tool, count) in &other.tool_types {
            *self.tool_types.entry(tool.clone()).or_default() += count;
        }
        self.assistant_query_parts += other.assistant_query_parts;
    }
}

/// Count roles, tool types and assistant query parts over every node
/// reachable from the conversation's root.
pub fn analyze(mapping: &Mapping, max_depth: usize) -> Result<ConversationStats> {
    let root = tree::root_key(mapping)?;
    let mut stats = ConversationStats::default();

    tree::walk(root, mapping, max_depth, (), |node, _| {
        let Some(message) = &node.message else {
            return;
        };
        let role = message.role();
        *stats.roles.entry(role.to_string()).or_default() += 1;

        let structured = message.parts().unwrap_or_default().iter().filter_map(|part| match part {
            Part::Structured(part) => Some(part),
            _ => None,
        });

        match role {
            Role::Tool => {
                for part in structured {
                    let name = part.name.as_deref().unwrap_or("unknown");
                    *stats.tool_types.entry(name.to_string()).or_default() += 1;
                }
            }
            Role::Assistant => {
                stats.assistant_query_parts += structured.filter(|part| part.has_query).count();
            }
            _ => {}
        }
    })?;

    Ok(stats)
}
