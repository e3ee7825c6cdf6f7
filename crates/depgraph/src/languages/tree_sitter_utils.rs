//! Shared tree-sitter helpers for the language front ends.

// Tree-sitter returns usize rows; line numbers are stored as u32.
#![allow(clippy::cast_possible_truncation)]

/// Text of a node.
///
/// Returns `None` if the node's byte range is not valid UTF-8.
#[must_use]
pub fn node_text<'a>(node: &tree_sitter::Node, content: &'a [u8]) -> Option<&'a str> {
    match std::str::from_utf8(content.get(node.byte_range())?) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::trace!(
                byte_range = ?node.byte_range(),
                error = %e,
                node_kind = %node.kind(),
                "Failed to decode node text as UTF-8"
            );
            None
        }
    }
}

/// Text of the child at `field`, if present.
#[must_use]
pub fn field_text<'a>(node: &tree_sitter::Node, field: &str, content: &'a [u8]) -> Option<&'a str> {
    node.child_by_field_name(field)
        .and_then(|child| node_text(&child, content))
}

/// 1-indexed first and last line of a node.
#[must_use]
pub fn node_lines(node: &tree_sitter::Node) -> (u32, u32) {
    (
        node.start_position().row as u32 + 1,
        node.end_position().row as u32 + 1,
    )
}

/// Contents of a string literal without its quotes.
#[must_use]
pub fn unquote(literal: &str) -> &str {
    let trimmed = literal.trim();
    let inner = trimmed
        .strip_prefix(['"', '\'', '`'])
        .unwrap_or(trimmed);
    inner.strip_suffix(['"', '\'', '`']).unwrap_or(inner)
}
