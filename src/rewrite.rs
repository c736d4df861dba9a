//! Reference Rewriting
//!
//! Every rewrite here is an exact match on the whole reference string. A
//! rename of `Error` leaves `#/components/schemas/ErrorResponse` untouched.

use crate::naming::{ref_target, schema_ref};
use crate::tree::{Node, Scalar};

/// Key that holds a reference inside a mapping
pub const REF_KEY: &str = "$ref";

/// Rewrite `#/components/schemas/{old}` to `#/components/schemas/{new}`
/// everywhere below `node`. Returns the number of references changed.
pub fn rewrite(node: &mut Node, old: &str, new: &str) -> usize {
    let old_ref = schema_ref(old);
    let new_ref = schema_ref(new);
    visit_refs_mut(node, &mut |reference: &mut String| {
        if *reference == old_ref {
            reference.clone_from(&new_ref);
            true
        } else {
            false
        }
    })
}

/// Rewrite local schema references through a name lookup.
///
/// `lookup` receives the referenced schema name and returns its replacement,
/// or `None` to leave the reference as it is. Each reference is looked up
/// once, so renames never chain.
pub fn rewrite_targets<F>(node: &mut Node, mut lookup: F) -> usize
where
    F: FnMut(&str) -> Option<String>,
{
    visit_refs_mut(node, &mut |reference: &mut String| {
        let Some(replacement) = ref_target(reference).and_then(&mut lookup) else {
            return false;
        };
        let replacement = schema_ref(&replacement);
        if *reference == replacement {
            return false;
        }
        *reference = replacement;
        true
    })
}

/// All `$ref` strings below `node`, in document order
pub fn collect_refs(node: &Node) -> Vec<&str> {
    let mut refs = Vec::new();
    collect_into(node, &mut refs);
    refs
}

fn collect_into<'a>(node: &'a Node, refs: &mut Vec<&'a str>) {
    match node {
        Node::Mapping(map) => {
            for (key, value) in map {
                match value.as_str() {
                    Some(reference) if key == REF_KEY => refs.push(reference),
                    _ => collect_into(value, refs),
                }
            }
        }
        Node::Sequence(items) => {
            for item in items {
                collect_into(item, refs);
            }
        }
        Node::Scalar(_) => {}
    }
}

/// Depth-first walk handing every string-valued `$ref` to `f`.
/// `f` returns whether it changed the reference.
fn visit_refs_mut<F>(node: &mut Node, f: &mut F) -> usize
where
    F: FnMut(&mut String) -> bool,
{
    match node {
        Node::Mapping(map) => {
            let mut changed = 0;
            for (key, value) in map.iter_mut() {
                match value {
                    Node::Scalar(Scalar::String(reference)) if key == REF_KEY => {
                        if f(reference) {
                            changed += 1;
                        }
                    }
                    other => changed += visit_refs_mut(other, f),
                }
            }
            changed
        }
        Node::Sequence(items) => items.iter_mut().map(|item| visit_refs_mut(item, f)).sum(),
        Node::Scalar(_) => 0,
    }
}
