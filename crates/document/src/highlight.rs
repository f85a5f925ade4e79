//! In-place match decorations.
//!
//! Every [`apply_highlights`] call is a full replace: existing decorations are
//! unwrapped first, then the subtree is re-flattened and split again. Only
//! matches lying inside a single text leaf are decorated; a match spanning two
//! leaves stays countable and navigable but gets no marker.

use std::collections::{BTreeMap, BTreeSet};

use findmark_search::Match;
use log::{debug, warn};

use crate::flatten::{LeafSpan, flatten};
use crate::tree::{Decoration, Document, NodeId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighlightSummary {
    pub decorated: usize,
    /// Matches left undecorated because they cross a leaf boundary.
    pub cross_leaf: usize,
    /// Matches whose offsets no longer agree with the tree.
    pub stale: usize,
}

/// Decorations below `root`, in document order.
pub fn decorations(doc: &Document, root: NodeId) -> Vec<NodeId> {
    doc.descendants(root)
        .into_iter()
        .filter(|&id| doc.decoration(id).is_some())
        .collect()
}

/// The decoration currently tagged as current, if any.
pub fn current_decoration(doc: &Document, root: NodeId) -> Option<NodeId> {
    decorations(doc, root)
        .into_iter()
        .find(|&id| doc.decoration(id).is_some_and(|d| d.is_current))
}

/// Unwraps every decoration below `root` back into plain text and rejoins the
/// fragments each split leaf was cut into. Returns the number of decorations
/// removed.
pub fn remove_highlights(doc: &mut Document, root: NodeId) -> usize {
    let mut touched_parents = BTreeSet::new();
    let mut removed = 0;

    for decoration in decorations(doc, root) {
        let (Some(parent), Some(index)) = (doc.parent(decoration), doc.index_in_parent(decoration))
        else {
            continue;
        };

        let children = doc.children(decoration).to_vec();
        let result = doc
            .insert_children(parent, index, &children)
            .and_then(|()| doc.remove(decoration));
        if let Err(error) = result {
            warn!("Failed to unwrap decoration {}: {}", decoration.index(), error);
            continue;
        }

        touched_parents.insert(parent);
        removed += 1;
    }

    for parent in touched_parents {
        doc.merge_fragments(parent);
    }

    removed
}

/// Replaces all decorations below `root` with one per renderable match.
///
/// `current` indexes into `matches` and marks that decoration as current.
pub fn apply_highlights(
    doc: &mut Document,
    root: NodeId,
    matches: &[Match],
    current: Option<usize>,
) -> HighlightSummary {
    remove_highlights(doc, root);

    let mut summary = HighlightSummary::default();
    if matches.is_empty() {
        return summary;
    }

    let flat = flatten(doc, root);

    // Keyed by leaf start so leaves are visited by identity, in document order.
    let mut by_leaf: BTreeMap<usize, (LeafSpan, Vec<usize>)> = BTreeMap::new();
    for (index, found) in matches.iter().enumerate() {
        if found.is_empty() {
            continue;
        }
        if flat.text.get(found.start..found.end) != Some(found.text.as_str()) {
            debug!("Match {} no longer lines up with the text; skipping", found.id);
            summary.stale += 1;
            continue;
        }
        let Some(span) = flat.leaf_covering(found.start, found.end) else {
            summary.cross_leaf += 1;
            continue;
        };
        by_leaf
            .entry(span.start)
            .or_insert_with(|| (*span, Vec::new()))
            .1
            .push(index);
    }

    for (span, mut indices) in by_leaf.into_values() {
        indices.sort_by_key(|&index| matches[index].start);
        match split_leaf(doc, span, matches, &indices, current) {
            Some(decorated) => {
                summary.decorated += decorated;
                summary.stale += indices.len() - decorated;
            }
            None => summary.stale += indices.len(),
        }
    }

    if summary.cross_leaf > 0 {
        debug!(
            "{} matches cross leaf boundaries and were not decorated",
            summary.cross_leaf
        );
    }
    summary
}

/// Splits one leaf into plain and decorated fragments covering its whole
/// text. Returns the number of decorations created, or `None` when the leaf
/// has vanished or changed since flattening.
fn split_leaf(
    doc: &mut Document,
    span: LeafSpan,
    matches: &[Match],
    indices: &[usize],
    current: Option<usize>,
) -> Option<usize> {
    let Some(text) = doc.text(span.leaf).map(str::to_owned) else {
        debug!("Leaf {} is gone; skipping its matches", span.leaf.index());
        return None;
    };
    if text.len() != span.len() {
        debug!("Leaf {} changed length; skipping its matches", span.leaf.index());
        return None;
    }

    let mut fragments = Vec::with_capacity(indices.len() * 2 + 1);
    let mut cursor = 0;
    let mut decorated = 0;

    for &index in indices {
        let found = &matches[index];
        let start = found.start - span.start;
        let end = found.end - span.start;
        if start < cursor {
            // Overlaps the previous decoration.
            continue;
        }

        if start > cursor {
            fragments.push(doc.create_fragment(&text[cursor..start], span.leaf));
        }

        let decoration = doc.create_decoration(Decoration {
            match_id: found.id.clone(),
            is_current: current == Some(index),
        });
        let inner = doc.create_fragment(&text[start..end], span.leaf);
        if doc.append_child(decoration, inner).is_err() {
            continue;
        }
        fragments.push(decoration);
        cursor = end;
        decorated += 1;
    }

    if cursor < text.len() {
        fragments.push(doc.create_fragment(&text[cursor..], span.leaf));
    }

    if let Err(error) = doc.replace_node(span.leaf, &fragments) {
        warn!("Failed to decorate leaf {}: {}", span.leaf.index(), error);
        for fragment in fragments {
            let _ = doc.remove(fragment);
        }
        return None;
    }

    Some(decorated)
}

/// Moves the current tag to the decoration for `match_id`, leaving every
/// other decoration untouched. Returns the newly current decoration; if none
/// carries `match_id` the current tag is simply cleared.
pub fn set_current(doc: &mut Document, root: NodeId, match_id: &str) -> Option<NodeId> {
    let mut target = None;

    for id in decorations(doc, root) {
        let Some(decoration) = doc.decoration_mut(id) else {
            continue;
        };
        if decoration.match_id == match_id {
            decoration.is_current = true;
            target = Some(id);
        } else if decoration.is_current {
            decoration.is_current = false;
        }
    }

    target
}
