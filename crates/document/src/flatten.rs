use crate::tree::{Document, NodeId, NodeKind};

/// Tags whose text is not rendered content.
pub const EXCLUDED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Where one text leaf sits inside the flat text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafSpan {
    pub leaf: NodeId,
    pub start: usize,
    pub end: usize,
}

impl LeafSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if the whole of `start..end` falls inside this leaf.
    pub fn covers(&self, start: usize, end: usize) -> bool {
        start >= self.start && end <= self.end
    }
}

/// Concatenated text of a subtree plus the leaf-offset table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatText {
    pub text: String,
    pub leaves: Vec<LeafSpan>,
}

impl FlatText {
    /// The leaf that fully contains `start..end`, if a single one does.
    pub fn leaf_covering(&self, start: usize, end: usize) -> Option<&LeafSpan> {
        let index = self.leaves.partition_point(|span| span.end <= start);
        self.leaves[index..]
            .iter()
            .take_while(|span| span.start <= start)
            .find(|span| !span.is_empty() && span.covers(start, end))
    }

    /// The non-empty leaf holding the byte at `offset`.
    pub fn leaf_at(&self, offset: usize) -> Option<&LeafSpan> {
        self.leaf_covering(offset, offset + 1)
    }
}

/// Walks the text leaves below `root` in document order, skipping
/// non-content subtrees, and concatenates them without separators.
pub fn flatten(doc: &Document, root: NodeId) -> FlatText {
    let mut flat = FlatText::default();
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        let Some(node) = doc.get(id) else {
            continue;
        };

        match node.kind() {
            NodeKind::Text(text) => {
                let start = flat.text.len();
                flat.text.push_str(text);
                flat.leaves.push(LeafSpan {
                    leaf: id,
                    start,
                    end: flat.text.len(),
                });
            }
            NodeKind::Comment(_) => {}
            NodeKind::Element(element) if is_excluded_tag(&element.tag) => {}
            NodeKind::Element(_) | NodeKind::Decoration(_) => {
                stack.extend(node.children().iter().rev());
            }
        }
    }

    flat
}

pub fn is_excluded_tag(tag: &str) -> bool {
    EXCLUDED_TAGS.iter().any(|excluded| tag.eq_ignore_ascii_case(excluded))
}
