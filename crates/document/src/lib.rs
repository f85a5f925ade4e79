//! Structural documents that can be searched and highlighted in place.

mod backend;
mod error;
mod flatten;
mod highlight;
mod markup;
mod tree;

pub use backend::DocumentBackend;
pub use error::{DocumentError, Result};
pub use flatten::{EXCLUDED_TAGS, FlatText, LeafSpan, flatten, is_excluded_tag};
pub use highlight::{
    HighlightSummary, apply_highlights, current_decoration, decorations, remove_highlights,
    set_current,
};
pub use markup::{
    DECORATION_TAG, DOCUMENT_ROOT_TAG, inner_markup, parse_markup, parse_plain_text, to_markup,
};
pub use tree::{Decoration, Document, Element, Node, NodeId, NodeKind};
