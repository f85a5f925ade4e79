use findmark_search::{Match, SearchBackend, SearchDirection, SearchOptions, SearchPattern, find_matches};
use log::{debug, warn};

use crate::flatten::flatten;
use crate::highlight::{apply_highlights, remove_highlights, set_current};
use crate::tree::{Document, NodeId};

/// Searches and decorates one subtree of a document.
pub struct DocumentBackend {
    document: Document,
    root: NodeId,
    group: String,
    revealed: Option<NodeId>,
}

impl DocumentBackend {
    /// Searches the whole document. `group` prefixes match ids.
    pub fn new(document: Document, group: &str) -> Self {
        let root = document.root();
        Self::with_root(document, root, group)
    }

    pub fn with_root(document: Document, root: NodeId, group: &str) -> Self {
        Self {
            document,
            root,
            group: group.to_string(),
            revealed: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable access for content updates. Callers must re-run the search
    /// afterwards; stored matches refer to the old text.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// Node most recently brought into view by navigation.
    pub fn revealed(&self) -> Option<NodeId> {
        self.revealed
    }

    fn clear(&mut self) {
        remove_highlights(&mut self.document, self.root);
        self.revealed = None;
    }

    fn element_at(&self, offset: usize) -> Option<NodeId> {
        let flat = flatten(&self.document, self.root);
        let span = flat.leaf_at(offset)?;
        self.document.enclosing_element(span.leaf)
    }
}

impl SearchBackend for DocumentBackend {
    fn search(&mut self, query: &str, options: SearchOptions) -> Vec<Match> {
        let pattern = match SearchPattern::compile(query, options) {
            Ok(Some(pattern)) => pattern,
            Ok(None) => {
                self.clear();
                return Vec::new();
            }
            Err(error) => {
                warn!("{}", error);
                self.clear();
                return Vec::new();
            }
        };

        if !self.document.contains(self.root) {
            warn!("Search root {} is no longer in the document", self.root.index());
            return Vec::new();
        }

        let flat = flatten(&self.document, self.root);
        let matches = find_matches(&flat.text, &pattern, &self.group);
        let summary = apply_highlights(&mut self.document, self.root, &matches, None);
        self.revealed = None;
        debug!(
            "Found {} matches for `{}`; decorated {}, {} across leaves",
            matches.len(),
            query,
            summary.decorated,
            summary.cross_leaf
        );
        matches
    }

    fn navigate(&mut self, target: Option<&Match>, direction: SearchDirection) {
        let Some(target) = target else {
            set_current(&mut self.document, self.root, "");
            return;
        };
        if target.group != self.group {
            debug!("Ignoring match {} from group `{}`", target.id, target.group);
            return;
        }

        let revealed = set_current(&mut self.document, self.root, &target.id)
            .or_else(|| self.element_at(target.start));
        debug!("Navigated {:?} to {}", direction, target.id);
        self.revealed = revealed;
    }

    fn close(&mut self) {
        self.clear();
    }

    fn reset(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::{current_decoration, decorations};
    use crate::markup::{inner_markup, parse_markup};
    use findmark_search::{SearchPhase, SearchSession};
    use pretty_assertions::assert_eq;

    const PAGE: &str = "<div><p onclick=\"x()\">The quick brown fox</p>\
                        <p>jumps over the <em>lazy</em> fox</p>\
                        <script>var fox = 1;</script></div>";

    fn session() -> SearchSession<DocumentBackend> {
        let doc = parse_markup(PAGE).unwrap();
        let mut session = SearchSession::new(DocumentBackend::new(doc, "page"));
        session.open();
        session
    }

    fn current_id(session: &SearchSession<DocumentBackend>) -> Option<String> {
        let backend = session.backend();
        current_decoration(backend.document(), backend.root())
            .and_then(|id| backend.document().decoration(id))
            .map(|d| d.match_id.clone())
    }

    #[test]
    fn query_decorates_and_marks_first_current() {
        let mut session = session();
        session.set_query("fox");

        assert_eq!(session.total_matches(), 2);
        assert_eq!(session.counter_label(), "1 of 2");
        assert_eq!(current_id(&session).as_deref(), Some("page-0"));
        let backend = session.backend();
        assert_eq!(decorations(backend.document(), backend.root()).len(), 2);
        assert!(backend.revealed().is_some());
    }

    #[test]
    fn navigation_moves_current_decoration() {
        let mut session = session();
        session.set_query("fox");
        session.next_match();
        assert_eq!(current_id(&session).as_deref(), Some("page-1"));
        session.next_match();
        assert_eq!(current_id(&session).as_deref(), Some("page-0"));
        session.previous_match();
        assert_eq!(current_id(&session).as_deref(), Some("page-1"));
    }

    #[test]
    fn cross_leaf_match_is_navigable_without_marker() {
        let mut session = session();
        session.set_query("the lazy");

        assert_eq!(session.total_matches(), 1);
        assert_eq!(session.current_match(), 1);
        let backend = session.backend();
        assert!(decorations(backend.document(), backend.root()).is_empty());
        let revealed = backend.revealed().unwrap();
        assert_eq!(
            backend.document().element(revealed).map(|e| e.tag.as_str()),
            Some("p")
        );
    }

    #[test]
    fn toggles_recompute_decorations() {
        let mut session = session();
        session.set_query("The");
        assert_eq!(session.total_matches(), 2);

        session.toggle_case_sensitive();
        session.run_pending();
        assert_eq!(session.total_matches(), 1);
        let backend = session.backend();
        assert_eq!(decorations(backend.document(), backend.root()).len(), 1);
    }

    #[test]
    fn whole_word_over_document() {
        let mut session = session();
        session.set_query("o");
        let loose = session.total_matches();
        session.toggle_whole_word();
        session.run_pending();
        assert!(loose > 0);
        assert_eq!(session.total_matches(), 0);
        assert_eq!(session.counter_label(), "No matches");
    }

    #[test]
    fn close_restores_original_markup() {
        let mut session = session();
        let original = {
            let backend = session.backend();
            inner_markup(backend.document(), backend.root())
        };
        session.set_query("o");
        session.next_match();
        session.close();

        assert_eq!(session.phase(), SearchPhase::Closed);
        let backend = session.backend();
        assert_eq!(inner_markup(backend.document(), backend.root()), original);
        assert!(backend.revealed().is_none());
    }

    #[test]
    fn clearing_query_drops_decorations() {
        let mut session = session();
        session.set_query("fox");
        session.set_query("");
        let backend = session.backend();
        assert!(decorations(backend.document(), backend.root()).is_empty());
    }

    #[test]
    fn script_text_is_not_matched() {
        let mut session = session();
        session.set_query("var");
        assert_eq!(session.total_matches(), 0);
    }

    #[test]
    fn content_change_requires_fresh_search() {
        let mut session = session();
        session.set_query("fox");
        let div = session.backend().document().children(session.backend().root())[0];
        let first_p = session.backend().document().children(div)[0];
        let leaf = session.backend().document().children(first_p)[0];
        session
            .backend_mut()
            .document_mut()
            .set_text(leaf, "A slow ")
            .unwrap();

        session.set_query("fox");
        assert_eq!(session.total_matches(), 2);
        let flat = flatten(session.backend().document(), session.backend().root());
        assert!(flat.text.starts_with("A slow foxjumps"));
    }

    #[test]
    fn foreign_matches_are_ignored() {
        let doc = parse_markup("<p>fox</p>").unwrap();
        let mut backend = DocumentBackend::new(doc, "a");
        let matches = backend.search("fox", SearchOptions::default());
        let foreign = Match::new("b", 0, "fox", 0, 3);
        backend.navigate(Some(&foreign), SearchDirection::Next);
        assert!(backend.revealed().is_none());

        backend.navigate(matches.first(), SearchDirection::Next);
        assert!(backend.revealed().is_some());
    }
}
