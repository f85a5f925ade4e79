use crate::error::{DocumentError, Result};

/// Handle to a node in a [`Document`].
///
/// Slots are never reused, so a handle to a removed node stays dead instead of
/// aliasing a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    /// Event names with handlers bound to this element.
    pub listeners: Vec<String>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_listener(mut self, event: &str) -> Self {
        self.listeners.push(event.to_string());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Highlight marker wrapping exactly one match's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub match_id: String,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
    Decoration(Decoration),
    /// Markup comment; never searched.
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Original leaf this text was cut from by the highlight renderer.
    split_from: Option<NodeId>,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_decoration(&self) -> Option<&Decoration> {
        match &self.kind {
            NodeKind::Decoration(decoration) => Some(decoration),
            _ => None,
        }
    }
}

/// Arena-backed structural tree of elements, text leaves and decorations.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl Document {
    pub fn new(root_tag: &str) -> Self {
        let mut document = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        document.root = document.create(NodeKind::Element(Element::new(root_tag)));
        document
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id).ok_or(DocumentError::NodeNotFound(id.0))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.get_mut(id).ok_or(DocumentError::NodeNotFound(id.0))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            kind,
            parent: None,
            children: Vec::new(),
            split_from: None,
        }));
        id
    }

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.create(NodeKind::Element(element))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.create(NodeKind::Text(text.to_string()))
    }

    pub fn create_decoration(&mut self, decoration: Decoration) -> NodeId {
        self.create(NodeKind::Decoration(decoration))
    }

    pub fn create_comment(&mut self, comment: &str) -> NodeId {
        self.create(NodeKind::Comment(comment.to_string()))
    }

    /// Text node cut out of the leaf `source`. Fragments sharing a source are
    /// the only text nodes [`merge_fragments`](Self::merge_fragments) joins.
    pub fn create_fragment(&mut self, text: &str, source: NodeId) -> NodeId {
        let id = self.create_text(text);
        if let Some(node) = self.get_mut(id) {
            node.split_from = Some(source);
        }
        id
    }

    pub fn fragment_source(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.split_from
    }

    /// Joins each run of adjacent fragments of `parent` cut from the same
    /// leaf back into one plain text leaf. Text leaves that were separate to
    /// begin with stay separate.
    pub fn merge_fragments(&mut self, parent: NodeId) {
        let mut run: Option<(NodeId, NodeId)> = None;

        for child in self.children(parent).to_vec() {
            let Some(source) = self.fragment_source(child) else {
                run = None;
                continue;
            };
            let Some(text) = self.text(child).map(str::to_owned) else {
                run = None;
                continue;
            };

            match run {
                Some((head, head_source)) if head_source == source => {
                    let merged = format!("{}{}", self.text(head).unwrap_or_default(), text);
                    let _ = self.set_text(head, &merged);
                    let _ = self.remove(child);
                }
                _ => run = Some((child, source)),
            }
        }

        for child in self.children(parent).to_vec() {
            if let Some(node) = self.get_mut(child) {
                node.split_from = None;
            }
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self.node(parent)?.children.len();
        self.insert_children(parent, index, &[child])
    }

    pub fn append_element(&mut self, parent: NodeId, element: Element) -> Result<NodeId> {
        let id = self.create_element(element);
        self.append_child(parent, id)?;
        Ok(id)
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        let id = self.create_text(text);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Inserts detached nodes into `parent` starting at `index`. Nodes that
    /// are still attached elsewhere are moved.
    pub fn insert_children(&mut self, parent: NodeId, index: usize, children: &[NodeId]) -> Result<()> {
        self.node(parent)?;
        for &child in children {
            self.node(child)?;
            self.detach(child)?;
        }

        let siblings = &mut self.node_mut(parent)?.children;
        let index = index.min(siblings.len());
        siblings.splice(index..index, children.iter().copied());

        for &child in children {
            self.node_mut(child)?.parent = Some(parent);
        }
        Ok(())
    }

    /// Position of `node` among its parent's children.
    pub fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.get(node)?.parent?;
        self.get(parent)?.children.iter().position(|&child| child == node)
    }

    /// Unlinks `node` from its parent, keeping it and its subtree alive.
    pub fn detach(&mut self, node: NodeId) -> Result<()> {
        let Some(parent) = self.node(node)?.parent else {
            return Ok(());
        };
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.children.retain(|&child| child != node);
        }
        self.node_mut(node)?.parent = None;
        Ok(())
    }

    /// Detaches `node` and frees it together with its subtree.
    pub fn remove(&mut self, node: NodeId) -> Result<()> {
        self.detach(node)?;
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(removed) = self.nodes.get_mut(id.0).and_then(Option::take) {
                stack.extend(removed.children);
            }
        }
        Ok(())
    }

    /// Puts `replacements` where `node` was and frees `node`.
    pub fn replace_node(&mut self, node: NodeId, replacements: &[NodeId]) -> Result<()> {
        let parent = self
            .node(node)?
            .parent
            .ok_or(DocumentError::NodeNotFound(node.0))?;
        let index = self
            .index_in_parent(node)
            .ok_or(DocumentError::NodeNotFound(node.0))?;
        self.remove(node)?;
        self.insert_children(parent, index, replacements)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.get(node).map(Node::children).unwrap_or(&[])
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.parent
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.get(node)?.as_text()
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        match &mut self.node_mut(node)?.kind {
            NodeKind::Text(existing) => {
                text.clone_into(existing);
                Ok(())
            }
            _ => Err(DocumentError::NotText(node.0)),
        }
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.get(node)?.as_element()
    }

    pub fn comment(&self, node: NodeId) -> Option<&str> {
        match &self.get(node)?.kind {
            NodeKind::Comment(comment) => Some(comment),
            _ => None,
        }
    }

    pub fn decoration(&self, node: NodeId) -> Option<&Decoration> {
        self.get(node)?.as_decoration()
    }

    pub fn decoration_mut(&mut self, node: NodeId) -> Option<&mut Decoration> {
        match &mut self.get_mut(node)?.kind {
            NodeKind::Decoration(decoration) => Some(decoration),
            _ => None,
        }
    }

    /// `root` and everything below it, in document order.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.children.iter().rev());
        }
        order
    }

    /// Nearest element at or above `node`.
    pub fn enclosing_element(&self, node: NodeId) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.element(id).is_some() {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }
}
