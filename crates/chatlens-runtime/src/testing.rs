//! Document wrapper that fails selector lookups on demand.

use chatlens_core::{Error, Result};
use chatlens_dom::{DocumentView, HtmlSnapshot, Rect, Viewport};

type Node = <HtmlSnapshot as DocumentView>::Node;

/// Where `select` fails.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Fault {
    /// Every lookup.
    Everywhere,
    /// Lookups scoped to this node.
    Under(Node),
}

pub(crate) struct FaultyDocument {
    pub inner: HtmlSnapshot,
    pub fault: Option<Fault>,
}

impl DocumentView for FaultyDocument {
    type Node = Node;

    fn root(&self) -> Node {
        self.inner.root()
    }

    fn select(&self, scope: Node, selector: &str) -> Result<Vec<Node>> {
        match self.fault {
            Some(Fault::Everywhere) => Err(Error::Document("document detached".into())),
            Some(Fault::Under(node)) if node == scope => {
                Err(Error::Selector(format!("lookup failed under {:?}", node)))
            }
            _ => self.inner.select(scope, selector),
        }
    }

    fn parent(&self, node: Node) -> Option<Node> {
        self.inner.parent(node)
    }

    fn children(&self, node: Node) -> Vec<Node> {
        self.inner.children(node)
    }

    fn prev_sibling(&self, node: Node) -> Option<Node> {
        self.inner.prev_sibling(node)
    }

    fn next_sibling(&self, node: Node) -> Option<Node> {
        self.inner.next_sibling(node)
    }

    fn text(&self, node: Node) -> String {
        self.inner.text(node)
    }

    fn attr(&self, node: Node, name: &str) -> Option<String> {
        self.inner.attr(node, name)
    }

    fn classes(&self, node: Node) -> Vec<String> {
        self.inner.classes(node)
    }

    fn rect(&self, node: Node) -> Option<Rect> {
        self.inner.rect(node)
    }

    fn viewport(&self) -> Viewport {
        self.inner.viewport()
    }
}
