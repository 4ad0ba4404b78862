//! The document interface consumed by the scan engine.

use chatlens_core::Result;

use crate::geometry::{Rect, Viewport};

/// Read-only view of a hierarchical, laid-out document.
///
/// `select` follows `querySelectorAll` semantics: descendants of `scope`
/// (never `scope` itself) in document order, with selectors matched against
/// the whole document. Sibling accessors skip non-element nodes. Traversal
/// and geometry calls on detached nodes return empty values rather than
/// failing.
pub trait DocumentView {
    type Node: Copy + Eq + std::fmt::Debug;

    fn root(&self) -> Self::Node;

    fn select(&self, scope: Self::Node, selector: &str) -> Result<Vec<Self::Node>>;

    fn select_first(&self, scope: Self::Node, selector: &str) -> Result<Option<Self::Node>> {
        Ok(self.select(scope, selector)?.into_iter().next())
    }

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    fn prev_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// Concatenated descendant text, untrimmed.
    fn text(&self, node: Self::Node) -> String;

    fn attr(&self, node: Self::Node, name: &str) -> Option<String>;

    fn classes(&self, node: Self::Node) -> Vec<String>;

    /// `None` for elements without layout.
    fn rect(&self, node: Self::Node) -> Option<Rect>;

    fn viewport(&self) -> Viewport;

    /// Whether the element is on screen with non-trivial size.
    fn is_visible(&self, node: Self::Node, min_size: f64) -> bool {
        let viewport = self.viewport();
        self.rect(node)
            .map_or(false, |rect| rect.is_visible_in(&viewport, min_size))
    }
}
