//! HTML snapshot of a rendered page, backed by `scraper`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use chatlens_core::{Error, Result};
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::document::DocumentView;
use crate::geometry::{Rect, Viewport};

/// Attribute carrying an element's bounding box.
pub const RECT_ATTR: &str = "data-rect";
/// `<meta name=... content="WIDTHxHEIGHT">` carrying the viewport size.
pub const VIEWPORT_META: &str = "chatlens-viewport";

/// One captured frame of the host page.
pub struct HtmlSnapshot {
    html: Html,
    viewport: Viewport,
    /// Parsed selectors, keyed by source text.
    selectors: RefCell<HashMap<String, Selector>>,
}

impl HtmlSnapshot {
    /// Parse a page with an explicit viewport.
    pub fn parse(source: &str, viewport: Viewport) -> Self {
        Self {
            html: Html::parse_document(source),
            viewport,
            selectors: RefCell::new(HashMap::new()),
        }
    }

    /// Parse a page whose viewport is declared in a `chatlens-viewport` meta tag.
    pub fn parse_with_meta(source: &str) -> Result<Self> {
        let html = Html::parse_document(source);
        let meta = Selector::parse(&format!(r#"meta[name="{}"]"#, VIEWPORT_META))
            .map_err(|e| Error::Selector(format!("{:?}", e)))?;
        let viewport = html
            .select(&meta)
            .next()
            .and_then(|m| m.value().attr("content"))
            .and_then(Viewport::parse)
            .ok_or_else(|| Error::Document(format!("missing or invalid {} meta", VIEWPORT_META)))?;

        Ok(Self {
            html,
            viewport,
            selectors: RefCell::new(HashMap::new()),
        })
    }

    /// Read a captured frame from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        debug!("Loaded snapshot {} ({} bytes)", path.display(), source.len());
        Self::parse_with_meta(&source)
    }

    fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    fn with_selector<T>(&self, selector: &str, f: impl FnOnce(&Selector) -> T) -> Result<T> {
        if let Some(parsed) = self.selectors.borrow().get(selector) {
            return Ok(f(parsed));
        }
        let parsed = Selector::parse(selector)
            .map_err(|e| Error::Selector(format!("{}: {:?}", selector, e)))?;
        let out = f(&parsed);
        self.selectors
            .borrow_mut()
            .insert(selector.to_string(), parsed);
        Ok(out)
    }
}

impl DocumentView for HtmlSnapshot {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.html.root_element().id()
    }

    fn select(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let Some(scope) = self.element(scope) else {
            return Ok(Vec::new());
        };
        self.with_selector(selector, |sel| {
            scope
                .descendants()
                .skip(1)
                .filter_map(ElementRef::wrap)
                .filter(|el| sel.matches(el))
                .map(|el| el.id())
                .collect()
        })
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.html
            .tree
            .get(node)?
            .parent()
            .and_then(ElementRef::wrap)
            .map(|el| el.id())
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        match self.html.tree.get(node) {
            Some(n) => n
                .children()
                .filter(|c| c.value().is_element())
                .map(|c| c.id())
                .collect(),
            None => Vec::new(),
        }
    }

    fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        let mut current = self.html.tree.get(node)?.prev_sibling();
        while let Some(n) = current {
            if n.value().is_element() {
                return Some(n.id());
            }
            current = n.prev_sibling();
        }
        None
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let mut current = self.html.tree.get(node)?.next_sibling();
        while let Some(n) = current {
            if n.value().is_element() {
                return Some(n.id());
            }
            current = n.next_sibling();
        }
        None
    }

    fn text(&self, node: NodeId) -> String {
        self.element(node)
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default()
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node)?.value().attr(name).map(str::to_string)
    }

    fn classes(&self, node: NodeId) -> Vec<String> {
        self.element(node)
            .map(|el| el.value().classes().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn rect(&self, node: NodeId) -> Option<Rect> {
        self.element(node)?
            .value()
            .attr(RECT_ATTR)
            .and_then(Rect::parse)
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}
