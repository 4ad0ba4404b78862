//! Nearest-time search around a message node.

use chatlens_core::Result;
use chatlens_dom::DocumentView;

use crate::timestamp::{ResolvedTime, TimestampResolver};

/// Elements that may hold a time label.
const TIME_CANDIDATES: &str = "div, span, time";

/// Find the time label closest to `node` in the tree.
///
/// The first pass climbs from the node, trying each level's time-like
/// descendants in document order and then its previous sibling. Only when
/// that finds nothing does a second climb try each level's next sibling.
/// Both climbs stop after `max_depth` levels.
pub fn find_nearest_time<D: DocumentView>(
    doc: &D,
    node: D::Node,
    resolver: &mut TimestampResolver,
    max_depth: usize,
) -> Result<Option<ResolvedTime>> {
    if resolver.grammar().is_none() {
        return Ok(None);
    }

    let mut current = Some(node);
    for _ in 0..max_depth {
        let Some(n) = current else { break };
        for candidate in doc.select(n, TIME_CANDIDATES)? {
            if let Some(time) = resolver.parse_time(&doc.text(candidate)) {
                return Ok(Some(time));
            }
        }
        if let Some(prev) = doc.prev_sibling(n) {
            if let Some(time) = resolver.parse_time(&doc.text(prev)) {
                return Ok(Some(time));
            }
        }
        current = doc.parent(n);
    }

    let mut current = Some(node);
    for _ in 0..max_depth {
        let Some(n) = current else { break };
        if let Some(next) = doc.next_sibling(n) {
            if let Some(time) = resolver.parse_time(&doc.text(next)) {
                return Ok(Some(time));
            }
        }
        current = doc.parent(n);
    }

    Ok(None)
}
