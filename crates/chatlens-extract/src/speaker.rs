//! Speaker classification: structural cues first, geometry as fallback.

use chatlens_core::{ClassMarker, Sender, SpeakerCues};
use chatlens_dom::{DocumentView, Rect, Viewport};
use serde::Serialize;

/// The rule that decided a speaker verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerRule {
    StructuralMarkers,
    EdgeBias,
    SiblingConsensus,
    /// Always answers.
    Midline,
}

impl SpeakerRule {
    pub fn all() -> &'static [SpeakerRule] {
        &[
            Self::StructuralMarkers,
            Self::EdgeBias,
            Self::SiblingConsensus,
            Self::Midline,
        ]
    }
}

/// Decides whether a node belongs to the operator or the partner.
#[derive(Debug, Clone, Copy)]
pub struct SpeakerClassifier {
    cues: SpeakerCues,
    /// Levels inspected for structural markers, counting the node itself.
    depth: usize,
}

impl SpeakerClassifier {
    pub fn new(cues: SpeakerCues, depth: usize) -> Self {
        Self { cues, depth }
    }

    pub fn classify<D: DocumentView>(&self, doc: &D, node: D::Node) -> Sender {
        self.verdict(doc, node).1
    }

    /// Run the rules in order and report which one answered.
    pub fn verdict<D: DocumentView>(&self, doc: &D, node: D::Node) -> (SpeakerRule, Sender) {
        let viewport = doc.viewport();
        let rect = doc.rect(node);

        for rule in SpeakerRule::all() {
            let answer = match rule {
                SpeakerRule::StructuralMarkers => self.structural(doc, node),
                SpeakerRule::EdgeBias => rect.and_then(|r| edge_bias(&r, &viewport)),
                SpeakerRule::SiblingConsensus => {
                    rect.and_then(|r| sibling_consensus(doc, node, &r, &viewport))
                }
                SpeakerRule::Midline => Some(midline(rect.as_ref(), &viewport)),
            };
            if let Some(sender) = answer {
                return (*rule, sender);
            }
        }
        (SpeakerRule::Midline, midline(rect.as_ref(), &viewport))
    }

    fn structural<D: DocumentView>(&self, doc: &D, node: D::Node) -> Option<Sender> {
        let mut current = Some(node);
        for _ in 0..self.depth {
            let Some(n) = current else { break };
            if let Some(sender) = self.level_verdict(&doc.classes(n)) {
                return Some(sender);
            }
            current = doc.parent(n);
        }
        None
    }

    fn level_verdict(&self, classes: &[String]) -> Option<Sender> {
        match self.cues {
            SpeakerCues::Geometric => None,
            SpeakerCues::OutgoingClass {
                container,
                outgoing,
            } => {
                let is_out = classes.iter().any(|c| c == outgoing);
                if is_out {
                    Some(Sender::Me)
                } else if classes.iter().any(|c| c == container) {
                    Some(Sender::Other)
                } else {
                    None
                }
            }
            SpeakerCues::OwnerClass { mine, other } => {
                if any_marker(mine, classes) {
                    Some(Sender::Me)
                } else if any_marker(other, classes) {
                    Some(Sender::Other)
                } else {
                    None
                }
            }
        }
    }
}

fn any_marker(markers: &[ClassMarker], classes: &[String]) -> bool {
    markers.iter().any(|m| m.matches(classes))
}

fn edge_bias(rect: &Rect, viewport: &Viewport) -> Option<Sender> {
    if rect.left > viewport.width * 0.6 {
        Some(Sender::Me)
    } else if rect.right() < viewport.width * 0.4 {
        Some(Sender::Other)
    } else {
        None
    }
}

fn sibling_consensus<D: DocumentView>(
    doc: &D,
    node: D::Node,
    rect: &Rect,
    viewport: &Viewport,
) -> Option<Sender> {
    let parent = doc.parent(node)?;
    let midpoint = viewport.width / 2.0;

    let centers: Vec<f64> = doc
        .children(parent)
        .into_iter()
        .filter_map(|child| doc.rect(child))
        .map(|r| r.center_x())
        .collect();
    if centers.is_empty() {
        return None;
    }

    let total = centers.len() as f64;
    let right = centers.iter().filter(|c| **c > midpoint).count() as f64;
    let center = rect.center_x();

    if right > total * 0.6 && center > viewport.width * 0.4 {
        Some(Sender::Me)
    } else if right < total * 0.4 && center < viewport.width * 0.6 {
        Some(Sender::Other)
    } else {
        None
    }
}

fn midline(rect: Option<&Rect>, viewport: &Viewport) -> Sender {
    match rect {
        Some(r) if r.center_x() > viewport.width / 2.0 => Sender::Me,
        _ => Sender::Other,
    }
}
