//! Chatlens DOM — the read-only view of the host page the scan engine samples.
//!
//! The engine only talks to [`DocumentView`]. [`HtmlSnapshot`] implements it
//! over a serialized page in which laid-out elements carry their bounding
//! box as `data-rect="left,top,width,height"`.

pub mod document;
pub mod geometry;
pub mod snapshot;

pub use document::DocumentView;
pub use geometry::{Rect, Viewport};
pub use snapshot::HtmlSnapshot;
