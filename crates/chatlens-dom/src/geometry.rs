//! Element geometry and the visibility test.

use serde::{Deserialize, Serialize};

/// Size of the hosting display surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Parse `"WIDTHxHEIGHT"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (w, h) = raw.trim().split_once(['x', 'X'])?;
        let width: f64 = w.trim().parse().ok()?;
        let height: f64 = h.trim().parse().ok()?;
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            Some(Self { width, height })
        } else {
            None
        }
    }
}

/// Bounding rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Parse `"left,top,width,height"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let parts: Vec<f64> = raw
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        match parts.as_slice() {
            &[left, top, width, height]
                if parts.iter().all(|v| v.is_finite()) && width >= 0.0 && height >= 0.0 =>
            {
                Some(Self::new(left, top, width, height))
            }
            _ => None,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    /// On screen on both axes and larger than `min_size` in both dimensions.
    ///
    /// Collapsed placeholders used by virtualized lists fail the size test.
    pub fn is_visible_in(&self, viewport: &Viewport, min_size: f64) -> bool {
        let vertical = self.top < viewport.height && self.bottom() > 0.0;
        let horizontal = self.left < viewport.width && self.right() > 0.0;
        vertical && horizontal && self.height > min_size && self.width > min_size
    }
}
