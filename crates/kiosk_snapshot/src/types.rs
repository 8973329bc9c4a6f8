//! Geometry and position-bucket types.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in viewport space (origin top-left).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    #[inline]
    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }

    /// Check if a point falls inside the rectangle.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Check if the rectangle has zero or negative area.
    pub fn is_degenerate(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }
}

/// Position bucket for a node relative to the viewport.
///
/// Buckets are corroborating evidence for classification, derived from
/// where the node's center falls: the top band of the viewport, the left
/// band (sidebar), or everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Zone {
    /// Top navigation band.
    TopBar,

    /// Left sidebar band.
    Sidebar,

    /// Everything below/right of the chrome bands.
    #[default]
    Body,
}

impl Zone {
    /// Derive the bucket for `bounds` within `viewport`.
    ///
    /// `top_fraction` and `sidebar_fraction` are the band sizes as a share
    /// of the viewport's extent. Degenerate viewports bucket to Body.
    pub fn from_bounds(
        bounds: Rect,
        viewport: Rect,
        top_fraction: f32,
        sidebar_fraction: f32,
    ) -> Self {
        if viewport.is_degenerate() {
            return Zone::Body;
        }

        let top_edge = viewport.y + viewport.h * top_fraction;
        if bounds.center_y() < top_edge {
            return Zone::TopBar;
        }

        let sidebar_edge = viewport.x + viewport.w * sidebar_fraction;
        if bounds.center_x() < sidebar_edge {
            return Zone::Sidebar;
        }

        Zone::Body
    }

    /// Stable name for rule tables and journals.
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::TopBar => "top-bar",
            Zone::Sidebar => "sidebar",
            Zone::Body => "body",
        }
    }
}

impl std::str::FromStr for Zone {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top-bar" => Ok(Zone::TopBar),
            "sidebar" => Ok(Zone::Sidebar),
            "body" => Ok(Zone::Body),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Rect = Rect {
        x: 0.0,
        y: 0.0,
        w: 1280.0,
        h: 720.0,
    };

    #[test]
    fn rect_contains() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(15.0, 15.0));
        assert!(!r.contains(35.0, 15.0));
        assert!(!r.contains(15.0, 35.0));
    }

    #[test]
    fn zone_top_bar() {
        let node = Rect::new(600.0, 10.0, 40.0, 30.0);
        assert_eq!(Zone::from_bounds(node, VIEWPORT, 0.15, 0.2), Zone::TopBar);
    }

    #[test]
    fn zone_sidebar() {
        let node = Rect::new(10.0, 300.0, 180.0, 30.0);
        assert_eq!(Zone::from_bounds(node, VIEWPORT, 0.15, 0.2), Zone::Sidebar);
    }

    #[test]
    fn zone_body() {
        let node = Rect::new(600.0, 400.0, 200.0, 100.0);
        assert_eq!(Zone::from_bounds(node, VIEWPORT, 0.15, 0.2), Zone::Body);
    }

    #[test]
    fn zone_degenerate_viewport_is_body() {
        let node = Rect::new(0.0, 0.0, 10.0, 10.0);
        let degenerate = Rect::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(Zone::from_bounds(node, degenerate, 0.15, 0.2), Zone::Body);
    }

    #[test]
    fn zone_round_trips_names() {
        for zone in [Zone::TopBar, Zone::Sidebar, Zone::Body] {
            assert_eq!(zone.as_str().parse::<Zone>(), Ok(zone));
        }
    }
}
