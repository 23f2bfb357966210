use std::fmt;
use std::str::FromStr;

use ratatui::prelude::Rect;
use thiserror::Error;

/// Signed cell rectangle origin with unsigned size.
///
/// Anchors and panels may sit partially off-viewport, so the origin is kept
/// signed; `ratatui::layout::Rect` only enters at the render boundary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl CellRect {
    pub fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// First column past the right edge.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(i32::from(self.width))
    }

    /// First row past the bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(i32::from(self.height))
    }

    pub fn center_x(&self) -> i32 {
        self.x.saturating_add(i32::from(self.width / 2))
    }

    pub fn center_y(&self) -> i32 {
        self.y.saturating_add(i32::from(self.height / 2))
    }
}

impl From<Rect> for CellRect {
    fn from(rect: Rect) -> Self {
        Self {
            x: i32::from(rect.x),
            y: i32::from(rect.y),
            width: rect.width,
            height: rect.height,
        }
    }
}

/// One of 12 directions a floating panel can take relative to its anchor:
/// four edges, each with a centered, start-aligned, or end-aligned variant.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Top,
    TopStart,
    TopEnd,
    #[default]
    Bottom,
    BottomStart,
    BottomEnd,
    Left,
    LeftStart,
    LeftEnd,
    Right,
    RightStart,
    RightEnd,
}

impl Placement {
    pub const ALL: [Placement; 12] = [
        Placement::Top,
        Placement::TopStart,
        Placement::TopEnd,
        Placement::Bottom,
        Placement::BottomStart,
        Placement::BottomEnd,
        Placement::Left,
        Placement::LeftStart,
        Placement::LeftEnd,
        Placement::Right,
        Placement::RightStart,
        Placement::RightEnd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Placement::Top => "top",
            Placement::TopStart => "top-start",
            Placement::TopEnd => "top-end",
            Placement::Bottom => "bottom",
            Placement::BottomStart => "bottom-start",
            Placement::BottomEnd => "bottom-end",
            Placement::Left => "left",
            Placement::LeftStart => "left-start",
            Placement::LeftEnd => "left-end",
            Placement::Right => "right",
            Placement::RightStart => "right-start",
            Placement::RightEnd => "right-end",
        }
    }

    /// Next placement in declaration order, wrapping around.
    pub fn cycle(self) -> Placement {
        let idx = Placement::ALL
            .iter()
            .position(|candidate| *candidate == self)
            .unwrap_or(0);
        Placement::ALL[(idx + 1) % Placement::ALL.len()]
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown placement `{0}`")]
pub struct ParsePlacementError(String);

impl FromStr for Placement {
    type Err = ParsePlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Placement::ALL
            .iter()
            .copied()
            .find(|placement| placement.as_str() == s)
            .ok_or_else(|| ParsePlacementError(s.to_string()))
    }
}
