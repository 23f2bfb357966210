use crate::geometry::{CellRect, Placement};

/// Extra cell of gap reserved for the arrow glyph between panel and anchor.
pub const ARROW_GAP: u16 = 1;
/// Minimum inset of the arrow from the panel corner it is measured from.
pub const ARROW_MARGIN: u16 = 2;

/// Cross-axis inset of the arrow glyph, measured from the named panel edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowOffset {
    FromLeft(u16),
    FromRight(u16),
    FromTop(u16),
    FromBottom(u16),
}

/// Viewport-relative position for a floating panel, plus where to draw its
/// arrow when one was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelPosition {
    pub top: i32,
    pub left: i32,
    pub arrow: Option<ArrowOffset>,
}

/// Compute where a panel of the given size lands relative to its anchor.
///
/// `gap` is the number of cells between anchor and panel; requesting an arrow
/// widens it by [`ARROW_GAP`] so the glyph has a cell of its own. The result
/// may lie outside the viewport; callers pick a placement that fits, since no
/// collision avoidance or flipping happens here. Degenerate zero-size
/// rectangles are fine and simply collapse the result onto the anchor.
pub fn resolve_placement(
    anchor: CellRect,
    panel: CellRect,
    placement: Placement,
    gap: u16,
    arrow: bool,
) -> PanelPosition {
    let offset = if arrow {
        i32::from(gap.saturating_add(ARROW_GAP))
    } else {
        i32::from(gap)
    };

    let (top, left) = match placement {
        Placement::Top | Placement::TopStart | Placement::TopEnd => {
            let top = anchor
                .y
                .saturating_sub(i32::from(panel.height))
                .saturating_sub(offset);
            (top, aligned_x(anchor, panel, placement))
        }
        Placement::Bottom | Placement::BottomStart | Placement::BottomEnd => {
            (anchor.bottom().saturating_add(offset), aligned_x(anchor, panel, placement))
        }
        Placement::Left | Placement::LeftStart | Placement::LeftEnd => {
            let left = anchor
                .x
                .saturating_sub(i32::from(panel.width))
                .saturating_sub(offset);
            (aligned_y(anchor, panel, placement), left)
        }
        Placement::Right | Placement::RightStart | Placement::RightEnd => {
            (aligned_y(anchor, panel, placement), anchor.right().saturating_add(offset))
        }
    };

    let arrow = arrow.then(|| arrow_offset(anchor, panel, placement));
    PanelPosition { top, left, arrow }
}

fn aligned_x(anchor: CellRect, panel: CellRect, placement: Placement) -> i32 {
    match placement {
        Placement::TopStart | Placement::BottomStart => anchor.x,
        Placement::TopEnd | Placement::BottomEnd => {
            anchor.right().saturating_sub(i32::from(panel.width))
        }
        _ => anchor.center_x().saturating_sub(i32::from(panel.width / 2)),
    }
}

fn aligned_y(anchor: CellRect, panel: CellRect, placement: Placement) -> i32 {
    match placement {
        Placement::LeftStart | Placement::RightStart => anchor.y,
        Placement::LeftEnd | Placement::RightEnd => {
            anchor.bottom().saturating_sub(i32::from(panel.height))
        }
        _ => anchor.center_y().saturating_sub(i32::from(panel.height / 2)),
    }
}

fn arrow_offset(anchor: CellRect, panel: CellRect, placement: Placement) -> ArrowOffset {
    match placement {
        // Centered variants point at the panel's own midpoint; start/end
        // variants point at the anchor's midpoint measured from the edge
        // the alignment hugs.
        Placement::Top | Placement::Bottom => {
            ArrowOffset::FromLeft(arrow_inset(panel.width, panel.width))
        }
        Placement::TopStart | Placement::BottomStart => {
            ArrowOffset::FromLeft(arrow_inset(anchor.width, panel.width))
        }
        Placement::TopEnd | Placement::BottomEnd => {
            ArrowOffset::FromRight(arrow_inset(anchor.width, panel.width))
        }
        Placement::Left | Placement::Right => {
            ArrowOffset::FromTop(arrow_inset(panel.height, panel.height))
        }
        Placement::LeftStart | Placement::RightStart => {
            ArrowOffset::FromTop(arrow_inset(anchor.height, panel.height))
        }
        Placement::LeftEnd | Placement::RightEnd => {
            ArrowOffset::FromBottom(arrow_inset(anchor.height, panel.height))
        }
    }
}

fn arrow_inset(span: u16, panel_span: u16) -> u16 {
    let max = panel_span.saturating_sub(ARROW_MARGIN);
    (span / 2).clamp(ARROW_MARGIN.min(max), max)
}
