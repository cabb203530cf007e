use super::{Anchors, Axis, Rect, Side};

/// Picks the connection sides for an edge from `from` to `to`.
///
/// The connection is horizontal only when the horizontal center displacement
/// strictly exceeds the vertical one; equal magnitudes route vertically. Which side
/// of a card an arrow leaves from depends on this, so the comparison must stay
/// strict.
pub fn choose_anchors(from: &Rect, to: &Rect) -> Anchors {
    let from_center = from.center();
    let to_center = to.center();
    let dx = to_center.x - from_center.x;
    let dy = to_center.y - from_center.y;

    if dx.abs() > dy.abs() {
        let (start_side, end_side) = if dx > 0.0 {
            (Side::East, Side::West)
        } else {
            (Side::West, Side::East)
        };
        Anchors {
            start: from.anchor(start_side),
            end: to.anchor(end_side),
            start_side,
            end_side,
            axis: Axis::Horizontal,
        }
    } else {
        let (start_side, end_side) = if dy > 0.0 {
            (Side::South, Side::North)
        } else {
            (Side::North, Side::South)
        };
        Anchors {
            start: from.anchor(start_side),
            end: to.anchor(end_side),
            start_side,
            end_side,
            axis: Axis::Vertical,
        }
    }
}
