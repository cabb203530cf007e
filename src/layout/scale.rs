use super::{Point, Size};

/// Uniform factor that fits `canvas` inside `container`, shrunk by `margin`.
///
/// Returns `None` while the container has no measurable size so callers can
/// retry instead of producing a zero or infinite scale.
pub fn compute_scale(container: Size, canvas: Size, margin: f32) -> Option<f32> {
    if !container.is_measurable() || !canvas.is_measurable() {
        return None;
    }
    let fitted = if container.aspect_ratio() > canvas.aspect_ratio() {
        // Wider than the canvas: height is the binding dimension.
        container.height / canvas.height
    } else {
        container.width / canvas.width
    };
    let scale = fitted * margin;
    (scale.is_finite() && scale > 0.0).then_some(scale)
}

/// Top-left offset that centers the scaled canvas in the container.
pub fn canvas_origin(container: Size, canvas: Size, scale: f32) -> Point {
    Point::new(
        (container.width - canvas.width * scale) / 2.0,
        (container.height - canvas.height * scale) / 2.0,
    )
}
