use indexmap::IndexMap;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when both dimensions are finite and strictly positive.
    pub fn is_measurable(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn aspect_ratio(self) -> f32 {
        self.width / self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Midpoint of the given side.
    pub fn anchor(&self, side: Side) -> Point {
        let c = self.center();
        match side {
            Side::North => Point::new(c.x, self.y),
            Side::South => Point::new(c.x, self.bottom()),
            Side::East => Point::new(self.right(), c.y),
            Side::West => Point::new(self.x, c.y),
        }
    }

    /// Converts a box measured in device pixels into logical canvas units.
    pub fn unscale(&self, scale: f32) -> Rect {
        Rect::new(
            self.x / scale,
            self.y / scale,
            self.width / scale,
            self.height / scale,
        )
    }

    pub fn scaled(&self, scale: f32) -> Rect {
        Rect::new(
            self.x * scale,
            self.y * scale,
            self.width * scale,
            self.height * scale,
        )
    }

    pub fn on_boundary(&self, p: Point, eps: f32) -> bool {
        let within_x = p.x >= self.x - eps && p.x <= self.right() + eps;
        let within_y = p.y >= self.y - eps && p.y <= self.bottom() + eps;
        let on_vertical = (p.x - self.x).abs() <= eps || (p.x - self.right()).abs() <= eps;
        let on_horizontal = (p.y - self.y).abs() <= eps || (p.y - self.bottom()).abs() <= eps;
        within_x && within_y && (on_vertical || on_horizontal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    North,
    South,
    East,
    West,
}

/// Dominant direction of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchors {
    pub start: Point,
    pub end: Point,
    pub start_side: Side,
    pub end_side: Side,
    pub axis: Axis,
}

/// Routed connector for one edge, in logical canvas units.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePath {
    pub edge_id: String,
    pub points: [Point; 4],
    pub axis: Axis,
    pub label_position: Point,
    pub d: String,
}

impl EdgePath {
    pub fn start(&self) -> Point {
        self.points[0]
    }

    pub fn end(&self) -> Point {
        self.points[3]
    }

    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }

    pub fn length(&self) -> f32 {
        self.segments().map(|(a, b)| a.distance(b)).sum()
    }

    /// Point at fraction `t` (clamped to 0..=1) of the polyline length.
    pub fn point_at(&self, t: f32) -> Point {
        let total = self.length();
        if total <= f32::EPSILON {
            return self.start();
        }
        let mut remaining = t.clamp(0.0, 1.0) * total;
        for (a, b) in self.segments() {
            let len = a.distance(b);
            if remaining <= len {
                if len <= f32::EPSILON {
                    return a;
                }
                return a.lerp(b, remaining / len);
            }
            remaining -= len;
        }
        self.end()
    }
}

/// Computed paths keyed by edge id, in edge-list order.
pub type PathMap = IndexMap<String, EdgePath>;

/// Logical rectangles keyed by node id, as handed to the router.
pub type NodeRects = BTreeMap<String, Rect>;
