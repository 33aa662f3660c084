//! Points, sizes and rectangles, plus the edge routing math used to draw a
//! connector between two nodes: where it leaves and enters each node
//! boundary, the arrowhead at its target end and where its label sits.
//!
//! Every function here is total. Degenerate input (zero-length segments,
//! target points at a rectangle's center) resolves to a fixed fallback
//! instead of producing NaN.

use std::f32::consts::FRAC_PI_6;

/// Length of the two arrowhead sides.
pub const ARROWHEAD_SIZE: f32 = 10.0;

/// Distance between an edge and the center of its label.
pub const LABEL_OFFSET: f32 = 10.0;

/// Segments shorter than this do not get an arrowhead.
const DEGENERATE_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn x(self) -> f32 {
        self.x
    }

    pub fn y(self) -> f32 {
        self.y
    }

    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Euclidean distance from the origin.
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn width(self) -> f32 {
        self.width
    }

    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns a new Size with the maximum width and height of both sizes
    pub fn max(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }
}

/// An axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    origin: Point,
    size: Size,
}

impl Rect {
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn origin(self) -> Point {
        self.origin
    }

    pub fn size(self) -> Size {
        self.size
    }

    pub fn center(self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    /// Inclusive on all four edges.
    pub fn contains(self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.x <= self.origin.x + self.size.width
            && point.y >= self.origin.y
            && point.y <= self.origin.y + self.size.height
    }
}

/// Where the ray from the center of `rect` toward `toward` leaves the
/// rectangle.
pub fn boundary_intersection(rect: Rect, toward: Point) -> Point {
    let center = rect.center();
    let delta = toward.sub_point(center);

    if delta.x == 0.0 && delta.y == 0.0 {
        return center;
    }

    let half_width = rect.size.width / 2.0;
    let half_height = rect.size.height / 2.0;

    let t_horizontal = if delta.x != 0.0 {
        half_width / delta.x.abs()
    } else {
        f32::INFINITY
    };
    let t_vertical = if delta.y != 0.0 {
        half_height / delta.y.abs()
    } else {
        f32::INFINITY
    };

    center.add_point(delta.scale(t_horizontal.min(t_vertical)))
}

/// A filled triangle whose tip touches the end of an edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrowhead {
    pub tip: Point,
    pub left: Point,
    pub right: Point,
}

/// Arrowhead pointing at `to` for the segment `from -> to`.
///
/// The base corners are the reversed direction vector rotated by ±30° and
/// scaled to `size`. Returns `None` for segments too short to have a
/// direction.
pub fn arrowhead_triangle(from: Point, to: Point, size: f32) -> Option<Arrowhead> {
    let delta = to.sub_point(from);
    if delta.hypot() < DEGENERATE_EPSILON {
        return None;
    }

    let angle = delta.y.atan2(delta.x);
    let corner = |rotation: f32| {
        Point::new(
            to.x - size * (angle + rotation).cos(),
            to.y - size * (angle + rotation).sin(),
        )
    };

    Some(Arrowhead {
        tip: to,
        left: corner(-FRAC_PI_6),
        right: corner(FRAC_PI_6),
    })
}

/// Top-left corner for a label of `label_size` placed beside the segment
/// `from -> to`.
///
/// The label is centered on the segment midpoint pushed `offset` units
/// along the segment normal. A zero-length segment pushes it diagonally.
pub fn label_anchor(from: Point, to: Point, offset: f32, label_size: Size) -> Point {
    let mid = from.midpoint(to);
    let delta = to.sub_point(from);
    let normal = Point::new(-delta.y, delta.x);
    let norm = normal.hypot();

    let displacement = if norm > 0.0 {
        normal.scale(offset / norm)
    } else {
        Point::new(offset, offset)
    };

    Point::new(
        mid.x + displacement.x - label_size.width / 2.0,
        mid.y + displacement.y - label_size.height / 2.0,
    )
}

/// Everything a renderer needs to draw one straight connector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRoute {
    pub start: Point,
    pub end: Point,
    pub arrowhead: Option<Arrowhead>,
    pub label_origin: Option<Point>,
}

impl EdgeRoute {
    /// Routes an edge between the boundaries of two node rectangles, each
    /// clipped toward the other's center.
    pub fn between(source: Rect, target: Rect, label_size: Option<Size>) -> Self {
        let start = boundary_intersection(source, target.center());
        let end = boundary_intersection(target, source.center());

        Self {
            start,
            end,
            arrowhead: arrowhead_triangle(start, end, ARROWHEAD_SIZE),
            label_origin: label_size.map(|size| label_anchor(start, end, LABEL_OFFSET, size)),
        }
    }
}
