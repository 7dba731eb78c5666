//! Tolerance-based hit testing in canvas pixel space.
//!
//! Gestures arrive as pixel positions; every candidate is projected through
//! the viewport before measuring. Dangling way references are skipped, and
//! equal distances resolve to the lowest id because documents iterate in id
//! order.

use crate::graph::{GraphDocument, NodeId, WayId};
use crate::view::Viewport;
use kurbo::{Point, Rect};

/// Pick radius around nodes, in pixels.
pub const NODE_PICK_RADIUS: f64 = 15.0;

/// Pick tolerance around way segments, in pixels.
pub const WAY_PICK_TOLERANCE: f64 = 10.0;

/// A node matched by a pick, with its pixel distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeHit {
    pub id: NodeId,
    pub distance: f64,
}

/// A way matched by a pick, with the distance to its nearest segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WayHit {
    pub id: WayId,
    pub distance: f64,
}

/// Outcome of a combined node/way pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickResult {
    Node(NodeHit),
    Way(WayHit),
}

/// Distance from `p` to the segment `a`-`b`, clamping the projection onto
/// the segment to its endpoints.
pub fn point_to_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ap = p - a;
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq == 0.0 {
        return ap.hypot();
    }
    let t = (ap.dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot()
}

/// Nearest node within `radius` pixels of `cursor`, if any.
pub fn nearest_node(
    doc: &GraphDocument,
    view: &Viewport,
    cursor: Point,
    radius: f64,
) -> Option<NodeHit> {
    let mut best: Option<NodeHit> = None;
    for node in doc.nodes.values() {
        let canvas = view.world_to_canvas(node.position());
        let distance = cursor.distance(canvas);
        if distance < radius && best.is_none_or(|hit| distance < hit.distance) {
            best = Some(NodeHit { id: node.id, distance });
        }
    }
    best
}

/// Nearest way within `tolerance` pixels of `cursor`, measured against every
/// consecutive segment whose endpoints both resolve.
pub fn nearest_way(
    doc: &GraphDocument,
    view: &Viewport,
    cursor: Point,
    tolerance: f64,
) -> Option<WayHit> {
    let mut best: Option<WayHit> = None;
    for way in doc.ways.values() {
        if way.node_ids.len() < 2 {
            continue;
        }
        for pair in way.node_ids.windows(2) {
            let (Some(a), Some(b)) = (doc.node(pair[0]), doc.node(pair[1])) else {
                continue;
            };
            let pa = view.world_to_canvas(a.position());
            let pb = view.world_to_canvas(b.position());
            let distance = point_to_segment_distance(cursor, pa, pb);
            if distance < tolerance && best.is_none_or(|hit| distance < hit.distance) {
                best = Some(WayHit { id: way.id, distance });
            }
        }
    }
    best
}

/// Combined pick with the default tolerances: the node wins unless the way
/// is strictly closer.
pub fn pick(doc: &GraphDocument, view: &Viewport, cursor: Point) -> Option<PickResult> {
    let node = nearest_node(doc, view, cursor, NODE_PICK_RADIUS);
    let way = nearest_way(doc, view, cursor, WAY_PICK_TOLERANCE);
    match (node, way) {
        (Some(n), Some(w)) if w.distance < n.distance => Some(PickResult::Way(w)),
        (Some(n), _) => Some(PickResult::Node(n)),
        (None, Some(w)) => Some(PickResult::Way(w)),
        (None, None) => None,
    }
}

/// Closed polygons entirely inside a pixel rectangle.
///
/// Containment is total: every resolvable node of the way must fall inside.
/// Open ways and partial overlaps never qualify.
pub fn polygons_in_box(doc: &GraphDocument, view: &Viewport, rect: Rect) -> Vec<WayId> {
    let rect = Rect::new(
        rect.x0.min(rect.x1),
        rect.y0.min(rect.y1),
        rect.x0.max(rect.x1),
        rect.y0.max(rect.y1),
    );
    doc.ways
        .iter()
        .filter(|(_, way)| way.is_closed_polygon())
        .filter(|(_, way)| {
            way.node_ids
                .iter()
                .filter_map(|id| doc.node(*id))
                .all(|node| {
                    // Inclusive on all four edges: a node exactly on the box
                    // boundary still counts as contained.
                    let p = view.world_to_canvas(node.position());
                    p.x >= rect.x0 && p.x <= rect.x1 && p.y >= rect.y0 && p.y <= rect.y1
                })
        })
        .map(|(&id, _)| id)
        .collect()
}
