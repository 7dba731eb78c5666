//! Graph document: nodes, ways, relations, and structural queries.
//!
//! The document owns every object; ways reference nodes by id only. Dangling
//! references are tolerated and skipped when geometry is derived. Mutations
//! go through [`crate::command::History`] by contract so every edit stays
//! undoable; the primitives here are the raw inserts and removals those
//! commands use.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type NodeId = u64;
pub type WayId = u64;
pub type RelationId = u64;

/// String key/value tag map. Ordered so serialization is deterministic.
pub type Tags = BTreeMap<String, String>;

/// Reserved tag key for editor-local state; never persisted.
pub const MODIFIED_TAG: &str = "modified";

/// A point entity with geographic position and tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
    /// Transient edit marker; not part of the persisted format.
    #[serde(skip)]
    pub modified: bool,
}

impl Node {
    /// Create an untagged node at the given position.
    pub fn new(id: NodeId, lon: f64, lat: f64) -> Self {
        Self { id, lon, lat, tags: Tags::new(), modified: false }
    }

    /// Position as a lon/lat point.
    pub fn position(&self) -> Point {
        Point::new(self.lon, self.lat)
    }

    /// Move the node to a lon/lat point.
    pub fn set_position(&mut self, position: Point) {
        self.lon = position.x;
        self.lat = position.y;
    }
}

/// An ordered sequence of node references with tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Way {
    pub id: WayId,
    /// Referenced node ids in drawing order. A repeat is only meaningful as
    /// first == last, which closes the way.
    #[serde(rename = "nodes")]
    pub node_ids: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

impl Way {
    /// Create an untagged way over the given node ids.
    pub fn new(id: WayId, node_ids: Vec<NodeId>) -> Self {
        Self { id, node_ids, tags: Tags::new() }
    }

    /// A way is a closed polygon iff it has at least 4 references and its
    /// first id equals its last.
    pub fn is_closed_polygon(&self) -> bool {
        self.node_ids.len() >= 4 && self.node_ids.first() == self.node_ids.last()
    }
}

/// Kind of object a relation member points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Node,
    Way,
    Relation,
}

/// One entry of a relation's member list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationMember {
    pub kind: MemberKind,
    pub member: u64,
    #[serde(default)]
    pub role: String,
}

/// Stored but not exercised by the editing core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    #[serde(default)]
    pub members: Vec<RelationMember>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

/// The node/way/relation store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: BTreeMap<NodeId, Node>,
    pub ways: BTreeMap<WayId, Way>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relations: BTreeMap<RelationId, Relation>,
}

impl GraphDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the document holds no objects at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.ways.is_empty() && self.relations.is_empty()
    }

    /// Next free node id: `max + 1`, or 1 for an empty collection. Ids are
    /// never reused while the object exists.
    pub fn next_node_id(&self) -> NodeId {
        self.nodes.keys().next_back().map_or(1, |max| max + 1)
    }

    /// Next free way id, same allocation rule as [`Self::next_node_id`].
    pub fn next_way_id(&self) -> WayId {
        self.ways.keys().next_back().map_or(1, |max| max + 1)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn way(&self, id: WayId) -> Option<&Way> {
        self.ways.get(&id)
    }

    pub fn way_mut(&mut self, id: WayId) -> Option<&mut Way> {
        self.ways.get_mut(&id)
    }

    /// Insert or replace a node.
    pub fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id, node);
    }

    /// Remove a node, returning it if present. Does not cascade; the delete
    /// command handles referencing ways.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    /// Insert or replace a way.
    pub fn insert_way(&mut self, way: Way) {
        self.ways.insert(way.id, way);
    }

    /// Remove a way, returning it if present.
    pub fn remove_way(&mut self, id: WayId) -> Option<Way> {
        self.ways.remove(&id)
    }

    /// Ids of every way whose reference list contains `node_id`.
    pub fn ways_referencing(&self, node_id: NodeId) -> Vec<WayId> {
        self.ways
            .iter()
            .filter(|(_, way)| way.node_ids.contains(&node_id))
            .map(|(&id, _)| id)
            .collect()
    }

    /// Resolve a way's geometry as lon/lat points, skipping dangling
    /// references. A way with no resolvable nodes yields no geometry.
    pub fn way_points(&self, way: &Way) -> Vec<Point> {
        way.node_ids
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .map(Node::position)
            .collect()
    }

    /// Bounding box over all node positions (x = lon, y = lat).
    pub fn bounds(&self) -> Option<Rect> {
        let mut nodes = self.nodes.values();
        let first = nodes.next()?;
        let mut rect = Rect::from_points(first.position(), first.position());
        for node in nodes {
            rect = rect.union_pt(node.position());
        }
        Some(rect)
    }

    /// Drop every object.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.ways.clear();
        self.relations.clear();
    }

    /// Copy with the reserved `modified` tag key stripped everywhere, which
    /// is the shape that may be persisted.
    pub fn sanitized(&self) -> Self {
        let mut doc = self.clone();
        for node in doc.nodes.values_mut() {
            node.tags.remove(MODIFIED_TAG);
            node.modified = false;
        }
        for way in doc.ways.values_mut() {
            way.tags.remove(MODIFIED_TAG);
        }
        doc
    }

    /// Serialize the persistable shape to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.sanitized())
    }

    /// Deserialize a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
