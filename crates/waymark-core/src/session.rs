//! Editing session: one document, one view, one undo history.
//!
//! Groups all mutable editor state into a single value so independent
//! sessions can coexist (and be tested) without shared globals. Gesture
//! handlers take canvas pixel positions; everything else is geographic.
//! Multi-step gestures (way creation, node drag, box select, measure) keep
//! their pending state here and can be cancelled without touching the
//! undo/redo stacks.

use crate::command::{Command, GraphObject, History, TagTarget};
use crate::graph::{GraphDocument, Node, NodeId, Tags, Way, WayId};
use crate::grid::GridSettings;
use crate::projection::{SceneOrigin, ground_distance_m, scene_to_geographic};
use crate::query::{self, NODE_PICK_RADIUS, PickResult};
use crate::selection::{SelectMode, Selection};
use crate::view::Viewport;
use kurbo::{Point, Rect};

/// In-flight node drag.
#[derive(Debug, Clone, Copy)]
struct NodeDrag {
    id: NodeId,
    start: Point,
}

/// In-flight box selection, in canvas pixels.
#[derive(Debug, Clone, Copy)]
struct BoxSelect {
    start: Point,
    current: Point,
}

/// All state of one editing session.
#[derive(Debug, Clone)]
pub struct EditorSession {
    pub document: GraphDocument,
    pub view: Viewport,
    pub history: History,
    pub selection: Selection,
    pub grid: GridSettings,
    /// Anchor of the scene frame used for coordinate entry and display.
    pub scene_origin: SceneOrigin,
    pending_way: Vec<NodeId>,
    drag: Option<NodeDrag>,
    box_select: Option<BoxSelect>,
    measure_points: Vec<Point>,
    measure_legs: Vec<f64>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    /// Session over an empty document.
    pub fn new() -> Self {
        Self::with_document(GraphDocument::new())
    }

    /// Session over an existing document, with fresh history and selection.
    pub fn with_document(document: GraphDocument) -> Self {
        Self {
            document,
            view: Viewport::new(),
            history: History::new(),
            selection: Selection::new(),
            grid: GridSettings::default(),
            scene_origin: SceneOrigin::default(),
            pending_way: Vec::new(),
            drag: None,
            box_select: None,
            measure_points: Vec::new(),
            measure_legs: Vec::new(),
        }
    }

    /// Replace the document, dropping history, selection, and gestures.
    pub fn replace_document(&mut self, document: GraphDocument) {
        self.document = document;
        self.history.clear();
        self.selection.clear();
        self.pending_way.clear();
        self.drag = None;
        self.box_select = None;
        self.clear_measurement();
    }

    /// Undo the most recent command. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.document)
    }

    /// Redo the most recently undone command.
    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.document)
    }

    /// Center and scale the view on the document. No-op without nodes.
    pub fn fit_to_window(&mut self) -> bool {
        match self.document.bounds() {
            Some(bounds) => {
                self.view.fit_to_window(bounds);
                true
            }
            None => false,
        }
    }

    /// Anchor the scene frame at the current view center.
    pub fn use_center_as_scene_origin(&mut self) {
        self.scene_origin = SceneOrigin::new(self.view.center.x, self.view.center.y);
    }

    // --- object creation -------------------------------------------------

    /// Add a node at a geographic position, snapping to the grid when
    /// enabled. Id allocation happens here, before the command is built.
    pub fn add_node(&mut self, lon: f64, lat: f64) -> NodeId {
        let mut position = Point::new(lon, lat);
        if self.grid.snap_enabled {
            position = self.grid.snap(position);
        }
        let id = self.document.next_node_id();
        let node = Node::new(id, position.x, position.y);
        self.history
            .execute(Command::AddObject { object: GraphObject::Node(node) }, &mut self.document);
        id
    }

    /// Add a node given scene-frame meters around the session's origin.
    pub fn add_node_scene(&mut self, scene: Point) -> NodeId {
        let geo = scene_to_geographic(scene, self.scene_origin);
        self.add_node(geo.x, geo.y)
    }

    // --- way creation gesture --------------------------------------------

    /// Extend the pending way at a canvas position: reuse the nearest
    /// existing node within pick radius, else create a new one (undoably).
    pub fn extend_pending_way(&mut self, cursor: Point) -> NodeId {
        if let Some(hit) = query::nearest_node(&self.document, &self.view, cursor, NODE_PICK_RADIUS)
        {
            if !self.pending_way.contains(&hit.id) {
                self.pending_way.push(hit.id);
            }
            hit.id
        } else {
            let world = self.view.canvas_to_world(cursor);
            let id = self.add_node(world.x, world.y);
            self.pending_way.push(id);
            id
        }
    }

    /// Node ids collected by the creation gesture so far.
    pub fn pending_way(&self) -> &[NodeId] {
        &self.pending_way
    }

    /// Finish the gesture as an open way. Needs at least two references.
    pub fn finish_way(&mut self) -> Option<WayId> {
        if self.pending_way.len() < 2 {
            return None;
        }
        let way = Way::new(self.document.next_way_id(), std::mem::take(&mut self.pending_way));
        self.insert_way(way)
    }

    /// Finish the gesture as a closed polygon: the first reference is
    /// repeated as the last and the way is tagged `area=yes`. Needs at
    /// least three distinct references.
    pub fn finish_polygon(&mut self) -> Option<WayId> {
        if self.pending_way.len() < 3 {
            return None;
        }
        let mut node_ids = std::mem::take(&mut self.pending_way);
        if node_ids.first() != node_ids.last() {
            node_ids.push(node_ids[0]);
        }
        let mut way = Way::new(self.document.next_way_id(), node_ids);
        way.tags.insert("area".into(), "yes".into());
        self.insert_way(way)
    }

    /// Abort the gesture. Nodes already created stay (they were committed
    /// through commands and remain undoable individually).
    pub fn cancel_pending_way(&mut self) {
        self.pending_way.clear();
    }

    fn insert_way(&mut self, way: Way) -> Option<WayId> {
        let id = way.id;
        self.history
            .execute(Command::AddObject { object: GraphObject::Way(way) }, &mut self.document);
        Some(id)
    }

    // --- node drag gesture -----------------------------------------------

    /// Start dragging a node. Fails if the node does not exist.
    pub fn begin_node_drag(&mut self, id: NodeId) -> bool {
        match self.document.node(id) {
            Some(node) => {
                self.drag = Some(NodeDrag { id, start: node.position() });
                true
            }
            None => false,
        }
    }

    /// Track the drag: the node follows the cursor (grid-snapped when
    /// enabled). Transient in-place write; the command comes at commit.
    pub fn update_node_drag(&mut self, cursor: Point) {
        let Some(drag) = self.drag else { return };
        let mut world = self.view.canvas_to_world(cursor);
        if self.grid.snap_enabled {
            world = self.grid.snap(world);
        }
        if let Some(node) = self.document.node_mut(drag.id) {
            node.set_position(world);
        }
    }

    /// End the drag, recording one MoveNode command for the whole gesture.
    /// Returns false (and records nothing) if the node never moved.
    pub fn commit_node_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let Some(node) = self.document.node(drag.id) else {
            return false;
        };
        let new_pos = node.position();
        if new_pos == drag.start {
            return false;
        }
        self.history.record(Command::MoveNode { id: drag.id, old_pos: drag.start, new_pos });
        true
    }

    /// Abort the drag, restoring the start position without touching the
    /// undo stack.
    pub fn cancel_node_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            if let Some(node) = self.document.node_mut(drag.id) {
                node.set_position(drag.start);
            }
        }
    }

    /// Move a node by a lon/lat delta as one undoable step (keyboard nudge).
    pub fn nudge_node(&mut self, id: NodeId, dlon: f64, dlat: f64) -> bool {
        let Some(node) = self.document.node(id) else {
            return false;
        };
        let old_pos = node.position();
        let new_pos = Point::new(old_pos.x + dlon, old_pos.y + dlat);
        self.history.execute(Command::MoveNode { id, old_pos, new_pos }, &mut self.document);
        true
    }

    // --- selection -------------------------------------------------------

    /// Resolve a click into the selection. Closed polygons honor the
    /// shift/ctrl set semantics; a miss with no modifier clears everything.
    pub fn pick_at(&mut self, cursor: Point, shift: bool, ctrl: bool) {
        let mode = SelectMode::from_modifiers(shift, ctrl);
        match query::pick(&self.document, &self.view, cursor) {
            Some(PickResult::Node(hit)) => self.selection.select_node(hit.id),
            Some(PickResult::Way(hit)) => {
                let closed = self.document.way(hit.id).is_some_and(Way::is_closed_polygon);
                if closed {
                    self.selection.select_polygon(hit.id, mode);
                } else {
                    self.selection.select_open_way(hit.id);
                }
            }
            None => {
                if mode == SelectMode::Replace {
                    self.selection.clear();
                }
            }
        }
    }

    /// Put every closed polygon into the multi-selection.
    pub fn select_all_polygons(&mut self) {
        self.selection.ways = self
            .document
            .ways
            .iter()
            .filter(|(_, way)| way.is_closed_polygon())
            .map(|(&id, _)| id)
            .collect();
    }

    // --- box selection gesture -------------------------------------------

    /// Start a box selection at a canvas position.
    pub fn begin_box_select(&mut self, cursor: Point) {
        self.box_select = Some(BoxSelect { start: cursor, current: cursor });
    }

    /// Track the box selection.
    pub fn update_box_select(&mut self, cursor: Point) {
        if let Some(select) = &mut self.box_select {
            select.current = cursor;
        }
    }

    /// Current marquee rectangle, for the renderer.
    pub fn box_select_rect(&self) -> Option<Rect> {
        self.box_select.map(|b| Rect::from_points(b.start, b.current))
    }

    /// Finish the box selection, combining fully-contained closed polygons
    /// with the selection set. Returns how many ways matched.
    pub fn finish_box_select(&mut self, shift: bool, ctrl: bool) -> usize {
        let Some(select) = self.box_select.take() else {
            return 0;
        };
        let rect = Rect::from_points(select.start, select.current);
        let picked = query::polygons_in_box(&self.document, &self.view, rect);
        let matched = picked.len();
        self.selection.apply_box(picked, SelectMode::from_modifiers(shift, ctrl));
        matched
    }

    /// Abort the box selection, leaving the selection set untouched.
    pub fn cancel_box_select(&mut self) {
        self.box_select = None;
    }

    // --- deletion and tag edits ------------------------------------------

    /// Delete everything selected. A focused node cascades through its
    /// referencing ways as one command; each multi-selected way becomes its
    /// own command, undoable one at a time in reverse order. Returns the
    /// number of commands executed.
    pub fn delete_selected(&mut self) -> usize {
        let mut executed = 0;
        if let Some(id) = self.selection.node.take() {
            if let Some(node) = self.document.node(id).cloned() {
                let command = Command::delete_node(&self.document, node);
                self.history.execute(command, &mut self.document);
                executed += 1;
            }
        }
        if let Some(id) = self.selection.way.take() {
            if let Some(way) = self.document.way(id).cloned() {
                self.history.execute(
                    Command::DeleteObject {
                        object: GraphObject::Way(way),
                        affected_ways: Vec::new(),
                    },
                    &mut self.document,
                );
                executed += 1;
            }
        }
        for id in std::mem::take(&mut self.selection.ways) {
            // The focused way may also sit in the set; it is already gone.
            if let Some(way) = self.document.way(id).cloned() {
                self.history.execute(
                    Command::DeleteObject {
                        object: GraphObject::Way(way),
                        affected_ways: Vec::new(),
                    },
                    &mut self.document,
                );
                executed += 1;
            }
        }
        executed
    }

    /// Replace an object's tags as one undoable step. The old map is
    /// snapshotted from the document at call time.
    pub fn set_tags(&mut self, target: TagTarget, new_tags: Tags) -> bool {
        let old_tags = match target {
            TagTarget::Node(id) => match self.document.node(id) {
                Some(node) => node.tags.clone(),
                None => return false,
            },
            TagTarget::Way(id) => match self.document.way(id) {
                Some(way) => way.tags.clone(),
                None => return false,
            },
        };
        self.history
            .execute(Command::ModifyTags { target, old_tags, new_tags }, &mut self.document);
        true
    }

    // --- measurement -----------------------------------------------------

    /// Append a geographic point to the measurement, returning the running
    /// total in meters.
    pub fn add_measure_point(&mut self, geo: Point) -> f64 {
        if let Some(&last) = self.measure_points.last() {
            self.measure_legs.push(ground_distance_m(last, geo));
        }
        self.measure_points.push(geo);
        self.measure_total()
    }

    /// Sum of all measured legs, in meters.
    pub fn measure_total(&self) -> f64 {
        self.measure_legs.iter().sum()
    }

    /// Measured points so far.
    pub fn measure_points(&self) -> &[Point] {
        &self.measure_points
    }

    /// Per-leg distances in meters.
    pub fn measure_legs(&self) -> &[f64] {
        &self.measure_legs
    }

    /// Drop the measurement.
    pub fn clear_measurement(&mut self) {
        self.measure_points.clear();
        self.measure_legs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::METERS_PER_DEGREE_LAT;
    use crate::view::ProjectionFrame;

    fn session() -> EditorSession {
        let mut session = EditorSession::new();
        session.view.set_frame(ProjectionFrame::Geographic, None);
        session.view.set_canvas_size(800.0, 600.0);
        session.view.center = Point::ZERO;
        session.view.set_scale(1000.0);
        session
    }

    #[test]
    fn test_add_node_allocates_ids() {
        let mut s = session();
        assert_eq!(s.add_node(1.0, 2.0), 1);
        assert_eq!(s.add_node(3.0, 4.0), 2);
        s.undo();
        // Undo removed node 2, so its id is free again.
        assert_eq!(s.add_node(5.0, 6.0), 2);
    }

    #[test]
    fn test_way_creation_reuses_nearby_nodes() {
        let mut s = session();
        let existing = s.add_node(0.0, 0.0);
        let at_existing = s.view.world_to_canvas(Point::ZERO);

        let first = s.extend_pending_way(at_existing);
        assert_eq!(first, existing);
        // Clicking the same node again does not duplicate the reference.
        s.extend_pending_way(at_existing);
        assert_eq!(s.pending_way(), &[existing]);

        let far = s.view.world_to_canvas(Point::new(0.1, 0.0));
        let created = s.extend_pending_way(far);
        assert_ne!(created, existing);
        assert!(s.document.node(created).is_some());

        let way = s.finish_way().unwrap();
        assert_eq!(s.document.way(way).unwrap().node_ids, vec![existing, created]);
        assert!(s.pending_way().is_empty());
    }

    #[test]
    fn test_finish_way_needs_two_references() {
        let mut s = session();
        let only = s.view.world_to_canvas(Point::new(0.05, 0.05));
        s.extend_pending_way(only);
        assert_eq!(s.finish_way(), None);
    }

    #[test]
    fn test_polygon_closes_and_gets_area_tag() {
        let mut s = session();
        for world in [Point::new(0.0, 0.0), Point::new(0.05, 0.0), Point::new(0.05, 0.05)] {
            let cursor = s.view.world_to_canvas(world);
            s.extend_pending_way(cursor);
        }
        let way_id = s.finish_polygon().unwrap();
        let way = s.document.way(way_id).unwrap();
        assert!(way.is_closed_polygon());
        assert_eq!(way.node_ids.first(), way.node_ids.last());
        assert_eq!(way.tags.get("area").map(String::as_str), Some("yes"));
    }

    #[test]
    fn test_cancel_pending_way_keeps_history_intact() {
        let mut s = session();
        s.extend_pending_way(Point::new(100.0, 100.0));
        s.extend_pending_way(Point::new(300.0, 300.0));
        let undo_before = s.history.undo_len();
        s.cancel_pending_way();
        assert!(s.pending_way().is_empty());
        assert_eq!(s.history.undo_len(), undo_before);
        assert_eq!(s.finish_way(), None);
    }

    #[test]
    fn test_drag_commits_one_command() {
        let mut s = session();
        let id = s.add_node(0.0, 0.0);
        assert!(s.begin_node_drag(id));
        s.update_node_drag(Point::new(500.0, 300.0));
        s.update_node_drag(Point::new(550.0, 250.0));
        assert!(s.commit_node_drag());

        let moved = s.document.node(id).unwrap().position();
        assert!((moved.x - 0.15).abs() < 1e-9);
        assert!((moved.y - 0.05).abs() < 1e-9);

        // One undo restores the start position across all drag updates.
        assert!(s.undo());
        assert_eq!(s.document.node(id).unwrap().position(), Point::ZERO);
    }

    #[test]
    fn test_drag_cancel_restores_position() {
        let mut s = session();
        let id = s.add_node(0.0, 0.0);
        let undo_before = s.history.undo_len();
        s.begin_node_drag(id);
        s.update_node_drag(Point::new(700.0, 100.0));
        s.cancel_node_drag();
        assert_eq!(s.document.node(id).unwrap().position(), Point::ZERO);
        assert_eq!(s.history.undo_len(), undo_before);
    }

    #[test]
    fn test_unmoved_drag_records_nothing() {
        let mut s = session();
        let id = s.add_node(0.0, 0.0);
        let undo_before = s.history.undo_len();
        s.begin_node_drag(id);
        assert!(!s.commit_node_drag());
        assert_eq!(s.history.undo_len(), undo_before);
    }

    #[test]
    fn test_delete_selected_ways_one_command_each() {
        let mut s = session();
        let a = s.add_node(0.0, 0.0);
        let b = s.add_node(0.01, 0.0);
        let c = s.add_node(0.01, 0.01);
        for nodes in [vec![a, b, c, a], vec![b, c, a, b]] {
            let id = s.document.next_way_id();
            s.history.execute(
                Command::AddObject { object: GraphObject::Way(Way::new(id, nodes)) },
                &mut s.document,
            );
        }
        s.selection.ways = [1, 2].into_iter().collect();

        assert_eq!(s.delete_selected(), 2);
        assert!(s.document.ways.is_empty());
        assert!(s.selection.is_empty());

        // Each way comes back one undo at a time, newest first.
        assert!(s.undo());
        assert_eq!(s.document.ways.len(), 1);
        assert!(s.document.way(2).is_some());
        assert!(s.undo());
        assert!(s.document.way(1).is_some());
    }

    #[test]
    fn test_delete_focused_node_cascades() {
        let mut s = session();
        let a = s.add_node(0.0, 0.0);
        let b = s.add_node(0.01, 0.0);
        s.history.execute(
            Command::AddObject { object: GraphObject::Way(Way::new(1, vec![a, b])) },
            &mut s.document,
        );
        s.selection.select_node(a);

        assert_eq!(s.delete_selected(), 1);
        assert!(s.document.node(a).is_none());
        assert!(s.document.way(1).is_none());
        assert!(s.undo());
        assert!(s.document.node(a).is_some());
        assert!(s.document.way(1).is_some());
    }

    #[test]
    fn test_pick_and_clear() {
        let mut s = session();
        let id = s.add_node(0.0, 0.0);
        let at_node = s.view.world_to_canvas(Point::ZERO);
        s.pick_at(at_node, false, false);
        assert_eq!(s.selection.node, Some(id));

        // Miss with no modifier clears; with a modifier it keeps.
        s.pick_at(Point::new(0.0, 0.0), false, true);
        assert_eq!(s.selection.node, Some(id));
        s.pick_at(Point::new(0.0, 0.0), false, false);
        assert!(s.selection.is_empty());
    }

    #[test]
    fn test_box_select_lifecycle() {
        let mut s = session();
        for (lon, lat) in [(0.01, 0.01), (0.02, 0.01), (0.02, 0.02), (0.01, 0.02)] {
            s.add_node(lon, lat);
        }
        s.history.execute(
            Command::AddObject { object: GraphObject::Way(Way::new(1, vec![1, 2, 3, 4, 1])) },
            &mut s.document,
        );

        let a = s.view.world_to_canvas(Point::new(0.0, 0.0));
        let b = s.view.world_to_canvas(Point::new(0.03, 0.03));
        s.begin_box_select(a);
        s.update_box_select(b);
        assert!(s.box_select_rect().is_some());
        assert_eq!(s.finish_box_select(false, false), 1);
        assert!(s.selection.ways.contains(&1));
        assert!(s.box_select_rect().is_none());

        // Cancelling a fresh box leaves the previous result alone.
        s.begin_box_select(a);
        s.cancel_box_select();
        assert!(s.selection.ways.contains(&1));
    }

    #[test]
    fn test_set_tags_is_undoable() {
        let mut s = session();
        let id = s.add_node(0.0, 0.0);
        let mut tags = Tags::new();
        tags.insert("name".into(), "well".into());
        assert!(s.set_tags(TagTarget::Node(id), tags));
        assert_eq!(s.document.node(id).unwrap().tags.len(), 1);
        s.undo();
        assert!(s.document.node(id).unwrap().tags.is_empty());
        assert!(!s.set_tags(TagTarget::Way(99), Tags::new()));
    }

    #[test]
    fn test_scene_frame_node_entry() {
        let mut s = session();
        s.scene_origin = SceneOrigin::new(116.404, 39.915);
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 8.0),
            Point::new(0.0, 8.0),
        ];
        let ids: Vec<_> = corners.iter().map(|&p| s.add_node_scene(p)).collect();
        assert_eq!(s.document.nodes.len(), 4);

        let lon0 = s.document.node(ids[0]).unwrap().lon;
        let lon1 = s.document.node(ids[1]).unwrap().lon;
        let expected =
            10.0 / (METERS_PER_DEGREE_LAT * (39.915f64).to_radians().cos());
        assert!(((lon1 - lon0) - expected).abs() < 1e-12);
        // Roughly 0.0001166 degrees for a 10 m edge at this latitude.
        assert!((lon1 - lon0) > 1.0e-4 && (lon1 - lon0) < 1.3e-4);
    }

    #[test]
    fn test_measurement() {
        let mut s = session();
        s.add_measure_point(Point::new(0.0, 0.0));
        let total = s.add_measure_point(Point::new(0.0, 1.0));
        assert!((total - METERS_PER_DEGREE_LAT).abs() < 1e-6);
        let total = s.add_measure_point(Point::new(0.0, 2.0));
        assert!((total - 2.0 * METERS_PER_DEGREE_LAT).abs() < 1e-6);
        assert_eq!(s.measure_legs().len(), 2);
        s.clear_measurement();
        assert!(s.measure_points().is_empty());
        assert_eq!(s.measure_total(), 0.0);
    }

    #[test]
    fn test_select_all_polygons() {
        let mut s = session();
        for (lon, lat) in [(0.0, 0.0), (0.01, 0.0), (0.01, 0.01)] {
            s.add_node(lon, lat);
        }
        s.document.insert_way(Way::new(1, vec![1, 2, 3, 1]));
        s.document.insert_way(Way::new(2, vec![1, 2]));
        s.select_all_polygons();
        assert_eq!(s.selection.ways.iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_replace_document_resets_session() {
        let mut s = session();
        s.add_node(0.0, 0.0);
        s.add_measure_point(Point::ZERO);
        s.selection.select_node(1);

        let mut doc = GraphDocument::new();
        doc.insert_node(Node::new(5, 1.0, 1.0));
        s.replace_document(doc);
        assert!(s.document.node(5).is_some());
        assert!(!s.undo());
        assert!(s.selection.is_empty());
        assert!(s.measure_points().is_empty());
    }

    #[test]
    fn test_grid_snap_applies_to_new_nodes() {
        let mut s = session();
        s.grid.snap_enabled = true;
        s.grid.spacing_m = 100.0;
        let id = s.add_node(30.0 / METERS_PER_DEGREE_LAT, 0.0);
        let node = s.document.node(id).unwrap();
        assert!(node.lon.abs() < 1e-12);
        assert!(node.lat.abs() < 1e-12);
    }
}
