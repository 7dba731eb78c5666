//! Reversible mutations and the bounded undo/redo history.
//!
//! One enum variant per mutation kind, matched over in `apply`/`revert`.
//! Every variant owns deep copies of the data it needs to restore, taken at
//! construction; commands never hold references into the live document, so
//! a pending undo cannot be corrupted by later in-place edits.

use crate::graph::{GraphDocument, Node, NodeId, Tags, Way, WayId};
use kurbo::Point;

/// Default undo history cap. Exceeding it silently drops the oldest entry.
pub const DEFAULT_UNDO_CAP: usize = 50;

/// An object snapshot carried by add/delete commands.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphObject {
    Node(Node),
    Way(Way),
}

impl GraphObject {
    /// Id of the wrapped object.
    pub fn id(&self) -> u64 {
        match self {
            GraphObject::Node(node) => node.id,
            GraphObject::Way(way) => way.id,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            GraphObject::Node(_) => "node",
            GraphObject::Way(_) => "way",
        }
    }
}

/// Target of a tag edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagTarget {
    Node(NodeId),
    Way(WayId),
}

/// An opaque reversible mutation of the graph document.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Insert a new object; undo removes it.
    AddObject { object: GraphObject },
    /// Remove an object. Deleting a node cascades: every way snapshotted in
    /// `affected_ways` is removed too, and undo restores all of them as one
    /// logical operation.
    DeleteObject {
        object: GraphObject,
        affected_ways: Vec<Way>,
    },
    /// Replace an object's tag map; undo restores the old map verbatim.
    ModifyTags {
        target: TagTarget,
        old_tags: Tags,
        new_tags: Tags,
    },
    /// Move a node; undo restores the old position.
    MoveNode {
        id: NodeId,
        old_pos: Point,
        new_pos: Point,
    },
}

impl Command {
    /// Delete command for a node, snapshotting every way that references it.
    pub fn delete_node(doc: &GraphDocument, node: Node) -> Self {
        let affected_ways = doc
            .ways_referencing(node.id)
            .into_iter()
            .filter_map(|id| doc.way(id).cloned())
            .collect();
        Command::DeleteObject { object: GraphObject::Node(node), affected_ways }
    }

    /// Apply the mutation to the document.
    pub fn apply(&self, doc: &mut GraphDocument) {
        match self {
            Command::AddObject { object } => match object {
                GraphObject::Node(node) => doc.insert_node(node.clone()),
                GraphObject::Way(way) => doc.insert_way(way.clone()),
            },
            Command::DeleteObject { object, affected_ways } => match object {
                GraphObject::Node(node) => {
                    doc.remove_node(node.id);
                    for way in affected_ways {
                        doc.remove_way(way.id);
                    }
                }
                GraphObject::Way(way) => {
                    doc.remove_way(way.id);
                }
            },
            Command::ModifyTags { target, new_tags, .. } => {
                Self::set_tags(doc, *target, new_tags);
            }
            Command::MoveNode { id, new_pos, .. } => {
                if let Some(node) = doc.node_mut(*id) {
                    node.set_position(*new_pos);
                }
            }
        }
    }

    /// Undo the mutation, restoring the snapshotted state verbatim.
    pub fn revert(&self, doc: &mut GraphDocument) {
        match self {
            Command::AddObject { object } => match object {
                GraphObject::Node(node) => {
                    doc.remove_node(node.id);
                }
                GraphObject::Way(way) => {
                    doc.remove_way(way.id);
                }
            },
            Command::DeleteObject { object, affected_ways } => match object {
                GraphObject::Node(node) => {
                    doc.insert_node(node.clone());
                    for way in affected_ways {
                        doc.insert_way(way.clone());
                    }
                }
                GraphObject::Way(way) => doc.insert_way(way.clone()),
            },
            Command::ModifyTags { target, old_tags, .. } => {
                Self::set_tags(doc, *target, old_tags);
            }
            Command::MoveNode { id, old_pos, .. } => {
                if let Some(node) = doc.node_mut(*id) {
                    node.set_position(*old_pos);
                }
            }
        }
    }

    fn set_tags(doc: &mut GraphDocument, target: TagTarget, tags: &Tags) {
        match target {
            TagTarget::Node(id) => {
                if let Some(node) = doc.node_mut(id) {
                    node.tags = tags.clone();
                }
            }
            TagTarget::Way(id) => {
                if let Some(way) = doc.way_mut(id) {
                    way.tags = tags.clone();
                }
            }
        }
    }

    /// Human-readable description, for logs and history UIs.
    pub fn label(&self) -> String {
        match self {
            Command::AddObject { object } => {
                format!("add {} #{}", object.kind(), object.id())
            }
            Command::DeleteObject { object, .. } => {
                format!("delete {} #{}", object.kind(), object.id())
            }
            Command::ModifyTags { target: TagTarget::Node(id), .. } => {
                format!("edit node tags #{id}")
            }
            Command::ModifyTags { target: TagTarget::Way(id), .. } => {
                format!("edit way tags #{id}")
            }
            Command::MoveNode { id, .. } => format!("move node #{id}"),
        }
    }
}

/// Bounded undo/redo stacks over [`Command`] values.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    cap: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// History with the default cap.
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_UNDO_CAP)
    }

    /// History with a custom undo cap.
    pub fn with_cap(cap: usize) -> Self {
        Self { undo_stack: Vec::new(), redo_stack: Vec::new(), cap }
    }

    /// Apply a command and push it onto the undo stack. Any pending redo
    /// entries are discarded; past the cap the oldest undo entry is evicted
    /// and becomes permanently unrecoverable.
    pub fn execute(&mut self, command: Command, doc: &mut GraphDocument) {
        log::debug!("execute: {}", command.label());
        command.apply(doc);
        self.record(command);
    }

    /// Push an already-applied command (live drags mutate the node in place
    /// and only record the move on release).
    pub fn record(&mut self, command: Command) {
        self.undo_stack.push(command);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.cap {
            log::trace!("undo cap {} reached, evicting oldest entry", self.cap);
            self.undo_stack.remove(0);
        }
    }

    /// Undo the most recent command. No-op on an empty stack.
    pub fn undo(&mut self, doc: &mut GraphDocument) -> bool {
        let Some(command) = self.undo_stack.pop() else {
            return false;
        };
        log::debug!("undo: {}", command.label());
        command.revert(doc);
        self.redo_stack.push(command);
        true
    }

    /// Re-apply the most recently undone command. No-op on an empty stack;
    /// does not clear the redo stack itself.
    pub fn redo(&mut self, doc: &mut GraphDocument) -> bool {
        let Some(command) = self.redo_stack.pop() else {
            return false;
        };
        log::debug!("redo: {}", command.label());
        command.apply(doc);
        self.undo_stack.push(command);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Current undo stack depth.
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Drop both stacks (document load, clear-all).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
