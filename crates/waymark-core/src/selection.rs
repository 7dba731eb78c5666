//! Selection state and multi-select set operations.

use crate::graph::{NodeId, WayId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a pick or box result combines with the existing selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectMode {
    /// Replace the selection with the match (plain click/box).
    #[default]
    Replace,
    /// Remove the match from the selection (shift).
    Subtract,
    /// Add the match to the selection (ctrl). No toggle.
    Extend,
}

impl SelectMode {
    /// Map keyboard modifiers to a mode. Shift wins over ctrl, as in the
    /// original gesture handling.
    pub fn from_modifiers(shift: bool, ctrl: bool) -> Self {
        if shift {
            SelectMode::Subtract
        } else if ctrl {
            SelectMode::Extend
        } else {
            SelectMode::Replace
        }
    }
}

/// What the user currently has selected.
///
/// A focused node and a focused way are mutually exclusive; the polygon set
/// holds multi-selected closed ways and survives node focus changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Focused node, if any.
    pub node: Option<NodeId>,
    /// Focused way, if any.
    pub way: Option<WayId>,
    /// Multi-selected closed polygons.
    pub ways: BTreeSet<WayId>,
}

impl Selection {
    /// Empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.node.is_none() && self.way.is_none() && self.ways.is_empty()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.node = None;
        self.way = None;
        self.ways.clear();
    }

    /// Focus a node, dropping any focused way.
    pub fn select_node(&mut self, id: NodeId) {
        self.node = Some(id);
        self.way = None;
    }

    /// Focus an open way: single-focus only, the polygon set is cleared.
    pub fn select_open_way(&mut self, id: WayId) {
        self.way = Some(id);
        self.ways.clear();
        self.node = None;
    }

    /// Combine a picked closed polygon with the selection.
    pub fn select_polygon(&mut self, id: WayId, mode: SelectMode) {
        match mode {
            SelectMode::Replace => {
                self.way = Some(id);
                self.ways.clear();
                self.ways.insert(id);
            }
            SelectMode::Subtract => {
                self.ways.remove(&id);
            }
            SelectMode::Extend => {
                self.ways.insert(id);
            }
        }
        self.node = None;
    }

    /// Combine a box-select result with the polygon set.
    pub fn apply_box(&mut self, picked: impl IntoIterator<Item = WayId>, mode: SelectMode) {
        match mode {
            SelectMode::Replace => {
                self.ways = picked.into_iter().collect();
            }
            SelectMode::Subtract => {
                for id in picked {
                    self.ways.remove(&id);
                }
            }
            SelectMode::Extend => {
                self.ways.extend(picked);
            }
        }
    }
}
