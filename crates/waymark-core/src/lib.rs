//! Waymark Core Library
//!
//! Platform-agnostic editing core for the Waymark map editor: geographic
//! projections, slippy tile math, the node/way document model, undoable
//! editing commands, hit testing, and session state.

pub mod command;
pub mod graph;
pub mod grid;
pub mod projection;
pub mod query;
pub mod selection;
pub mod session;
pub mod storage;
pub mod tiles;
pub mod view;

pub use command::{Command, DEFAULT_UNDO_CAP, GraphObject, History, TagTarget};
pub use graph::{GraphDocument, Node, NodeId, Relation, RelationId, Tags, Way, WayId};
pub use grid::GridSettings;
pub use projection::SceneOrigin;
pub use query::{NODE_PICK_RADIUS, PickResult, WAY_PICK_TOLERANCE, pick};
pub use selection::{SelectMode, Selection};
pub use session::EditorSession;
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError, StorageResult};
pub use tiles::{TileIndex, TileRange};
pub use view::{ProjectionFrame, ViewDefaults, Viewport};
