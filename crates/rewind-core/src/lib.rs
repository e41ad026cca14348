pub mod document;
pub mod graph;
pub mod history;
pub mod node;
pub mod script;

pub use document::{Document, DocumentView, NodeView};
pub use graph::Graph;
pub use node::{Node, NodeId, NodeRef};
pub use script::Command;
