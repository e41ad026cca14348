/// Edit scripts: a JSON list of commands replayed against a `Document`.
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::node::NodeId;

fn default_collapsed() -> bool {
    true
}

/// One step of an edit script.
///
/// Edits made between two `commit` steps form one transaction, the same way
/// a burst of synchronous edits does in an interactive host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Add {
        label: String,
        #[serde(default)]
        weight: f64,
    },
    Rename {
        id: NodeId,
        label: String,
    },
    SetWeight {
        id: NodeId,
        weight: f64,
    },
    Collapse {
        id: NodeId,
        #[serde(default = "default_collapsed")]
        collapsed: bool,
    },
    Attach {
        parent: NodeId,
        child: NodeId,
    },
    Detach {
        parent: NodeId,
        child: NodeId,
    },
    Remove {
        id: NodeId,
    },
    /// Runs the pending commit, closing the current transaction.
    Commit,
    Undo,
    Redo,
}

impl Command {
    /// Short name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Add { .. } => "add",
            Command::Rename { .. } => "rename",
            Command::SetWeight { .. } => "set_weight",
            Command::Collapse { .. } => "collapse",
            Command::Attach { .. } => "attach",
            Command::Detach { .. } => "detach",
            Command::Remove { .. } => "remove",
            Command::Commit => "commit",
            Command::Undo => "undo",
            Command::Redo => "redo",
        }
    }

    /// Parses a script from a JSON array of commands.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid command list.
    pub fn parse_script(json: &str) -> Result<Vec<Command>> {
        serde_json::from_str(json).context("Failed to parse edit script")
    }

    /// Reads and parses a script file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_script(path: &Path) -> Result<Vec<Command>> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script: {}", path.display()))?;
        Self::parse_script(&contents).with_context(|| format!("Invalid script: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_commands() {
        let json = r#"[
            {"op": "add", "label": "root", "weight": 2.5},
            {"op": "add", "label": "leaf"},
            {"op": "rename", "id": 0, "label": "top"},
            {"op": "set_weight", "id": 1, "weight": -1.0},
            {"op": "collapse", "id": 0},
            {"op": "collapse", "id": 0, "collapsed": false},
            {"op": "attach", "parent": 0, "child": 1},
            {"op": "detach", "parent": 0, "child": 1},
            {"op": "remove", "id": 1},
            {"op": "commit"},
            {"op": "undo"},
            {"op": "redo"}
        ]"#;
        let commands = Command::parse_script(json).expect("parse");
        assert_eq!(commands.len(), 12);
        assert_eq!(
            commands[1],
            Command::Add {
                label: "leaf".to_string(),
                weight: 0.0
            }
        );
        assert_eq!(
            commands[4],
            Command::Collapse {
                id: NodeId(0),
                collapsed: true
            }
        );
        assert_eq!(
            commands[5],
            Command::Collapse {
                id: NodeId(0),
                collapsed: false
            }
        );
        assert_eq!(commands[9], Command::Commit);
        let names: Vec<&str> = commands.iter().map(Command::name).collect();
        assert_eq!(names[3], "set_weight");
        assert_eq!(names[11], "redo");
    }

    #[test]
    fn test_parse_rejects_unknown_op() {
        assert!(Command::parse_script(r#"[{"op": "explode"}]"#).is_err());
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        assert!(Command::parse_script(r#"[{"op": "rename", "id": 0}]"#).is_err());
    }

    #[test]
    fn test_load_script_missing_file() {
        let err = Command::load_script(Path::new("/nonexistent/script.json")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read script"));
    }
}
