use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single recorded change, addressed from the document root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    pub path: Vec<String>,
    #[serde(flatten)]
    pub op: DiffOp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "lowercase")]
pub enum DiffOp {
    Set(Value),
    Del,
}

impl Diff {
    pub fn set(path: Vec<String>, value: Value) -> Self {
        Diff {
            path,
            op: DiffOp::Set(value),
        }
    }

    pub fn del(path: Vec<String>) -> Self {
        Diff {
            path,
            op: DiffOp::Del,
        }
    }

    /// Dotted rendering of the path, `""` for the root itself.
    pub fn path_string(&self) -> String {
        self.path.join(".")
    }
}
