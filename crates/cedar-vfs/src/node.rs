//! Tree nodes.
//!
//! Each directory owns its children outright, so a subtree can never be
//! reachable from two parents. Cloning a subtree for `copy` is a plain
//! recursive walk that produces an independent tree.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A file or directory. Serialized in the persisted layout:
/// `{"type": "dir", "children": {..}, "ctime": .., "mtime": ..}` or
/// `{"type": "file", "content": "..", "ctime": .., "mtime": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FileNode {
    #[serde(rename = "dir")]
    Directory {
        #[serde(default)]
        children: BTreeMap<String, FileNode>,
        #[serde(rename = "ctime", default)]
        created_at: u64,
        #[serde(rename = "mtime", default)]
        modified_at: u64,
    },
    #[serde(rename = "file")]
    File {
        #[serde(default)]
        content: String,
        #[serde(rename = "ctime", default)]
        created_at: u64,
        #[serde(rename = "mtime", default)]
        modified_at: u64,
    },
}

/// Node type as reported by `stat` and `readdir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Directory,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::File => f.write_str("file"),
            NodeKind::Directory => f.write_str("dir"),
        }
    }
}

/// Metadata returned by `stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStat {
    pub kind: NodeKind,
    /// Content length for files, 0 for directories.
    pub size: u64,
    pub ctime: u64,
    pub mtime: u64,
}

/// A single child returned by `readdir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: NodeKind,
}

impl FileNode {
    /// An empty directory stamped with `now`.
    pub fn dir(now: u64) -> Self {
        FileNode::Directory {
            children: BTreeMap::new(),
            created_at: now,
            modified_at: now,
        }
    }

    /// A file stamped with `now`.
    pub fn file(content: impl Into<String>, now: u64) -> Self {
        FileNode::File {
            content: content.into(),
            created_at: now,
            modified_at: now,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            FileNode::Directory { .. } => NodeKind::Directory,
            FileNode::File { .. } => NodeKind::File,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, FileNode::Directory { .. })
    }

    /// Length of the content in UTF-16 code units; directories are 0.
    pub fn size(&self) -> u64 {
        match self {
            FileNode::File { content, .. } => content.encode_utf16().count() as u64,
            FileNode::Directory { .. } => 0,
        }
    }

    pub fn ctime(&self) -> u64 {
        match self {
            FileNode::Directory { created_at, .. } | FileNode::File { created_at, .. } => {
                *created_at
            },
        }
    }

    pub fn mtime(&self) -> u64 {
        match self {
            FileNode::Directory { modified_at, .. } | FileNode::File { modified_at, .. } => {
                *modified_at
            },
        }
    }

    pub fn stat(&self) -> NodeStat {
        NodeStat {
            kind: self.kind(),
            size: self.size(),
            ctime: self.ctime(),
            mtime: self.mtime(),
        }
    }

    /// File content, `None` for directories.
    pub fn content(&self) -> Option<&str> {
        match self {
            FileNode::File { content, .. } => Some(content),
            FileNode::Directory { .. } => None,
        }
    }

    pub fn children(&self) -> Option<&BTreeMap<String, FileNode>> {
        match self {
            FileNode::Directory { children, .. } => Some(children),
            FileNode::File { .. } => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut BTreeMap<String, FileNode>> {
        match self {
            FileNode::Directory { children, .. } => Some(children),
            FileNode::File { .. } => None,
        }
    }

    /// Bump the modification time.
    pub fn touch(&mut self, now: u64) {
        match self {
            FileNode::Directory { modified_at, .. } | FileNode::File { modified_at, .. } => {
                *modified_at = now;
            },
        }
    }

    /// Deep copy where every node in the new subtree is stamped with `now`.
    pub fn fresh_copy(&self, now: u64) -> Self {
        match self {
            FileNode::File { content, .. } => FileNode::file(content.clone(), now),
            FileNode::Directory { children, .. } => FileNode::Directory {
                children: children
                    .iter()
                    .map(|(name, child)| (name.clone(), child.fresh_copy(now)))
                    .collect(),
                created_at: now,
                modified_at: now,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_size_counts_utf16_units() {
        assert_eq!(FileNode::file("héllo", 0).size(), 5);
        assert_eq!(FileNode::file("😀", 0).size(), 2);
        assert_eq!(FileNode::dir(0).size(), 0);
    }

    #[test]
    fn kind_display() {
        assert_eq!(NodeKind::File.to_string(), "file");
        assert_eq!(NodeKind::Directory.to_string(), "dir");
    }

    #[test]
    fn touch_only_moves_mtime() {
        let mut f = FileNode::file("x", 10);
        f.touch(99);
        assert_eq!(f.ctime(), 10);
        assert_eq!(f.mtime(), 99);
    }

    #[test]
    fn fresh_copy_restamps_every_node() {
        let mut d = FileNode::dir(1);
        let children = d.children_mut().unwrap();
        children.insert("a.txt".into(), FileNode::file("alpha", 2));
        let mut sub = FileNode::dir(3);
        sub.children_mut()
            .unwrap()
            .insert("b.txt".into(), FileNode::file("beta", 4));
        children.insert("sub".into(), sub);

        let copy = d.fresh_copy(500);
        assert_eq!(copy.ctime(), 500);
        let kids = copy.children().unwrap();
        assert_eq!(kids["a.txt"].content(), Some("alpha"));
        assert_eq!(kids["a.txt"].ctime(), 500);
        let b = &kids["sub"].children().unwrap()["b.txt"];
        assert_eq!(b.content(), Some("beta"));
        assert_eq!(b.mtime(), 500);
    }

    #[test]
    fn deserializes_persisted_layout() {
        let json = r#"{"type":"dir","children":{
            "home":{"type":"dir","children":{"guest":{"type":"dir","children":{}}},"ctime":1,"mtime":2},
            "notes.txt":{"type":"file","content":"hi","ctime":3,"mtime":4}
        },"ctime":5,"mtime":6}"#;
        let root: FileNode = serde_json::from_str(json).unwrap();
        let kids = root.children().unwrap();
        assert!(kids["home"].is_dir());
        // Missing timestamps default to zero.
        assert_eq!(kids["home"].children().unwrap()["guest"].ctime(), 0);
        assert_eq!(kids["notes.txt"].content(), Some("hi"));
        assert_eq!(kids["notes.txt"].mtime(), 4);
    }

    #[test]
    fn serializes_type_tag() {
        let json = serde_json::to_value(FileNode::file("x", 7)).unwrap();
        assert_eq!(json["type"], "file");
        assert_eq!(json["content"], "x");
        assert_eq!(json["ctime"], 7);
        assert_eq!(json["mtime"], 7);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let r: Result<FileNode, _> = serde_json::from_str(r#"{"type":"link"}"#);
        assert!(r.is_err());
    }
}
