//! The persisted filesystem tree and bookmark table.
//!
//! All paths taken by [`FileSystem`] methods are absolute and already
//! resolved (see [`FileSystem::resolve_path`]). Every mutating call writes the
//! whole tree (or the whole bookmark table) to storage before returning.

use std::collections::BTreeMap;
use std::sync::Arc;

use cedar_types::clock::Clock;
use cedar_types::error::{Result, VfsError};

use crate::node::{DirEntry, FileNode, NodeStat};
use crate::path::{self, child_path, join_segments, leaf_name, split_path};
use crate::storage::Storage;

/// Storage key of the serialized tree.
pub const FS_KEY: &str = "cedar:fs";
/// Storage key of the serialized bookmark table.
pub const BOOKMARKS_KEY: &str = "cedar:bookmarks";

/// How the default tree is materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsOptions {
    /// Owner of `/home/<user>` in the default tree.
    pub user: String,
    /// Materialize a bare root instead of `/home/<user>` and `/apps`.
    pub skip_default_dirs: bool,
}

impl Default for FsOptions {
    fn default() -> Self {
        Self {
            user: "guest".to_string(),
            skip_default_dirs: false,
        }
    }
}

/// An in-memory tree of directories and files with write-through persistence.
pub struct FileSystem {
    root: FileNode,
    bookmarks: BTreeMap<String, String>,
    storage: Box<dyn Storage>,
    clock: Arc<dyn Clock>,
    options: FsOptions,
}

impl FileSystem {
    /// Load state from `storage`, materializing the default tree when the
    /// persisted tree is absent or unreadable.
    pub fn open(storage: Box<dyn Storage>, clock: Arc<dyn Clock>, options: FsOptions) -> Self {
        let bookmarks = load_bookmarks(storage.as_ref());
        let loaded = load_tree(storage.as_ref());
        let mut fs = Self {
            root: FileNode::dir(0),
            bookmarks,
            storage,
            clock,
            options,
        };
        match loaded {
            Some(root) => fs.root = root,
            None => {
                fs.root = fs.default_tree();
                if let Err(e) = fs.persist_tree() {
                    log::warn!("Could not persist default tree: {e}");
                }
            },
        }
        fs
    }

    fn now(&self) -> u64 {
        self.clock.now_millis()
    }

    fn default_tree(&self) -> FileNode {
        let now = self.now();
        let mut root = FileNode::dir(now);
        if !self.options.skip_default_dirs
            && let Some(children) = root.children_mut()
        {
            let mut home = FileNode::dir(now);
            if let Some(h) = home.children_mut() {
                h.insert(self.options.user.clone(), FileNode::dir(now));
            }
            children.insert("home".to_string(), home);
            children.insert("apps".to_string(), FileNode::dir(now));
        }
        root
    }

    fn persist_tree(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.root)?;
        log::debug!("Persisting tree ({} bytes)", json.len());
        self.storage.save(FS_KEY, &json)
    }

    fn persist_bookmarks(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.bookmarks)?;
        self.storage.save(BOOKMARKS_KEY, &json)
    }

    /// The root directory.
    pub fn root(&self) -> &FileNode {
        &self.root
    }

    /// Resolve user input against `cwd` and the current bookmark table.
    pub fn resolve_path(&self, input: &str, cwd: &str, user: &str) -> String {
        path::resolve_path(input, cwd, user, &self.bookmarks)
    }

    /// Walk from the root. `None` if any segment is missing or a
    /// non-directory is traversed.
    pub fn get_node(&self, path: &str) -> Option<&FileNode> {
        let mut cur = &self.root;
        for seg in split_path(path) {
            cur = cur.children()?.get(seg)?;
        }
        Some(cur)
    }

    fn get_node_mut(&mut self, path: &str) -> Option<&mut FileNode> {
        let mut cur = &mut self.root;
        for seg in split_path(path) {
            cur = cur.children_mut()?.get_mut(seg)?;
        }
        Some(cur)
    }

    /// Children of the parent directory of `path`, and the leaf name.
    fn parent_of_mut<'p>(
        &mut self,
        path: &'p str,
    ) -> std::result::Result<(&mut BTreeMap<String, FileNode>, &'p str), VfsError> {
        let segs = split_path(path);
        let Some((leaf, parents)) = segs.split_last() else {
            return Err(VfsError::InvalidPath(path.to_string()));
        };
        let mut cur = &mut self.root;
        for seg in parents {
            cur = cur
                .children_mut()
                .and_then(|c| c.get_mut(*seg))
                .ok_or(VfsError::NoSuchDirectory)?;
        }
        let children = cur.children_mut().ok_or(VfsError::NoSuchDirectory)?;
        Ok((children, *leaf))
    }

    pub fn stat(&self, path: &str) -> Option<NodeStat> {
        self.get_node(path).map(FileNode::stat)
    }

    /// Children of a directory in name order. `None` unless `path` is a
    /// directory.
    pub fn readdir(&self, path: &str) -> Option<Vec<DirEntry>> {
        let children = self.get_node(path)?.children()?;
        Some(
            children
                .iter()
                .map(|(name, node)| DirEntry {
                    name: name.clone(),
                    kind: node.kind(),
                })
                .collect(),
        )
    }

    /// Content of a file. `None` if missing or a directory.
    pub fn read_file(&self, path: &str) -> Option<String> {
        self.get_node(path)?.content().map(str::to_string)
    }

    /// Run `op` on the tree and persist the result. If `op` or the save
    /// fails, the tree is restored to its state before the call.
    fn commit_tree(&mut self, op: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        let before = self.root.clone();
        let result = op(self).and_then(|()| self.persist_tree());
        if result.is_err() {
            self.root = before;
        }
        result
    }

    /// Create or overwrite a file. The parent directory must exist and the
    /// leaf must not be a directory.
    ///
    /// Overwriting an existing file keeps its creation time.
    pub fn write_file(&mut self, path: &str, content: &str) -> Result<()> {
        self.commit_tree(|fs| fs.put_file(path, content))
    }

    fn put_file(&mut self, path: &str, content: &str) -> Result<()> {
        if split_path(path).is_empty() {
            return Err(VfsError::IsADirectory.into());
        }
        let now = self.now();
        let (children, leaf) = self.parent_of_mut(path)?;
        match children.get_mut(leaf) {
            Some(FileNode::Directory { .. }) => return Err(VfsError::IsADirectory.into()),
            Some(FileNode::File {
                content: existing,
                modified_at,
                ..
            }) => {
                *existing = content.to_string();
                *modified_at = now;
            },
            None => {
                children.insert(leaf.to_string(), FileNode::file(content, now));
            },
        }
        Ok(())
    }

    /// Create an empty file. An existing file is truncated.
    pub fn mk(&mut self, path: &str) -> Result<()> {
        self.write_file(path, "")
    }

    /// Create a directory. Fails if the parent is missing or the leaf exists.
    pub fn mkdir(&mut self, path: &str) -> Result<()> {
        if split_path(path).is_empty() {
            return Err(VfsError::Exists.into());
        }
        self.commit_tree(|fs| {
            let now = fs.now();
            let (children, leaf) = fs.parent_of_mut(path)?;
            if children.contains_key(leaf) {
                return Err(VfsError::Exists.into());
            }
            children.insert(leaf.to_string(), FileNode::dir(now));
            Ok(())
        })
    }

    /// Remove an empty directory.
    pub fn rmdir(&mut self, path: &str) -> Result<()> {
        match self.get_node(path) {
            None => return Err(VfsError::NoSuchDirectory.into()),
            Some(node) => match node.children() {
                None => return Err(VfsError::NotADirectory.into()),
                Some(children) if !children.is_empty() => {
                    return Err(VfsError::NotEmpty.into());
                },
                Some(_) => {},
            },
        }
        if split_path(path).is_empty() {
            return Err(VfsError::RemoveRoot.into());
        }
        self.commit_tree(|fs| fs.unlink(path))
    }

    /// Remove a file.
    pub fn rm(&mut self, path: &str) -> Result<()> {
        match self.get_node(path) {
            None => return Err(VfsError::NoSuchFile.into()),
            Some(node) if node.is_dir() => return Err(VfsError::IsADirectory.into()),
            Some(_) => {},
        }
        self.commit_tree(|fs| fs.unlink(path))
    }

    fn unlink(&mut self, path: &str) -> Result<()> {
        let (children, leaf) = self.parent_of_mut(path)?;
        children.remove(leaf);
        Ok(())
    }

    /// Bump the mtime of an existing node, or create an empty file.
    pub fn touch(&mut self, path: &str) -> Result<()> {
        self.commit_tree(|fs| {
            let now = fs.now();
            match fs.get_node_mut(path) {
                Some(node) => {
                    node.touch(now);
                    Ok(())
                },
                None => fs.put_file(path, ""),
            }
        })
    }

    /// Copy a file or a whole directory subtree to `dst`, replacing whatever
    /// is there. Every node of the copy gets fresh timestamps.
    pub fn copy(&mut self, src: &str, dst: &str) -> Result<()> {
        self.commit_tree(|fs| fs.put_copy(src, dst))
    }

    fn put_copy(&mut self, src: &str, dst: &str) -> Result<()> {
        let now = self.now();
        let copy = self
            .get_node(src)
            .ok_or(VfsError::NoSuchSource)?
            .fresh_copy(now);
        if split_path(dst).is_empty() {
            return Err(VfsError::InvalidPath(dst.to_string()).into());
        }
        let (children, leaf) = self
            .parent_of_mut(dst)
            .map_err(|_| VfsError::NoSuchDestination)?;
        children.insert(leaf.to_string(), copy);
        Ok(())
    }

    /// Copy then delete the source.
    ///
    /// Not atomic: each step is saved on its own, so if the delete fails
    /// after the copy landed, both paths exist. Moving onto itself is a
    /// no-op. Moving a node into its own subtree or onto one of its
    /// ancestors is refused.
    pub fn move_node(&mut self, src: &str, dst: &str) -> Result<()> {
        let src_segs = split_path(src);
        let dst_segs = split_path(dst);
        if src_segs == dst_segs {
            return if self.get_node(src).is_some() {
                Ok(())
            } else {
                Err(VfsError::NoSuchSource.into())
            };
        }
        if dst_segs.starts_with(&src_segs) || src_segs.starts_with(&dst_segs) {
            return Err(VfsError::InvalidPath(dst.to_string()).into());
        }
        self.copy(src, dst)?;
        self.commit_tree(|fs| fs.unlink(src))
    }

    /// Absolute paths under `path` whose leaf name is exactly `name`.
    pub fn find(&self, name: &str, path: &str) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(node) = self.get_node(path) {
            find_in(node, &join_segments(&split_path(path)), name, &mut out);
        }
        out
    }

    /// Absolute paths of files under `path` whose content contains `text`.
    pub fn seek(&self, text: &str, path: &str) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(node) = self.get_node(path) {
            seek_in(node, &join_segments(&split_path(path)), text, &mut out);
        }
        out
    }

    /// Indented listing of the subtree at `path`, children sorted by name,
    /// directories suffixed with `/`. A file lists as its own name.
    pub fn tree_list(&self, path: &str) -> Option<Vec<String>> {
        let node = self.get_node(path)?;
        let mut out = Vec::new();
        if node.is_dir() {
            tree_in(node, "", &mut out);
        } else {
            out.push(leaf_name(path).to_string());
        }
        Some(out)
    }

    /// Total content length of every file under `path`, in the same
    /// UTF-16 units as [`FileNode::size`].
    pub fn du(&self, path: &str) -> u64 {
        self.get_node(path).map_or(0, du_of)
    }

    /// 32-bit FNV-1a of a file's content, lowercase hex.
    pub fn hash(&self, path: &str) -> Option<String> {
        let content = self.get_node(path)?.content()?;
        let mut h: u32 = 2_166_136_261;
        for unit in content.encode_utf16() {
            h = (h ^ u32::from(unit)).wrapping_mul(16_777_619);
        }
        Some(format!("{h:x}"))
    }

    /// Create or replace a bookmark. The target is not checked.
    pub fn add_bookmark(&mut self, name: &str, path: &str) -> Result<()> {
        let before = self.bookmarks.insert(name.to_string(), path.to_string());
        self.persist_bookmarks().inspect_err(|_| match before {
            Some(old) => {
                self.bookmarks.insert(name.to_string(), old);
            },
            None => {
                self.bookmarks.remove(name);
            },
        })
    }

    pub fn list_bookmarks(&self) -> &BTreeMap<String, String> {
        &self.bookmarks
    }

    /// Remove a bookmark. Absent names are ignored.
    pub fn remove_bookmark(&mut self, name: &str) -> Result<()> {
        let Some(old) = self.bookmarks.remove(name) else {
            return self.persist_bookmarks();
        };
        self.persist_bookmarks().inspect_err(|_| {
            self.bookmarks.insert(name.to_string(), old);
        })
    }

    /// Delete both persisted blobs and start over from the default tree.
    ///
    /// The in-memory state is reset even when a delete fails; the first
    /// storage error is returned. The fresh tree is only written back on the
    /// next mutation, so a load in between sees absent state and
    /// materializes the same default.
    pub fn reset(&mut self) -> Result<()> {
        self.root = self.default_tree();
        self.bookmarks.clear();
        let tree = self.storage.remove(FS_KEY);
        let marks = self.storage.remove(BOOKMARKS_KEY);
        log::info!("Filesystem state wiped");
        tree.and(marks)
    }
}

fn load_tree(storage: &dyn Storage) -> Option<FileNode> {
    let raw = match storage.load(FS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Could not load tree: {e}");
            return None;
        },
    };
    match serde_json::from_str::<FileNode>(&raw) {
        Ok(root) if root.is_dir() => Some(root),
        Ok(_) => {
            log::warn!("Persisted root is not a directory, rebuilding default tree");
            None
        },
        Err(e) => {
            log::warn!("Persisted tree is unreadable ({e}), rebuilding default tree");
            None
        },
    }
}

fn load_bookmarks(storage: &dyn Storage) -> BTreeMap<String, String> {
    match storage.load(BOOKMARKS_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::warn!("Persisted bookmarks are unreadable ({e}), starting empty");
            BTreeMap::new()
        }),
        Ok(None) => BTreeMap::new(),
        Err(e) => {
            log::warn!("Could not load bookmarks: {e}");
            BTreeMap::new()
        },
    }
}

fn find_in(node: &FileNode, path: &str, name: &str, out: &mut Vec<String>) {
    match node.children() {
        None => {
            if leaf_name(path) == name {
                out.push(path.to_string());
            }
        },
        Some(children) => {
            for (k, child) in children {
                let child_path = child_path(path, k);
                if k == name {
                    out.push(child_path.clone());
                }
                if child.is_dir() {
                    find_in(child, &child_path, name, out);
                }
            }
        },
    }
}

fn seek_in(node: &FileNode, path: &str, text: &str, out: &mut Vec<String>) {
    match node {
        FileNode::File { content, .. } => {
            if content.contains(text) {
                out.push(path.to_string());
            }
        },
        FileNode::Directory { children, .. } => {
            for (k, child) in children {
                seek_in(child, &child_path(path, k), text, out);
            }
        },
    }
}

fn tree_in(node: &FileNode, prefix: &str, out: &mut Vec<String>) {
    let Some(children) = node.children() else {
        return;
    };
    for (name, child) in children {
        if child.is_dir() {
            out.push(format!("{prefix}{name}/"));
            tree_in(child, &format!("{prefix}  "), out);
        } else {
            out.push(format!("{prefix}{name}"));
        }
    }
}

fn du_of(node: &FileNode) -> u64 {
    match node.children() {
        None => node.size(),
        Some(children) => children.values().map(du_of).sum(),
    }
}
