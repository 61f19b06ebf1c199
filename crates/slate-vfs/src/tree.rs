use std::collections::HashMap;

use serde::Serialize;

use crate::path::{directory_of, VfsPath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    // Declaration order is the sort order: folders before files.
    Folder,
    File,
}

/// A node of the derived file tree.
///
/// The root node (`path == "/"`, empty name) is synthetic and never rendered itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub path: VfsPath,
    /// `Some` for folders (possibly empty), `None` for files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn children(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Depth-first lookup by canonical path.
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        if self.path == *path {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(path))
    }

    /// Flattens the tree into display rows, descending only into expanded folders.
    ///
    /// The root itself is not emitted; its children are at depth 0.
    pub fn rows(&self, is_expanded: impl Fn(&VfsPath) -> bool) -> Vec<TreeRow> {
        let mut out = Vec::new();
        let mut stack: Vec<(&TreeNode, u16)> =
            self.children().iter().rev().map(|child| (child, 0)).collect();
        while let Some((node, depth)) = stack.pop() {
            let expanded = node.is_folder() && is_expanded(&node.path);
            out.push(TreeRow {
                depth,
                name: node.name.clone(),
                path: node.path.clone(),
                kind: node.kind,
                is_expanded: expanded,
            });
            if expanded {
                stack.extend(node.children().iter().rev().map(|child| (child, depth + 1)));
            }
        }
        out
    }
}

/// Flattened row for list-style rendering of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub depth: u16,
    pub name: String,
    pub path: VfsPath,
    pub kind: NodeKind,
    pub is_expanded: bool,
}

struct BuildNode {
    name: String,
    kind: NodeKind,
    path: VfsPath,
    children: Vec<usize>,
}

/// Builds the sorted tree for the given file and folder paths.
///
/// Ancestor folders that were never created explicitly are synthesized; a file whose
/// directory has no folder node is attached to the root. Output ordering depends only on the
/// set of inputs, never on iteration order.
pub fn project_tree<'a, F, D>(files: F, folders: D) -> TreeNode
where
    F: IntoIterator<Item = &'a VfsPath>,
    D: IntoIterator<Item = &'a VfsPath>,
{
    let mut arena = vec![BuildNode {
        name: String::new(),
        kind: NodeKind::Folder,
        path: VfsPath::root(),
        children: Vec::new(),
    }];
    let mut folder_index: HashMap<String, usize> = HashMap::new();
    folder_index.insert("/".to_owned(), 0);

    for folder in folders {
        let mut parent = 0;
        let mut current = String::new();
        for segment in folder.as_str().split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            parent = match folder_index.get(&current) {
                Some(&idx) => idx,
                None => {
                    let idx = arena.len();
                    arena.push(BuildNode {
                        name: segment.to_owned(),
                        kind: NodeKind::Folder,
                        path: VfsPath::new(&current),
                        children: Vec::new(),
                    });
                    arena[parent].children.push(idx);
                    folder_index.insert(current.clone(), idx);
                    idx
                }
            };
        }
    }

    for file in files {
        let parent = folder_index
            .get(&directory_of(file.as_str()))
            .copied()
            .unwrap_or(0);
        let idx = arena.len();
        arena.push(BuildNode {
            name: file.name().to_owned(),
            kind: NodeKind::File,
            path: file.clone(),
            children: Vec::new(),
        });
        arena[parent].children.push(idx);
    }

    materialize(&arena, 0)
}

fn materialize(arena: &[BuildNode], idx: usize) -> TreeNode {
    let node = &arena[idx];
    let children = match node.kind {
        NodeKind::File => None,
        NodeKind::Folder => {
            let mut children: Vec<TreeNode> = node
                .children
                .iter()
                .map(|&child| materialize(arena, child))
                .collect();
            children.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
            Some(children)
        }
    };
    TreeNode {
        name: node.name.clone(),
        kind: node.kind,
        path: node.path.clone(),
        children,
    }
}
