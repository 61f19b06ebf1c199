use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonicalizes a path string.
///
/// `\` becomes `/`, the result starts with exactly one `/`, runs of `/` collapse to one and a
/// trailing `/` is dropped (except for the root itself). Never returns an empty string.
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    for ch in path.chars() {
        let ch = if ch == '\\' { '/' } else { ch };
        if ch == '/' && out.ends_with('/') {
            continue;
        }
        out.push(ch);
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

/// Canonical parent of `path`; `"/"` for top-level entries and for the root.
pub fn directory_of(path: &str) -> String {
    let path = normalize(path);
    match path.rfind('/') {
        Some(0) | None => "/".to_owned(),
        Some(idx) => path[..idx].to_owned(),
    }
}

/// Final segment of `path`; empty only for the root.
pub fn name_of(path: &str) -> String {
    let path = normalize(path);
    match path.rfind('/') {
        Some(idx) => path[idx + 1..].to_owned(),
        None => path,
    }
}

/// Text after the last `.` of the final segment, or `""`.
pub fn extension_of(path: &str) -> String {
    let name = name_of(path);
    match name.rfind('.') {
        Some(idx) => name[idx + 1..].to_owned(),
        None => String::new(),
    }
}

pub fn join(dir: &str, name: &str) -> String {
    normalize(&format!("{dir}/{name}"))
}

/// `true` when `path` lies strictly below `ancestor`.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    let path = normalize(path);
    let ancestor = normalize(ancestor);
    if ancestor == "/" {
        return path != "/";
    }
    path.len() > ancestor.len()
        && path.starts_with(&ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// Substitutes the `from` prefix of `path` with `to`.
///
/// Returns `None` when `path` is neither `from` nor inside it.
pub fn rebase(path: &str, from: &str, to: &str) -> Option<String> {
    let path = normalize(path);
    let from = normalize(from);
    if path == from {
        return Some(normalize(to));
    }
    if !is_within(&path, &from) {
        return None;
    }
    let suffix = if from == "/" {
        path.as_str()
    } else {
        &path[from.len()..]
    };
    Some(normalize(&format!("{to}/{suffix}")))
}

/// Resolves `reference` against `base_dir`, interpreting `.` and `..` segments.
///
/// References starting with `/` are resolved from the root. `..` never climbs above the root.
pub fn resolve_relative(base_dir: &str, reference: &str) -> String {
    let reference = reference.replace('\\', "/");
    let mut segments: Vec<String> = if reference.starts_with('/') {
        Vec::new()
    } else {
        normalize(base_dir)
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect()
    };

    for segment in reference.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other.to_owned()),
        }
    }

    normalize(&segments.join("/"))
}

/// A canonical absolute path inside the virtual file system.
///
/// Two `VfsPath`s are equal iff their canonical strings are byte-equal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct VfsPath(String);

impl VfsPath {
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(normalize(path.as_ref()))
    }

    #[must_use]
    pub fn root() -> Self {
        Self("/".to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    pub fn parent(&self) -> VfsPath {
        Self(directory_of(&self.0))
    }

    pub fn name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    pub fn extension(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(idx) => &name[idx + 1..],
            None => "",
        }
    }

    pub fn join(&self, name: &str) -> VfsPath {
        Self(join(&self.0, name))
    }

    /// `true` when `self` lies strictly below `ancestor`.
    pub fn is_within(&self, ancestor: &VfsPath) -> bool {
        is_within(&self.0, &ancestor.0)
    }

    /// The path with its leading slash stripped, as used for archive entry names.
    pub fn relative(&self) -> &str {
        &self.0[1..]
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for VfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for VfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VfsPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for VfsPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for VfsPath {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for VfsPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<VfsPath> for String {
    fn from(value: VfsPath) -> Self {
        value.0
    }
}

impl PartialEq<str> for VfsPath {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for VfsPath {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
