//! Virtual file store.
//!
//! Caller files live in memory, keyed by absolute cleaned paths obtained by
//! joining their caller-relative paths against the working directory. The
//! entry document sits under a unique generated token so a literal source
//! can never collide with a caller file.

use path_clean::PathClean;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::{Error, Result};

/// Directory name used when no working directory is given. It never exists
/// on disk; it only anchors virtual paths.
pub const FAKE_DIR: &str = "__mdxpack_fake_dir__";

/// Generate the unique entry path token under `root`.
pub(crate) fn entry_token(root: &Path) -> PathBuf {
    root.join(format!("_mdxpack_entry_point-{}.mdx", Uuid::new_v4()))
}

/// In-memory file map backing the resolve and load plugins.
#[derive(Debug)]
pub struct VirtualFileStore {
    files: FxHashMap<PathBuf, String>,
    root: PathBuf,
    entry_path: PathBuf,
}

impl VirtualFileStore {
    pub(crate) fn new(root: PathBuf) -> Self {
        Self {
            files: FxHashMap::default(),
            root,
            entry_path: PathBuf::new(),
        }
    }

    /// Working directory caller paths are joined against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the entry document.
    pub fn entry_path(&self) -> &Path {
        &self.entry_path
    }

    /// Register the entry document. Collision with a caller file is a
    /// duplicate error, same as two caller files colliding.
    pub(crate) fn set_entry(&mut self, path: PathBuf, text: String) -> Result<()> {
        let path = self.normalize(&path);
        if self.files.contains_key(&path) {
            return Err(Error::DuplicateFile(path.display().to_string()));
        }
        self.files.insert(path.clone(), text);
        self.entry_path = path;
        Ok(())
    }

    /// Insert one caller file. Two paths normalizing to the same absolute
    /// path is an error rather than last-write-wins.
    pub fn insert(&mut self, relative: &str, contents: String) -> Result<()> {
        let path = self.normalize(Path::new(relative));
        if self.files.contains_key(&path) {
            return Err(Error::DuplicateFile(path.display().to_string()));
        }
        self.files.insert(path, contents);
        Ok(())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(&self.normalize(path))
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.files.get(&self.normalize(path)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Probe `candidate` with each extension in order, returning the first
    /// stored match.
    pub fn probe(&self, candidate: &Path, extensions: &[String]) -> Option<PathBuf> {
        let base = self.normalize(candidate);
        let base_str = base.to_string_lossy();
        for ext in extensions {
            let with_ext = PathBuf::from(format!("{base_str}{ext}"));
            if self.files.contains_key(&with_ext) {
                return Some(with_ext);
            }
        }
        None
    }

    /// Render `path` relative to the working directory, the way callers
    /// spelled it (`"./demo.tsx"`).
    pub fn display_relative(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rest) => format!("./{}", rest.display()),
            Err(_) => path.display().to_string(),
        }
    }

    fn normalize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf().clean()
        } else {
            self.root.join(path).clean()
        }
    }
}
