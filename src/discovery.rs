//! Candidate file discovery.
//!
//! Walking is lazy and depth-first; directory entries are visited in sorted
//! order so a rerun yields the same sequence. Whatever is yielded is only a
//! candidate: the codec decides whether it really is an EDF file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Lazy iterator over files below a root whose extension matches
#[derive(Debug)]
pub struct EdfPaths {
    stack: Vec<PathBuf>,
    extensions: Vec<String>,
    root: Option<PathBuf>,
}

impl EdfPaths {
    /// Walks `root`. If `root` is a file it is yielded as-is, whatever its
    /// extension; an explicitly named file is always a candidate.
    pub fn new<P: AsRef<Path>>(root: P, extensions: &[String]) -> Self {
        EdfPaths {
            stack: Vec::new(),
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            root: Some(root.as_ref().to_path_buf()),
        }
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|want| e.eq_ignore_ascii_case(want)))
            .unwrap_or(false)
    }

    fn push_dir(&mut self, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "cannot read directory, skipping");
                return;
            }
        };

        let mut children = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => {
                    // 不跟随符号链接目录，避免循环
                    let is_symlink = entry.file_type().map(|t| t.is_symlink()).unwrap_or(false);
                    if is_symlink && entry.path().is_dir() {
                        continue;
                    }
                    children.push(entry.path());
                }
                Err(e) => warn!(path = %dir.display(), error = %e, "cannot read directory entry"),
            }
        }
        children.sort();
        // 逆序入栈，使出栈顺序为字典序
        self.stack.extend(children.into_iter().rev());
    }
}

impl Iterator for EdfPaths {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        if let Some(root) = self.root.take() {
            if root.is_dir() {
                self.push_dir(&root);
            } else {
                return Some(root);
            }
        }

        while let Some(path) = self.stack.pop() {
            if path.is_dir() {
                self.push_dir(&path);
            } else if self.matches(&path) {
                return Some(path);
            }
        }
        None
    }
}
