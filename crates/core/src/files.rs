//! Directory browsing and the active file's text buffer

use crate::{error::SourceError, language::Language};
use std::{
    cmp::Ordering,
    collections::HashSet,
    path::{Path, PathBuf},
};
use walkdir::{DirEntry, WalkDir};

/// One file or directory below the tree root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: PathBuf,
    pub name: String,
    /// 0 for direct children of the root
    pub depth: usize,
    pub is_dir: bool,
}

/// Navigable listing of a directory, directories first
#[derive(Debug, Clone)]
pub struct DirectoryTree {
    root: PathBuf,
    entries: Vec<TreeEntry>,
    expanded: HashSet<PathBuf>,
    cursor: usize,
}

impl DirectoryTree {
    /// Lists `root` recursively, skipping hidden entries
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SourceError::Io {
                path: root,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            });
        }

        let mut tree = Self {
            root,
            entries: Vec::new(),
            expanded: HashSet::new(),
            cursor: 0,
        };
        tree.refresh();
        Ok(tree)
    }

    /// Re-reads the directory, keeping expansion state
    pub fn refresh(&mut self) {
        self.entries = WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by(compare_entries)
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .map(|entry| TreeEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                depth: entry.depth() - 1,
                is_dir: entry.file_type().is_dir(),
                path: entry.into_path(),
            })
            .collect();
        self.clamp_cursor();
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rows currently shown: everything not inside a collapsed directory
    pub fn visible(&self) -> Vec<&TreeEntry> {
        let mut rows = Vec::new();
        let mut hidden_below: Option<usize> = None;

        for entry in &self.entries {
            if let Some(depth) = hidden_below {
                if entry.depth > depth {
                    continue;
                }
                hidden_below = None;
            }
            rows.push(entry);
            if entry.is_dir && !self.expanded.contains(&entry.path) {
                hidden_below = Some(entry.depth);
            }
        }
        rows
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&TreeEntry> {
        self.visible().get(self.cursor).copied()
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        self.cursor += 1;
        self.clamp_cursor();
    }

    pub fn is_expanded(&self, path: &Path) -> bool {
        self.expanded.contains(path)
    }

    pub fn toggle(&mut self, path: &Path) {
        if !self.expanded.remove(path) {
            self.expanded.insert(path.to_path_buf());
        }
        self.clamp_cursor();
    }

    /// Expands or collapses a selected directory; returns a selected file
    pub fn activate(&mut self) -> Option<PathBuf> {
        let entry = self.selected()?.clone();
        if entry.is_dir {
            self.toggle(&entry.path);
            None
        } else {
            Some(entry.path)
        }
    }

    fn clamp_cursor(&mut self) {
        let rows = self.visible().len();
        self.cursor = self.cursor.min(rows.saturating_sub(1));
    }
}

fn compare_entries(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_dir = a.file_type().is_dir();
    let b_dir = b.file_type().is_dir();
    b_dir
        .cmp(&a_dir)
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// The file currently shown in the code view
#[derive(Debug, Clone)]
pub struct ActiveFile {
    pub path: PathBuf,
    pub name: String,
    /// `None` for files no compiler understands; they can still be viewed
    pub language: Option<Language>,
    pub buffer: SourceBuffer,
}

impl ActiveFile {
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let language = Language::from_path(path).ok();
        let read_only = !language.is_some_and(|l| l.is_editable());

        Ok(Self {
            path: path.to_path_buf(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            language,
            buffer: SourceBuffer::new(&text, read_only),
        })
    }
}

/// Line based text buffer with a single cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBuffer {
    lines: Vec<String>,
    row: usize,
    /// Column in characters
    col: usize,
    read_only: bool,
    modified: bool,
}

impl SourceBuffer {
    pub fn new(text: &str, read_only: bool) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
            row: 0,
            col: 0,
            read_only,
            modified: false,
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// `(row, column)`, both zero based
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len();
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.line_len() {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self) {
        self.row = self.row.saturating_sub(1);
        self.col = self.col.min(self.line_len());
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
        }
        self.col = self.col.min(self.line_len());
    }

    pub fn home(&mut self) {
        self.col = 0;
    }

    pub fn end(&mut self) {
        self.col = self.line_len();
    }

    /// Returns `false` when the buffer is read-only
    pub fn insert_char(&mut self, c: char) -> bool {
        if self.read_only {
            return false;
        }
        if c == '\n' {
            return self.newline();
        }
        let at = self.byte_offset();
        self.lines[self.row].insert(at, c);
        self.col += 1;
        self.modified = true;
        true
    }

    pub fn newline(&mut self) -> bool {
        if self.read_only {
            return false;
        }
        let at = self.byte_offset();
        let rest = self.lines[self.row].split_off(at);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
        self.modified = true;
        true
    }

    /// Deletes the character before the cursor, joining lines at column 0
    pub fn backspace(&mut self) -> bool {
        if self.read_only || (self.row == 0 && self.col == 0) {
            return false;
        }
        if self.col == 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len();
            self.lines[self.row].push_str(&line);
        } else {
            self.col -= 1;
            let at = self.byte_offset();
            self.lines[self.row].remove(at);
        }
        self.modified = true;
        true
    }

    fn line_len(&self) -> usize {
        self.lines[self.row].chars().count()
    }

    fn byte_offset(&self) -> usize {
        let line = &self.lines[self.row];
        line.char_indices()
            .nth(self.col)
            .map(|(i, _)| i)
            .unwrap_or(line.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("vyper")).unwrap();
        fs::create_dir_all(dir.path().join("solidity/lib")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("Zeta.sol"), "").unwrap();
        fs::write(dir.path().join("Alpha.sol"), "").unwrap();
        fs::write(dir.path().join(".hidden.sol"), "").unwrap();
        fs::write(dir.path().join("vyper/token.vy"), "").unwrap();
        fs::write(dir.path().join("solidity/Greeter.sol"), "").unwrap();
        fs::write(dir.path().join("solidity/lib/Math.sol"), "").unwrap();
        dir
    }

    fn names(tree: &DirectoryTree) -> Vec<String> {
        tree.visible()
            .iter()
            .map(|e| format!("{}{}", "  ".repeat(e.depth), e.name))
            .collect()
    }

    #[test]
    fn test_directories_first_hidden_skipped() {
        let dir = sample_tree();
        let tree = DirectoryTree::new(dir.path()).unwrap();
        assert_eq!(names(&tree), vec!["solidity", "vyper", "Alpha.sol", "Zeta.sol"]);
    }

    #[test]
    fn test_expand_and_collapse() {
        let dir = sample_tree();
        let mut tree = DirectoryTree::new(dir.path()).unwrap();

        assert_eq!(tree.activate(), None);
        assert_eq!(
            names(&tree),
            vec!["solidity", "  lib", "  Greeter.sol", "vyper", "Alpha.sol", "Zeta.sol"]
        );

        tree.move_down();
        tree.activate();
        assert!(names(&tree).contains(&"    Math.sol".to_string()));

        tree.toggle(&dir.path().join("solidity"));
        assert_eq!(names(&tree), vec!["solidity", "vyper", "Alpha.sol", "Zeta.sol"]);
        assert_eq!(tree.cursor(), 1);
    }

    #[test]
    fn test_selecting_a_file() {
        let dir = sample_tree();
        let mut tree = DirectoryTree::new(dir.path()).unwrap();
        for _ in 0..10 {
            tree.move_down();
        }
        assert_eq!(tree.cursor(), 3);
        assert_eq!(tree.activate(), Some(dir.path().join("Zeta.sol")));
        tree.move_up();
        assert_eq!(tree.selected().unwrap().name, "Alpha.sol");
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        assert!(DirectoryTree::new(dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_active_file_language() {
        let dir = TempDir::new().unwrap();
        let sol = dir.path().join("Greeter.sol");
        let vy = dir.path().join("token.vy");
        let txt = dir.path().join("notes.txt");
        fs::write(&sol, "contract Greeter {}\n").unwrap();
        fs::write(&vy, "# @version ^0.3.0\n").unwrap();
        fs::write(&txt, "hello").unwrap();

        let file = ActiveFile::load(&sol).unwrap();
        assert_eq!(file.name, "Greeter.sol");
        assert_eq!(file.language, Some(Language::Solidity));
        assert!(!file.buffer.is_read_only());
        assert_eq!(file.buffer.text(), "contract Greeter {}\n");

        assert!(ActiveFile::load(&vy).unwrap().buffer.is_read_only());
        assert_eq!(ActiveFile::load(&txt).unwrap().language, None);
        assert!(matches!(
            ActiveFile::load(&dir.path().join("missing.sol")),
            Err(SourceError::Io { .. })
        ));
    }

    #[test]
    fn test_buffer_editing() {
        let mut buffer = SourceBuffer::new("ab\ncd", false);
        buffer.move_right();
        assert!(buffer.insert_char('é'));
        assert_eq!(buffer.text(), "aéb\ncd");

        buffer.end();
        buffer.newline();
        buffer.insert_char('x');
        assert_eq!(buffer.text(), "aéb\nx\ncd");

        buffer.home();
        buffer.backspace();
        assert_eq!(buffer.text(), "aébx\ncd");
        assert_eq!(buffer.cursor(), (0, 3));
        assert!(buffer.is_modified());
    }

    #[test]
    fn test_read_only_buffer_rejects_edits() {
        let mut buffer = SourceBuffer::new("x: uint256", true);
        assert!(!buffer.insert_char('a'));
        assert!(!buffer.newline());
        buffer.end();
        assert!(!buffer.backspace());
        assert_eq!(buffer.text(), "x: uint256");
        assert!(!buffer.is_modified());
    }
}
