//! host::memory
//!
//! In-memory host directory tree.
//!
//! Useful for embedders whose host capability is not a local path, and for
//! tests. Handles share nodes: a subdirectory handle sees writes made
//! through its parent and vice versa. Individual files can be marked
//! unreadable or read-only to simulate host permission quirks, and carry an
//! executable flag like a file mode would.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use super::{
    validate_name, EntryKind, HostDirectory, HostEntry, HostError, HostFile, HostWritable,
};
use crate::core::paths;

#[derive(Debug, Default)]
struct MemDir {
    entries: RwLock<BTreeMap<String, MemNode>>,
}

#[derive(Debug, Clone)]
enum MemNode {
    Dir(Arc<MemDir>),
    File(Arc<MemFile>),
}

#[derive(Debug, Default)]
struct MemFile {
    data: RwLock<Vec<u8>>,
    unreadable: AtomicBool,
    read_only: AtomicBool,
    executable: AtomicBool,
}

impl MemDir {
    fn child(&self, name: &str) -> Option<MemNode> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Get or create a child directory. Fails if a file has that name.
    fn ensure_dir(&self, name: &str) -> Result<Arc<MemDir>, HostError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries
            .entry(name.to_string())
            .or_insert_with(|| MemNode::Dir(Arc::default()))
        {
            MemNode::Dir(dir) => Ok(dir.clone()),
            MemNode::File(_) => Err(HostError::TypeMismatch {
                name: name.to_string(),
                expected: EntryKind::Directory,
            }),
        }
    }

    /// Get or create a child file. Fails if a directory has that name.
    fn ensure_file(&self, name: &str) -> Result<Arc<MemFile>, HostError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries
            .entry(name.to_string())
            .or_insert_with(|| MemNode::File(Arc::default()))
        {
            MemNode::File(file) => Ok(file.clone()),
            MemNode::Dir(_) => Err(HostError::TypeMismatch {
                name: name.to_string(),
                expected: EntryKind::File,
            }),
        }
    }

    fn collect(&self, prefix: &str, files: &mut BTreeMap<String, Vec<u8>>, dirs: &mut BTreeSet<String>) {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        for (name, node) in entries.iter() {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", prefix, name)
            };
            match node {
                MemNode::Dir(dir) => {
                    dirs.insert(path.clone());
                    dir.collect(&path, files, dirs);
                }
                MemNode::File(file) => {
                    let data = file.data.read().unwrap_or_else(PoisonError::into_inner);
                    files.insert(path, data.clone());
                }
            }
        }
    }
}

/// In-memory directory handle.
#[derive(Debug, Clone)]
pub struct MemoryHostDirectory {
    name: String,
    dir: Arc<MemDir>,
}

impl MemoryHostDirectory {
    /// An empty tree whose root is called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dir: Arc::default(),
        }
    }

    /// Shared-handle form used by the mirror and facade.
    pub fn shared(&self) -> Arc<dyn HostDirectory> {
        Arc::new(self.clone())
    }

    /// Walk to the directory holding `path`'s last segment, creating
    /// intermediate directories.
    fn parent_of(&self, path: &str) -> Result<(Arc<MemDir>, String), HostError> {
        let normalized = paths::normalize(path);
        let mut segments = paths::segments(&normalized);
        let leaf = segments.pop().ok_or_else(|| HostError::InvalidName {
            name: path.to_string(),
        })?;
        validate_name(leaf)?;

        let mut dir = self.dir.clone();
        for segment in segments {
            validate_name(segment)?;
            dir = dir.ensure_dir(segment)?;
        }
        Ok((dir, leaf.to_string()))
    }

    fn lookup_file(&self, path: &str) -> Option<Arc<MemFile>> {
        let normalized = paths::normalize(path);
        let segments = paths::segments(&normalized);
        let (leaf, parents) = segments.split_last()?;
        let mut dir = self.dir.clone();
        for segment in parents {
            match dir.child(segment)? {
                MemNode::Dir(next) => dir = next,
                MemNode::File(_) => return None,
            }
        }
        match dir.child(leaf)? {
            MemNode::File(file) => Some(file),
            MemNode::Dir(_) => None,
        }
    }

    /// Create or replace a file at a `/`-separated relative path.
    pub fn insert_file(&self, path: &str, bytes: impl Into<Vec<u8>>) -> Result<(), HostError> {
        let (dir, leaf) = self.parent_of(path)?;
        let file = dir.ensure_file(&leaf)?;
        *file.data.write().unwrap_or_else(PoisonError::into_inner) = bytes.into();
        Ok(())
    }

    /// Create a directory (and parents) at a relative path.
    pub fn insert_dir(&self, path: &str) -> Result<(), HostError> {
        let (dir, leaf) = self.parent_of(path)?;
        dir.ensure_dir(&leaf).map(|_| ())
    }

    /// Contents of the file at a relative path.
    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        let file = self.lookup_file(path)?;
        let data = file.data.read().unwrap_or_else(PoisonError::into_inner);
        Some(data.clone())
    }

    /// Whether any entry exists at a relative path.
    pub fn contains(&self, path: &str) -> bool {
        let (files, dirs) = self.snapshot();
        let normalized = paths::join(&[path]);
        files.contains_key(&normalized) || dirs.contains(&normalized)
    }

    /// Every file (by relative path) and every directory in the tree.
    pub fn snapshot(&self) -> (BTreeMap<String, Vec<u8>>, BTreeSet<String>) {
        let mut files = BTreeMap::new();
        let mut dirs = BTreeSet::new();
        self.dir.collect("", &mut files, &mut dirs);
        (files, dirs)
    }

    /// Make reads of a file fail with `PermissionDenied`.
    pub fn set_unreadable(&self, path: &str) -> bool {
        self.lookup_file(path)
            .map(|f| f.unreadable.store(true, Ordering::SeqCst))
            .is_some()
    }

    /// Mark a file executable.
    pub fn set_executable(&self, path: &str) -> bool {
        self.lookup_file(path)
            .map(|f| f.executable.store(true, Ordering::SeqCst))
            .is_some()
    }

    /// Whether the file at a relative path is marked executable.
    pub fn is_executable(&self, path: &str) -> bool {
        self.lookup_file(path)
            .is_some_and(|f| f.executable.load(Ordering::SeqCst))
    }

    /// Make writes to a file fail with `PermissionDenied`.
    pub fn set_read_only(&self, path: &str) -> bool {
        self.lookup_file(path)
            .map(|f| f.read_only.store(true, Ordering::SeqCst))
            .is_some()
    }
}

#[async_trait]
impl HostDirectory for MemoryHostDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_entries(&self) -> Result<Vec<HostEntry>, HostError> {
        let entries = self.dir.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .iter()
            .map(|(name, node)| HostEntry {
                name: name.clone(),
                kind: match node {
                    MemNode::Dir(_) => EntryKind::Directory,
                    MemNode::File(_) => EntryKind::File,
                },
            })
            .collect())
    }

    async fn get_subdirectory(
        &self,
        name: &str,
        create_if_missing: bool,
    ) -> Result<Arc<dyn HostDirectory>, HostError> {
        validate_name(name)?;
        let dir = match self.dir.child(name) {
            Some(MemNode::Dir(dir)) => dir,
            Some(MemNode::File(_)) => {
                return Err(HostError::TypeMismatch {
                    name: name.to_string(),
                    expected: EntryKind::Directory,
                })
            }
            None if create_if_missing => self.dir.ensure_dir(name)?,
            None => {
                return Err(HostError::NotFound {
                    name: name.to_string(),
                })
            }
        };
        Ok(Arc::new(MemoryHostDirectory {
            name: name.to_string(),
            dir,
        }))
    }

    async fn get_file(
        &self,
        name: &str,
        create_if_missing: bool,
    ) -> Result<Arc<dyn HostFile>, HostError> {
        validate_name(name)?;
        let file = match self.dir.child(name) {
            Some(MemNode::File(file)) => file,
            Some(MemNode::Dir(_)) => {
                return Err(HostError::TypeMismatch {
                    name: name.to_string(),
                    expected: EntryKind::File,
                })
            }
            None if create_if_missing => self.dir.ensure_file(name)?,
            None => {
                return Err(HostError::NotFound {
                    name: name.to_string(),
                })
            }
        };
        Ok(Arc::new(MemoryHostFile {
            name: name.to_string(),
            file,
        }))
    }

    async fn remove_entry(&self, name: &str) -> Result<(), HostError> {
        validate_name(name)?;
        let mut entries = self.dir.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.get(name) {
            None => {
                return Err(HostError::NotFound {
                    name: name.to_string(),
                })
            }
            Some(MemNode::Dir(dir))
                if !dir
                    .entries
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_empty() =>
            {
                return Err(HostError::NotEmpty {
                    name: name.to_string(),
                })
            }
            Some(_) => {}
        }
        entries.remove(name);
        Ok(())
    }
}

#[derive(Debug)]
struct MemoryHostFile {
    name: String,
    file: Arc<MemFile>,
}

#[async_trait]
impl HostFile for MemoryHostFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_all_bytes(&self) -> Result<Vec<u8>, HostError> {
        if self.file.unreadable.load(Ordering::SeqCst) {
            return Err(HostError::PermissionDenied {
                name: self.name.clone(),
            });
        }
        let data = self.file.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data.clone())
    }

    async fn open_for_write(&self) -> Result<Box<dyn HostWritable>, HostError> {
        if self.file.read_only.load(Ordering::SeqCst) {
            return Err(HostError::PermissionDenied {
                name: self.name.clone(),
            });
        }
        Ok(Box::new(MemoryWritable {
            name: self.name.clone(),
            file: self.file.clone(),
            buffer: Vec::new(),
            executable: false,
            closed: false,
        }))
    }

    async fn is_executable(&self) -> Result<bool, HostError> {
        Ok(self.file.executable.load(Ordering::SeqCst))
    }
}

struct MemoryWritable {
    name: String,
    file: Arc<MemFile>,
    buffer: Vec<u8>,
    executable: bool,
    closed: bool,
}

#[async_trait]
impl HostWritable for MemoryWritable {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), HostError> {
        if self.closed {
            return Err(HostError::Closed {
                name: self.name.clone(),
            });
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    fn set_executable(&mut self) {
        self.executable = true;
    }

    async fn close(&mut self) -> Result<(), HostError> {
        if self.closed {
            return Err(HostError::Closed {
                name: self.name.clone(),
            });
        }
        self.closed = true;
        if self.executable {
            self.file.executable.store(true, Ordering::SeqCst);
        }
        let mut data = self.file.data.write().unwrap_or_else(PoisonError::into_inner);
        *data = std::mem::take(&mut self.buffer);
        Ok(())
    }
}
