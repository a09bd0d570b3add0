//! TOML-file-backed [`ConfigStore`].
//!
//! All servers share one file with a `[servers."<id>"]` table each. Edits go
//! through `toml_edit` so comments and formatting written by hand survive,
//! inline tables included. Writers hold an advisory lock on a `.lock` sidecar
//! for the whole read-modify-write, and each write lands in a freshly created
//! staging file that is renamed over the store. Field updates are therefore
//! atomic across handles and processes sharing the file.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use fs2::FileExt;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use toml::Value;
use toml_edit::{DocumentMut, InlineTable, Item, Table};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::ConfigStore;
use crate::types::{ServerId, ServerRecord};

const SERVERS_KEY: &str = "servers";

/// Attempts at the sidecar lock before giving up, backing off from 5ms.
const LOCK_RETRIES: u32 = 10;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

/// Exclusive advisory lock on the store's sidecar file, released on drop.
struct FileLock {
    file: File,
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl FileStore {
    /// Use the file at `path`. A missing file reads as a store with no servers.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty document for `server` if it has none.
    pub async fn register(&self, server: &ServerId) -> Result<(), StoreError> {
        let created = self
            .edit(|doc| {
                let (_, created) = server_item(doc, server)?;
                Ok(created)
            })
            .await?;
        if created {
            debug!(server = %server, file = %self.path.display(), "registered server");
        }
        Ok(())
    }

    async fn read_content(&self) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => Ok(Some(c)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    /// Read, patch, and atomically replace the file under the store lock.
    ///
    /// `patch` reports whether it changed the document; unchanged documents
    /// are not written back.
    async fn edit<F>(&self, patch: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut DocumentMut) -> Result<bool, StoreError>,
    {
        let _guard = self.write_lock.lock().await;

        let dir = self.parent_dir();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| StoreError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
        let _lock = self.lock_file().await?;

        let content = self.read_content().await?.unwrap_or_default();
        let mut doc: DocumentMut =
            content
                .parse()
                .map_err(|e: toml_edit::TomlError| StoreError::Parse {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })?;

        if !patch(&mut doc)? {
            return Ok(false);
        }

        let path = self.path.clone();
        let dir = dir.to_path_buf();
        let contents = doc.to_string();
        tokio::task::spawn_blocking(move || write_replacing(&dir, &path, contents.as_bytes()))
            .await
            .map_err(|e| StoreError::Unavailable(format!("write task failed: {e}")))??;
        Ok(true)
    }

    /// Take the sidecar lock, retrying with exponential backoff while another
    /// writer holds it.
    async fn lock_file(&self) -> Result<FileLock, StoreError> {
        let lock_path = self.lock_path();
        let io_error = |source: std::io::Error| StoreError::Io {
            path: lock_path.clone(),
            source,
        };

        let file = tokio::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .await
            .map_err(io_error)?
            .into_std()
            .await;

        let contended = fs2::lock_contended_error().raw_os_error();
        for attempt in 0..=LOCK_RETRIES {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => return Ok(FileLock { file }),
                Err(e) if e.raw_os_error() == contended => {}
                Err(e) => return Err(io_error(e)),
            }
            if attempt < LOCK_RETRIES {
                tokio::time::sleep(Duration::from_millis(5 << attempt)).await;
            }
        }

        Err(StoreError::LockTimeout {
            path: lock_path.clone(),
            retries: LOCK_RETRIES,
        })
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ConfigStore for FileStore {
    async fn get(&self, server: &ServerId) -> Result<Option<ServerRecord>, StoreError> {
        let Some(content) = self.read_content().await? else {
            return Ok(None);
        };
        let mut root: toml::Table = toml::from_str(&content).map_err(|e| StoreError::Parse {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let Some(Value::Table(mut servers)) = root.remove(SERVERS_KEY) else {
            return Ok(None);
        };
        let Some(raw) = servers.remove(server.as_str()) else {
            return Ok(None);
        };

        let record = parse_record(raw, server).map_err(|e| StoreError::Parse {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Some(record))
    }

    async fn set_field(
        &self,
        server: &ServerId,
        dotted_path: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let new_value: toml_edit::Value =
            value
                .to_string()
                .parse()
                .map_err(|e: toml_edit::TomlError| StoreError::Parse {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })?;

        self.edit(|doc| {
            let segments: Vec<&str> = dotted_path.split('.').collect();
            let (leaf, parents) = segments
                .split_last()
                .ok_or_else(|| conflict(dotted_path))?;

            let (mut current, _) = server_item(doc, server)?;
            for segment in parents {
                let inline = current.is_inline_table();
                let table = current
                    .as_table_like_mut()
                    .ok_or_else(|| conflict(dotted_path))?;
                if table.get(segment).is_none() {
                    table.insert(segment, new_table(inline, true));
                }
                let child = table
                    .get_mut(segment)
                    .ok_or_else(|| conflict(dotted_path))?;
                if !child.is_table_like() {
                    return Err(conflict(dotted_path));
                }
                current = child;
            }
            current
                .as_table_like_mut()
                .ok_or_else(|| conflict(dotted_path))?
                .insert(leaf, toml_edit::value(new_value));
            Ok(true)
        })
        .await?;

        debug!(server = %server, path = dotted_path, file = %self.path.display(), "set field");
        Ok(())
    }

    async fn unset_field(&self, server: &ServerId, dotted_path: &str) -> Result<(), StoreError> {
        if self.read_content().await?.is_none() {
            return Ok(());
        }
        let removed = self
            .edit(|doc| {
                let segments: Vec<&str> = dotted_path.split('.').collect();
                let Some((leaf, parents)) = segments.split_last() else {
                    return Ok(false);
                };
                let removed = doc
                    .get_mut(SERVERS_KEY)
                    .and_then(|servers| servers.get_mut(server.as_str()))
                    .is_some_and(|item| remove_item(item, parents, leaf));
                Ok(removed)
            })
            .await?;

        debug!(server = %server, path = dotted_path, removed, "unset field");
        Ok(())
    }
}

fn conflict(path: &str) -> StoreError {
    StoreError::PathConflict { path: path.into() }
}

/// An empty table to place under a parent. Inline parents only hold values,
/// so they get an inline table.
fn new_table(inline: bool, implicit: bool) -> Item {
    if inline {
        return Item::Value(toml_edit::Value::InlineTable(InlineTable::new()));
    }
    let mut table = Table::new();
    table.set_implicit(implicit);
    Item::Table(table)
}

/// The `[servers."<id>"]` item, created if missing, and whether it was created.
fn server_item<'a>(
    doc: &'a mut DocumentMut,
    server: &ServerId,
) -> Result<(&'a mut Item, bool), StoreError> {
    let servers = doc
        .as_table_mut()
        .entry(SERVERS_KEY)
        .or_insert(new_table(false, true));
    let inline = servers.is_inline_table();
    let servers = servers
        .as_table_like_mut()
        .ok_or_else(|| conflict(SERVERS_KEY))?;

    let created = servers.get(server.as_str()).is_none();
    if created {
        servers.insert(server.as_str(), new_table(inline, false));
    }
    let item = servers
        .get_mut(server.as_str())
        .ok_or_else(|| conflict(&format!("{SERVERS_KEY}.{server}")))?;
    if !item.is_table_like() {
        return Err(conflict(&format!("{SERVERS_KEY}.{server}")));
    }
    Ok((item, created))
}

/// Write `contents` to a new staging file in `dir`, then rename it over `path`.
fn write_replacing(dir: &Path, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let mut staging = NamedTempFile::new_in(dir).map_err(|e| StoreError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    if let Err(e) = staging.write_all(contents) {
        return Err(StoreError::Io {
            path: staging.path().to_path_buf(),
            source: e,
        });
    }
    staging.persist(path).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Remove `leaf` under `parents`, pruning tables the removal leaves empty.
fn remove_item(item: &mut Item, parents: &[&str], leaf: &str) -> bool {
    let Some(table) = item.as_table_like_mut() else {
        return false;
    };
    match parents.split_first() {
        None => table.remove(leaf).is_some(),
        Some((first, rest)) => {
            let Some(child) = table.get_mut(first) else {
                return false;
            };
            let removed = remove_item(child, rest, leaf);
            if removed && child.as_table_like().is_some_and(|t| t.is_empty()) {
                table.remove(first);
            }
            removed
        }
    }
}

/// Deserialize a server document, warning about keys nothing reads.
fn parse_record(raw: Value, server: &ServerId) -> Result<ServerRecord, toml::de::Error> {
    let mut unknown: Vec<String> = Vec::new();
    let record: ServerRecord = serde_ignored::deserialize(raw, |path| {
        unknown.push(path.to_string());
    })?;
    for key in unknown {
        warn!(server = %server, key = %key, "ignoring unknown key in server document");
    }
    Ok(record)
}
