//! `RocksDB` document store for embedded persistence.
//!
//! Wraps the `rocksdb` crate behind the [`DocumentStore`] trait. Each
//! document is stored as JSON under `<collection>/<_id>`; since ids are
//! UUID v7, a prefix scan yields documents in insertion order. All
//! operations are dispatched to a blocking thread via
//! [`tokio::task::spawn_blocking`] since `RocksDB` is a synchronous C++ library.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rocksdb::{DBWithThreadMode, MultiThreaded, Options};
use tracing::{debug, info};

use crate::{apply_set, assign_id, matches, Document, DocumentStore, StorageError, ID_FIELD};

type Db = DBWithThreadMode<MultiThreaded>;

/// A document collection backed by `RocksDB`.
///
/// Thread-safe (`Arc<DB>` internally) and safe to share across async tasks.
///
/// # Examples
///
/// ```no_run
/// # use passop_storage::RocksDbBackend;
/// let backend = RocksDbBackend::open("/var/lib/passop/data", "passwords").unwrap();
/// ```
#[derive(Clone)]
pub struct RocksDbBackend {
    db: Arc<Db>,
    path: PathBuf,
    prefix: String,
}

impl std::fmt::Debug for RocksDbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbBackend")
            .field("path", &self.path)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl RocksDbBackend {
    /// Open a `RocksDB` database at the given path, scoped to `collection`.
    ///
    /// Creates the database directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if `RocksDB` fails to open or create the
    /// database at the specified path.
    pub fn open(path: impl AsRef<Path>, collection: &str) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = Db::open(&opts, path).map_err(|e| StorageError::Open {
            location: path.display().to_string(),
            reason: e.to_string(),
        })?;

        info!(path = %path.display(), collection, "rocksdb document store opened");
        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
            prefix: format!("{collection}/"),
        })
    }

    /// Run `f` on the blocking pool, mapping a join failure through `on_panic`.
    async fn blocking<T, F>(
        &self,
        f: F,
        on_panic: impl FnOnce(String) -> StorageError,
    ) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Db, &str) -> Result<T, StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let prefix = self.prefix.clone();
        tokio::task::spawn_blocking(move || f(&db, &prefix))
            .await
            .map_err(|e| on_panic(format!("blocking task panicked: {e}")))?
    }
}

/// Scan every `(key, document)` pair under `prefix`.
fn scan(db: &Db, prefix: &str) -> Result<Vec<(Vec<u8>, Document)>, StorageError> {
    let iter = db.iterator(rocksdb::IteratorMode::From(
        prefix.as_bytes(),
        rocksdb::Direction::Forward,
    ));

    let mut docs = Vec::new();
    for item in iter {
        let (k, v) = item.map_err(|e| StorageError::Read {
            collection: prefix.trim_end_matches('/').to_owned(),
            reason: e.to_string(),
        })?;
        if !k.starts_with(prefix.as_bytes()) {
            break;
        }
        let doc: Document = serde_json::from_slice(&v).map_err(|e| StorageError::Decode {
            key: String::from_utf8_lossy(&k).into_owned(),
            reason: e.to_string(),
        })?;
        docs.push((k.to_vec(), doc));
    }
    Ok(docs)
}

fn doc_id(doc: &Document) -> String {
    doc.get(ID_FIELD)
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

#[async_trait::async_trait]
impl DocumentStore for RocksDbBackend {
    async fn find_all(&self) -> Result<Vec<Document>, StorageError> {
        self.blocking(
            |db, prefix| Ok(scan(db, prefix)?.into_iter().map(|(_, d)| d).collect()),
            |reason| StorageError::Read {
                collection: self.prefix.trim_end_matches('/').to_owned(),
                reason,
            },
        )
        .await
    }

    async fn insert_one(&self, doc: Document) -> Result<Document, StorageError> {
        let (id, doc) = assign_id(doc);
        let failed_id = id.clone();
        self.blocking(
            move |db, prefix| {
                let bytes = serde_json::to_vec(&doc).map_err(|e| StorageError::Encode {
                    id: id.clone(),
                    reason: e.to_string(),
                })?;
                db.put(format!("{prefix}{id}").as_bytes(), bytes)
                    .map_err(|e| StorageError::Write {
                        id,
                        reason: e.to_string(),
                    })?;
                Ok(doc)
            },
            |reason| StorageError::Write {
                id: failed_id,
                reason,
            },
        )
        .await
    }

    async fn delete_one(&self, filter: &Document) -> Result<u64, StorageError> {
        let filter = filter.clone();
        self.blocking(
            move |db, prefix| {
                let Some((key, doc)) = scan(db, prefix)?
                    .into_iter()
                    .find(|(_, d)| matches(d, &filter))
                else {
                    return Ok(0);
                };
                db.delete(&key).map_err(|e| StorageError::Delete {
                    id: doc_id(&doc),
                    reason: e.to_string(),
                })?;
                Ok(1)
            },
            |reason| StorageError::Delete {
                id: String::new(),
                reason,
            },
        )
        .await
    }

    async fn update_one(
        &self,
        filter: &Document,
        set: &Document,
    ) -> Result<Option<Document>, StorageError> {
        let filter = filter.clone();
        let set = set.clone();
        self.blocking(
            move |db, prefix| {
                let Some((key, mut doc)) = scan(db, prefix)?
                    .into_iter()
                    .find(|(_, d)| matches(d, &filter))
                else {
                    return Ok(None);
                };
                apply_set(&mut doc, &set);
                let id = doc_id(&doc);
                let bytes = serde_json::to_vec(&doc).map_err(|e| StorageError::Encode {
                    id: id.clone(),
                    reason: e.to_string(),
                })?;
                db.put(&key, bytes).map_err(|e| StorageError::Write {
                    id,
                    reason: e.to_string(),
                })?;
                Ok(Some(doc))
            },
            |reason| StorageError::Write {
                id: String::new(),
                reason,
            },
        )
        .await
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.blocking(
            |db, _| {
                db.flush().map_err(|e| StorageError::Close {
                    reason: e.to_string(),
                })
            },
            |reason| StorageError::Close { reason },
        )
        .await?;
        debug!(path = %self.path.display(), "rocksdb flushed");
        Ok(())
    }
}
