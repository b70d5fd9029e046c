//! Optimistic transactions over a [`StoreHandle`].

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use letusconnect_core::result::AppResult;
use letusconnect_core::traits::store::{CommitOutcome, ReadStamp, WriteOp};

use crate::codec;
use crate::handle::StoreHandle;

type Key = (String, String);

/// A unit of reads and buffered writes committed atomically.
///
/// The first read of every document records its version. Later reads and
/// reads after a write see the transaction's own view. Nothing reaches the
/// store until [`commit`](Self::commit).
#[derive(Debug)]
pub struct Transaction {
    handle: StoreHandle,
    reads: Vec<ReadStamp>,
    view: HashMap<Key, Option<Value>>,
    writes: Vec<WriteOp>,
}

impl Transaction {
    pub(crate) fn new(handle: StoreHandle) -> Self {
        Self {
            handle,
            reads: Vec::new(),
            view: HashMap::new(),
            writes: Vec::new(),
        }
    }

    /// Read a document as a typed record.
    pub async fn get<T: DeserializeOwned>(&mut self, collection: &str, id: &str) -> AppResult<Option<T>> {
        let k = key(collection, id);
        if !self.view.contains_key(&k) {
            let doc = self.handle.get(collection, id).await?;
            self.reads.push(ReadStamp {
                collection: collection.to_string(),
                id: id.to_string(),
                version: doc.as_ref().map_or(0, |d| d.version),
            });
            self.view.insert(k.clone(), doc.map(|d| d.data));
        }
        match self.view.get(&k) {
            Some(Some(data)) => codec::decode(collection, id, data).map(Some),
            _ => Ok(None),
        }
    }

    /// Replace a document.
    pub fn set<T: Serialize>(&mut self, collection: &str, id: &str, record: &T) -> AppResult<()> {
        let data = codec::encode(record)?;
        self.view.insert(key(collection, id), Some(data.clone()));
        self.writes.push(WriteOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
        });
        Ok(())
    }

    /// Merge top-level fields into a document.
    pub fn merge(&mut self, collection: &str, id: &str, patch: serde_json::Map<String, Value>) {
        let entry = self.view.entry(key(collection, id)).or_insert(None);
        match entry {
            Some(Value::Object(fields)) => fields.extend(patch.clone()),
            _ => *entry = Some(Value::Object(patch.clone())),
        }
        self.writes.push(WriteOp::Merge {
            collection: collection.to_string(),
            id: id.to_string(),
            patch: Value::Object(patch),
        });
    }

    /// Delete a document.
    pub fn delete(&mut self, collection: &str, id: &str) {
        self.view.insert(key(collection, id), None);
        self.writes.push(WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
    }

    /// Whether any write is buffered.
    pub fn has_writes(&self) -> bool {
        !self.writes.is_empty()
    }

    /// Submit the transaction. A transaction without writes commits trivially.
    pub async fn commit(self) -> AppResult<CommitOutcome> {
        if self.writes.is_empty() {
            return Ok(CommitOutcome::Committed);
        }
        self.handle.commit(&self.reads, self.writes).await
    }
}

fn key(collection: &str, id: &str) -> Key {
    (collection.to_string(), id.to_string())
}
