//! Key-value table (htable) adapters
//!
//! Native upstream calls: dump, set (string and integer), get, delete and
//! flush. Queries are not native: they dump the whole table and filter
//! locally, and delete-by-query chains a query with one delete per matching
//! slot.
//!
//! Dumps keep the upstream order. The upstream groups slots by hash bucket
//! (`entry`), so one [`HTableEntry`] may hold several unrelated keys.

use crate::slot::{decode_optional, raw_value};
use crate::wire::null_as_empty;
use crate::{KamailioClient, NotFoundPolicy, SlotValue};
use kamrpc_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// One hash bucket of a table dump
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HTableEntry {
    /// Bucket index
    #[serde(default)]
    pub entry: i64,
    /// Number of slots the upstream reports for the bucket
    #[serde(default)]
    pub size: i64,
    /// Slots in upstream order
    #[serde(rename = "slot", default, deserialize_with = "null_as_empty")]
    pub slots: Vec<HTableSlot>,
}

/// One key/value pair
///
/// The value is decoded through [`SlotValue::decode`], so a slot is never
/// dropped because its `type` tag disagrees with its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireSlot")]
pub struct HTableSlot {
    /// Key
    pub name: String,
    /// Value normalized to text
    pub value: SlotValue,
    /// Type tag as sent by the upstream
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Deserialize)]
struct WireSlot {
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "raw_value")]
    value: Option<Box<RawValue>>,
    #[serde(default, rename = "type")]
    tag: Option<String>,
}

impl From<WireSlot> for HTableSlot {
    fn from(wire: WireSlot) -> Self {
        let value = decode_optional(wire.tag.as_deref(), wire.value.as_deref());
        Self {
            name: wire.name,
            value,
            tag: wire.tag,
        }
    }
}

/// Local filter applied to a table dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableQuery {
    /// Slot key contains the substring
    KeyContains(String),
    /// Slot value (normalized text) contains the substring
    ValueContains(String),
    /// Slot key contains `key` or slot value contains `value`
    KeyOrValueContains {
        /// Substring searched in the key
        key: String,
        /// Substring searched in the value
        value: String,
    },
}

impl TableQuery {
    /// Case-sensitive substring test against one slot
    pub fn matches(&self, slot: &HTableSlot) -> bool {
        match self {
            TableQuery::KeyContains(needle) => slot.name.contains(needle.as_str()),
            TableQuery::ValueContains(needle) => slot.value.contains(needle),
            TableQuery::KeyOrValueContains { key, value } => {
                slot.name.contains(key.as_str()) || slot.value.contains(value)
            }
        }
    }

    /// Keep only matching slots; buckets left empty are dropped
    ///
    /// ```rust
    /// use kamrpc_client::{HTableEntry, HTableSlot, SlotValue, TableQuery};
    ///
    /// let slot = |name: &str| HTableSlot {
    ///     name: name.into(),
    ///     value: SlotValue::Str("1".into()),
    ///     tag: Some("str".into()),
    /// };
    /// let dump = vec![HTableEntry { entry: 0, size: 2, slots: vec![slot("user:alice"), slot("user:bob")] }];
    ///
    /// let hits = TableQuery::KeyContains("alice".into()).filter(dump);
    /// assert_eq!(hits[0].slots.len(), 1);
    /// assert_eq!(hits[0].slots[0].name, "user:alice");
    /// ```
    pub fn filter(&self, entries: Vec<HTableEntry>) -> Vec<HTableEntry> {
        entries
            .into_iter()
            .filter_map(|mut entry| {
                entry.slots.retain(|slot| self.matches(slot));
                (!entry.slots.is_empty()).then_some(entry)
            })
            .collect()
    }
}

/// Outcome of a delete-by-query run
///
/// Deletions are independent: a failure is recorded and the run continues,
/// and completed deletions are never rolled back.
#[derive(Debug, Clone, Default)]
pub struct BulkDeleteReport {
    /// Keys deleted (or already absent upstream)
    pub deleted: Vec<String>,
    /// Keys whose delete failed, with the error
    pub failed: Vec<(String, Error)>,
}

impl BulkDeleteReport {
    /// True when no delete failed
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Serialize)]
struct TableParams<'a> {
    htable: &'a str,
}

#[derive(Serialize)]
struct KeyParams<'a> {
    htable: &'a str,
    key: &'a str,
}

#[derive(Serialize)]
struct SetParams<'a, V> {
    htable: &'a str,
    key: &'a str,
    value: V,
}

#[derive(Deserialize)]
struct GetReply {
    #[serde(default)]
    item: Option<WireItem>,
}

#[derive(Deserialize)]
struct WireItem {
    #[serde(default, deserialize_with = "raw_value")]
    value: Option<Box<RawValue>>,
}

impl KamailioClient {
    /// Dump every slot of a table (`htable.dump`)
    ///
    /// An empty or missing result is an empty list, not an error.
    pub async fn htable_dump(&self, table: &str) -> Result<Vec<HTableEntry>> {
        tracing::debug!(table, "htable dump");

        let entries: Option<Vec<HTableEntry>> = self
            .call("htable.dump", Some(TableParams { htable: table }))
            .await?;
        Ok(entries.unwrap_or_default())
    }

    /// Store a string value (`htable.sets`)
    pub async fn htable_sets(&self, table: &str, key: &str, value: &str) -> Result<()> {
        tracing::debug!(table, key, value, "htable set string");

        let params = SetParams {
            htable: table,
            key,
            value,
        };
        self.call_unit("htable.sets", Some(params), NotFoundPolicy::Fail)
            .await
    }

    /// Store an integer value (`htable.seti`)
    pub async fn htable_seti(&self, table: &str, key: &str, value: i64) -> Result<()> {
        tracing::debug!(table, key, value, "htable set integer");

        let params = SetParams {
            htable: table,
            key,
            value,
        };
        self.call_unit("htable.seti", Some(params), NotFoundPolicy::Fail)
            .await
    }

    /// Read one value as text (`htable.get`)
    ///
    /// A 200 reply without an item reads as `""`, the same as a key holding
    /// an empty string. An upstream 404 is `Error::NotFound`.
    pub async fn htable_get(&self, table: &str, key: &str) -> Result<String> {
        tracing::debug!(table, key, "htable get");

        let reply: Option<GetReply> = self
            .call_with(
                "htable.get",
                Some(KeyParams { htable: table, key }),
                NotFoundPolicy::Report,
            )
            .await
            .map_err(|e| match e {
                Error::NotFound(_) => Error::NotFound(format!("{}/{}", table, key)),
                other => other,
            })?;

        let value = reply
            .and_then(|r| r.item)
            .map(|item| decode_optional(None, item.value.as_deref()).into_string())
            .unwrap_or_default();
        Ok(value)
    }

    /// Delete one key (`htable.delete`)
    ///
    /// Idempotent: an upstream 404 counts as success.
    pub async fn htable_delete(&self, table: &str, key: &str) -> Result<()> {
        tracing::debug!(table, key, "htable delete");

        self.call_unit(
            "htable.delete",
            Some(KeyParams { htable: table, key }),
            NotFoundPolicy::Absorb,
        )
        .await
    }

    /// Remove every key of a table (`htable.flush`)
    pub async fn htable_flush(&self, table: &str) -> Result<()> {
        tracing::debug!(table, "htable flush");

        let result: Option<serde_json::Value> = self
            .call("htable.flush", Some(TableParams { htable: table }))
            .await?;
        tracing::debug!(table, result = ?result, "htable flushed");
        Ok(())
    }

    /// Dump a table and keep the slots matching `query`
    pub async fn htable_query(&self, table: &str, query: &TableQuery) -> Result<Vec<HTableEntry>> {
        tracing::debug!(table, query = ?query, "htable query");

        let entries = self.htable_dump(table).await?;
        Ok(query.filter(entries))
    }

    /// Slots whose key contains `needle`
    pub async fn htable_query_key_contains(
        &self,
        table: &str,
        needle: &str,
    ) -> Result<Vec<HTableEntry>> {
        self.htable_query(table, &TableQuery::KeyContains(needle.to_string()))
            .await
    }

    /// Slots whose value contains `needle`
    pub async fn htable_query_value_contains(
        &self,
        table: &str,
        needle: &str,
    ) -> Result<Vec<HTableEntry>> {
        self.htable_query(table, &TableQuery::ValueContains(needle.to_string()))
            .await
    }

    /// Delete every slot matching `query`, one call per key
    ///
    /// Fails only if the initial dump fails. Individual delete failures are
    /// logged and collected in the report; the remaining keys are still
    /// attempted.
    pub async fn htable_delete_by_query(
        &self,
        table: &str,
        query: &TableQuery,
    ) -> Result<BulkDeleteReport> {
        let matches = self.htable_query(table, query).await?;
        let mut report = BulkDeleteReport::default();

        for slot in matches.into_iter().flat_map(|entry| entry.slots) {
            tracing::debug!(table, name = %slot.name, query = ?query, "deleting matching record");
            match self.htable_delete(table, &slot.name).await {
                Ok(()) => report.deleted.push(slot.name),
                Err(e) => {
                    tracing::error!(
                        table,
                        name = %slot.name,
                        query = ?query,
                        error = %e,
                        "could not delete matching record"
                    );
                    report.failed.push((slot.name, e));
                }
            }
        }

        if let Some(m) = self.metrics() {
            m.record_bulk_delete(report.deleted.len() as u64, report.failed.len() as u64);
        }
        tracing::info!(
            table,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "delete by query finished"
        );

        Ok(report)
    }
}
