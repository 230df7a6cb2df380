//! Dispatcher (routing set) adapters
//!
//! `dispatcher.list` answers with upper-case keys nested several levels
//! deep (`RECORDS[].SET.TARGETS[].DEST`). The wire structs mirror that
//! layout and are flattened into [`DispatcherTable`] before leaving this
//! module.

use crate::wire::null_as_empty;
use crate::{KamailioClient, NotFoundPolicy};
use kamrpc_core::Result;
use serde::{Deserialize, Serialize};

/// Routing mode used when the caller gives none
pub const DEFAULT_RMODE: &str = "full";

/// Every dispatcher set known to the upstream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatcherTable {
    /// Number of sets as reported by the upstream
    pub set_count: i64,
    /// Sets in upstream order
    pub sets: Vec<DispatcherSet>,
}

/// One routing group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatcherSet {
    /// Group number
    pub id: i64,
    /// Destinations in upstream order
    pub targets: Vec<DispatcherTarget>,
}

/// One destination within a set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatcherTarget {
    /// SIP URI of the destination
    pub uri: String,
    /// State flags, e.g. `AP` (active, probing)
    pub flags: String,
    /// Priority within the set
    pub priority: i64,
    /// Current dialog load
    pub load: i64,
}

#[derive(Serialize)]
struct ListParams<'a> {
    #[serde(rename = "_rmode_")]
    rmode: &'a str,
}

#[derive(Serialize)]
struct AddParams<'a> {
    #[serde(rename = "_group_")]
    group: &'a str,
    #[serde(rename = "_address_")]
    address: &'a str,
    #[serde(rename = "_flags_")]
    flags: &'a str,
    #[serde(rename = "_priority_")]
    priority: &'a str,
    #[serde(rename = "_attrs_")]
    attrs: &'a str,
}

#[derive(Serialize)]
struct RemoveParams<'a> {
    #[serde(rename = "_group_")]
    group: &'a str,
    #[serde(rename = "_address_")]
    address: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct ListReply {
    #[serde(default)]
    nrsets: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    records: Vec<SetRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct SetRecord {
    set: WireSet,
}

#[derive(Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct WireSet {
    id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    targets: Vec<TargetRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct TargetRecord {
    dest: WireDest,
}

#[derive(Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct WireDest {
    uri: String,
    #[serde(default)]
    flags: String,
    #[serde(default)]
    priority: i64,
    #[serde(default)]
    runtime: Option<WireRuntime>,
}

#[derive(Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct WireRuntime {
    #[serde(default)]
    dlgload: i64,
}

impl From<ListReply> for DispatcherTable {
    fn from(reply: ListReply) -> Self {
        let sets = reply
            .records
            .into_iter()
            .map(|record| DispatcherSet {
                id: record.set.id,
                targets: record
                    .set
                    .targets
                    .into_iter()
                    .map(|t| DispatcherTarget {
                        uri: t.dest.uri,
                        flags: t.dest.flags,
                        priority: t.dest.priority,
                        load: t.dest.runtime.map(|r| r.dlgload).unwrap_or_default(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            set_count: reply.nrsets,
            sets,
        }
    }
}

impl KamailioClient {
    /// List every dispatcher set (`dispatcher.list`)
    ///
    /// `rmode` defaults to `"full"` when `None` or empty.
    pub async fn dispatcher_list(&self, rmode: Option<&str>) -> Result<DispatcherTable> {
        let rmode = rmode.filter(|m| !m.is_empty()).unwrap_or(DEFAULT_RMODE);
        tracing::debug!(rmode, "dispatcher list");

        let reply: Option<ListReply> = self
            .call("dispatcher.list", Some(ListParams { rmode }))
            .await?;
        Ok(reply.map(DispatcherTable::from).unwrap_or_default())
    }

    /// Add a destination to a set (`dispatcher.add`)
    ///
    /// All values are forwarded verbatim as strings.
    pub async fn dispatcher_add(
        &self,
        group: &str,
        address: &str,
        flags: &str,
        priority: &str,
        attrs: &str,
    ) -> Result<()> {
        tracing::debug!(group, address, flags, priority, attrs, "dispatcher add");

        let params = AddParams {
            group,
            address,
            flags,
            priority,
            attrs,
        };
        self.call_unit("dispatcher.add", Some(params), NotFoundPolicy::Fail)
            .await
    }

    /// Remove a destination from a set (`dispatcher.remove`)
    ///
    /// Removing an unknown destination surfaces whatever the upstream says.
    pub async fn dispatcher_remove(&self, group: &str, address: &str) -> Result<()> {
        tracing::debug!(group, address, "dispatcher remove");

        let params = RemoveParams { group, address };
        self.call_unit("dispatcher.remove", Some(params), NotFoundPolicy::Fail)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_reply_flattening() {
        let reply: ListReply = serde_json::from_value(json!({
            "NRSETS": 2,
            "RECORDS": [
                {"SET": {"ID": 1, "TARGETS": [
                    {"DEST": {"URI": "sip:10.0.0.1:5060", "FLAGS": "AP", "PRIORITY": 8,
                              "RUNTIME": {"DLGLOAD": 3}}},
                    {"DEST": {"URI": "sip:10.0.0.2:5060", "FLAGS": "IP", "PRIORITY": 0}}
                ]}},
                {"SET": {"ID": 2, "TARGETS": null}}
            ]
        }))
        .unwrap();

        let table = DispatcherTable::from(reply);
        assert_eq!(table.set_count, 2);
        assert_eq!(table.sets.len(), 2);
        assert_eq!(
            table.sets[0].targets[0],
            DispatcherTarget {
                uri: "sip:10.0.0.1:5060".into(),
                flags: "AP".into(),
                priority: 8,
                load: 3,
            }
        );
        assert_eq!(table.sets[0].targets[1].load, 0);
        assert!(table.sets[1].targets.is_empty());
    }

    #[test]
    fn test_add_params_wire_names() {
        let params = AddParams {
            group: "1",
            address: "sip:10.0.0.3",
            flags: "0",
            priority: "5",
            attrs: "duid=abc",
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"_group_": "1", "_address_": "sip:10.0.0.3", "_flags_": "0",
                   "_priority_": "5", "_attrs_": "duid=abc"})
        );
    }
}
