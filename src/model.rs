// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::{btree_map, BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// A single key line read out of a host's authorized keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct KeyEntry {
    pub(crate) key_type: String,
    /// The literal encoded key as it appears in the file. This is what we
    /// aggregate on, not a derived fingerprint.
    pub(crate) key_material: String,
    pub(crate) comment: String,
}

/// Everything the index knows about one key.
///
/// The type and comment come from whichever host's scan first created the
/// record. Later scans of the same key never overwrite them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct KeyRecord {
    #[serde(rename = "type")]
    pub(crate) key_type: String,
    pub(crate) comment: String,
    /// Hosts whose authorized keys currently present this key. Each host
    /// appears at most once.
    pub(crate) servers: Vec<String>,
}

impl KeyRecord {
    fn new(entry: &KeyEntry, host: &str) -> Self {
        Self {
            key_type: entry.key_type.clone(),
            comment: entry.comment.clone(),
            servers: vec![host.to_owned()],
        }
    }

    pub(crate) fn authorizes(&self, host: &str) -> bool {
        self.servers.iter().any(|server| server == host)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct MergeStats {
    /// Records that no longer list the host.
    pub(crate) retracted: usize,
    /// Distinct keys the host presents.
    pub(crate) applied: usize,
    /// Records that did not exist before the merge.
    pub(crate) created: usize,
}

/// The reverse index, keyed by key material.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct KeyDb {
    records: BTreeMap<String, KeyRecord>,
}

impl KeyDb {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, key_material: &str) -> Option<&KeyRecord> {
        self.records.get(key_material)
    }

    pub(crate) fn iter(&self) -> btree_map::Iter<'_, String, KeyRecord> {
        self.records.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    /// Replaces everything the index attributes to `host` with the given
    /// entries.
    ///
    /// The host is first retracted from every record for a key it no longer
    /// presents, then each entry is applied in order. A host keeps its
    /// position in the records of keys it still presents, so merging the same
    /// entries twice changes nothing. Records left without any hosts are kept.
    pub(crate) fn merge(&mut self, host: &str, entries: &[KeyEntry]) -> MergeStats {
        let presented: HashSet<&str> = entries
            .iter()
            .map(|entry| entry.key_material.as_str())
            .collect();
        let mut stats = MergeStats {
            applied: presented.len(),
            ..MergeStats::default()
        };

        for (key_material, record) in &mut self.records {
            let still_presented = presented.contains(key_material.as_str());
            let mut kept = false;
            let before = record.servers.len();
            record.servers.retain(|server| {
                if server != host {
                    return true;
                }
                // Only the first listing survives, and only for presented keys.
                let keep = still_presented && !kept;
                kept = true;
                keep
            });
            if !still_presented && record.servers.len() != before {
                stats.retracted += 1;
            }
        }

        for entry in entries {
            match self.records.entry(entry.key_material.clone()) {
                btree_map::Entry::Vacant(vacant) => {
                    let _record = vacant.insert(KeyRecord::new(entry, host));
                    stats.created += 1;
                }
                btree_map::Entry::Occupied(mut occupied) => {
                    let record = occupied.get_mut();
                    if !record.authorizes(host) {
                        record.servers.push(host.to_owned());
                    }
                }
            }
        }

        stats
    }
}
