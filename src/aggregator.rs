// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use log::{debug, info, warn};

use crate::{
    coordinator::Coordinator,
    error::{Error, Result},
    model::{KeyDb, KeyEntry, MergeStats},
    storage::Storage,
};

/// Loads the index, treating a store that doesn't exist yet or can't be
/// decoded as empty.
async fn load<S: Storage<KeyDb>>(storage: &mut S) -> Result<KeyDb> {
    match storage.get().await {
        Ok(Some(db)) => Ok(db),
        Ok(None) => {
            debug!("No key database found, so we're starting a new one");
            Ok(KeyDb::new())
        }
        Err(Error::Json(e)) => {
            warn!("Ignoring the existing key database because it could not be decoded: {}", e);
            Ok(KeyDb::new())
        }
        Err(e) => Err(e),
    }
}

/// Folds per-host scan results into the persisted index, one host at a time.
pub(crate) struct Aggregator<S> {
    coordinator: Coordinator<S>,
}

impl<S: Storage<KeyDb>> Aggregator<S> {
    pub(crate) fn new(storage: S) -> Self {
        Self {
            coordinator: Coordinator::new(storage),
        }
    }

    /// Replaces what the index records for `host` with `entries` and writes
    /// the result back before returning.
    pub(crate) async fn apply(&self, host: &str, entries: Vec<KeyEntry>) -> Result<MergeStats> {
        let host = host.to_owned();
        self.coordinator
            .with_lock(move |storage| {
                Box::pin(async move {
                    let mut db = load(storage).await?;
                    let stats = db.merge(&host, &entries);
                    storage.update(&db).await?;
                    info!(
                        "Merged {} keys for {} ({} new, {} previously attributed; {} keys total)",
                        stats.applied,
                        host,
                        stats.created,
                        stats.retracted,
                        db.len()
                    );
                    Ok::<_, Error>(stats)
                })
            })
            .await
    }

    #[cfg(test)]
    pub(crate) fn into_storage(self) -> S {
        self.coordinator.into_inner()
    }
}
