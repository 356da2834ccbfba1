// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use futures_util::future::BoxFuture;
use tokio::sync::Mutex;

/// Serializes access to a shared resource across concurrently running scans.
///
/// Waiters are queued and woken in the order they arrived.
pub(crate) struct Coordinator<T> {
    resource: Mutex<T>,
}

impl<T> Coordinator<T> {
    pub(crate) fn new(resource: T) -> Self {
        Self {
            resource: Mutex::new(resource),
        }
    }

    /// Runs `critical_section` with exclusive access to the resource. No two
    /// critical sections ever overlap.
    pub(crate) async fn with_lock<R, F>(&self, critical_section: F) -> R
    where
        F: for<'guard> FnOnce(&'guard mut T) -> BoxFuture<'guard, R>,
    {
        let mut guard = self.resource.lock().await;
        critical_section(&mut *guard).await
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> T {
        self.resource.into_inner()
    }
}
