// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cluster teardown

use std::sync::atomic::Ordering;

use super::types::{ClusterController, TeardownReport};

impl ClusterController {
    /// Close the control surface, terminate every session and release all
    /// surfaces.
    ///
    /// Only the first call does anything; later calls return a report with
    /// `already_closed` set.
    pub async fn close(&self) -> TeardownReport {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return TeardownReport {
                already_closed: true,
                ..TeardownReport::default()
            };
        }

        tracing::debug!("Closing cluster {} ({})", self.inner.id, self.inner.destination);
        self.inner.shutdown.cancel();
        self.inner.control.close();

        let report = self.terminate_sessions().await;

        self.inner.presenter.close_all_surfaces();
        tracing::info!(
            "Cluster {} closed ({} session(s) terminated)",
            self.inner.destination,
            report.attempted
        );
        report
    }

    /// Tear down a controller that was never shown: its sessions are
    /// terminated, but the control surface and the presenter's surfaces,
    /// which belong to whoever did get shown, are left alone.
    pub(super) async fn discard(&self) -> TeardownReport {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return TeardownReport {
                already_closed: true,
                ..TeardownReport::default()
            };
        }

        self.inner.shutdown.cancel();
        let report = self.terminate_sessions().await;
        tracing::debug!(
            "Discarded cluster {} ({} session(s) terminated)",
            self.inner.id,
            report.attempted
        );
        report
    }

    async fn terminate_sessions(&self) -> TeardownReport {
        let mut report = TeardownReport::default();
        let mut registry = self.inner.registry.lock().await;
        for session in registry.iter() {
            report.attempted += 1;
            if let Err(e) = session.terminate() {
                tracing::debug!("Terminate of {} failed: {e}", session.endpoint());
                report.failed += 1;
            }
        }
        registry.clear();
        report
    }
}
