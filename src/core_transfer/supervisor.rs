use crate::core_transfer::{Direction, TransferReport, TransferRequest, TransferSettings, TransferWorker};
use log::{debug, error};
use tokio::task::JoinSet;

pub type TransferId = u64;

/// Owns the running transfer workers of one interactive session.
///
/// Workers are independent tasks; the supervisor only keeps their handles so
/// finished ones can be collected without ever waiting on a running one.
pub struct TransferSupervisor {
    workers: JoinSet<TransferReport>,
    next_id: TransferId,
}

impl TransferSupervisor {
    pub fn new() -> Self {
        Self {
            workers: JoinSet::new(),
            next_id: 0,
        }
    }

    /// Spawns a worker and returns at once. `settings` is the snapshot the
    /// worker runs with; later session changes do not reach it.
    pub fn launch(&mut self, direction: Direction, filename: &str, settings: TransferSettings) -> TransferId {
        self.next_id += 1;
        let id = self.next_id;

        let request = TransferRequest {
            id,
            direction,
            filename: filename.to_string(),
        };
        debug!(
            "Launching transfer {}: {} {} ({})",
            id,
            direction.verb(),
            filename,
            settings.mode.command_name()
        );
        self.workers.spawn(TransferWorker::new(request, settings).run());
        id
    }

    /// Collects every worker that has already finished. Never blocks.
    pub fn reap(&mut self) -> Vec<TransferReport> {
        let mut finished = Vec::new();
        while let Some(joined) = self.workers.try_join_next() {
            if let Some(report) = Self::collect(joined) {
                finished.push(report);
            }
        }
        finished
    }

    /// Waits for every running worker.
    pub async fn wait_all(&mut self) -> Vec<TransferReport> {
        let mut finished = Vec::new();
        while let Some(joined) = self.workers.join_next().await {
            if let Some(report) = Self::collect(joined) {
                finished.push(report);
            }
        }
        finished
    }

    pub fn active(&self) -> usize {
        self.workers.len()
    }

    fn collect(joined: Result<TransferReport, tokio::task::JoinError>) -> Option<TransferReport> {
        match joined {
            Ok(report) => {
                debug!(
                    "Reaped transfer {} ({} bytes, success: {})",
                    report.request.id,
                    report.bytes,
                    report.is_success()
                );
                Some(report)
            }
            Err(e) => {
                error!("Transfer task ended abnormally: {}", e);
                None
            }
        }
    }
}

impl Default for TransferSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
