pub mod supervisor;
pub mod throttle;
pub mod worker;

#[cfg(test)]
pub mod test_server;

pub use supervisor::{TransferId, TransferSupervisor};
pub use throttle::Throttle;
pub use worker::{Direction, TransferReport, TransferRequest, TransferSettings, TransferWorker};
