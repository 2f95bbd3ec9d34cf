use crate::core_error::TransferError;
use log::error;

/// Writes the diagnostic line for a failed step, prefixed with the label of
/// the unit that hit it.
pub fn report_failure(label: &str, error: &TransferError) {
    error!("{} {} error: {}", label, error.kind(), error);
}
