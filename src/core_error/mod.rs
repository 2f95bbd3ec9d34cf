pub mod error;
pub mod handler;

pub use error::TransferError;
