// Errors raised by the control channel, the negotiators and the transfer workers
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("{step}: {source}")]
    Connection {
        step: String,
        #[source]
        source: io::Error,
    },

    #[error("login rejected: {0}")]
    Authentication(String),

    #[error("unexpected reply to {command}: {reply}")]
    ProtocolParse { command: &'static str, reply: String },

    #[error("server rejected {command}: {reply}")]
    RejectedCommand { command: &'static str, reply: String },

    #[error("local file {}: {source}", .path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("data connection failed after {bytes} bytes: {source}")]
    TransferIo {
        bytes: u64,
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    pub fn connection(step: impl Into<String>, source: io::Error) -> Self {
        TransferError::Connection {
            step: step.into(),
            source,
        }
    }

    pub fn local_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TransferError::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// Short category name used in diagnostic lines.
    pub fn kind(&self) -> &'static str {
        match self {
            TransferError::Connection { .. } => "connection",
            TransferError::Authentication(_) => "authentication",
            TransferError::ProtocolParse { .. } => "protocol",
            TransferError::RejectedCommand { .. } => "rejected command",
            TransferError::LocalIo { .. } => "local I/O",
            TransferError::TransferIo { .. } => "transfer I/O",
        }
    }
}
