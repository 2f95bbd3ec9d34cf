use crate::core_error::TransferError;
use crate::core_network::{pasv, port, AddressingMode, ControlChannel};
use log::debug;
use std::io;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

/// A data channel between negotiation and the start of the byte loop.
///
/// Passive negotiation yields `Connected` right away. Active negotiation
/// yields `Listening`: the server dials back only after the transfer
/// command, so the accept is deferred to `into_stream`.
#[derive(Debug)]
pub enum DataChannel {
    Connected(TcpStream),
    Listening {
        listener: TcpListener,
        accept_timeout: Option<Duration>,
    },
}

impl DataChannel {
    pub async fn negotiate(
        control: &mut ControlChannel,
        mode: AddressingMode,
        accept_timeout: Option<Duration>,
    ) -> Result<Self, TransferError> {
        match mode {
            AddressingMode::Passive => Ok(DataChannel::Connected(pasv::negotiate_passive(control).await?)),
            AddressingMode::Active => Ok(DataChannel::Listening {
                listener: port::negotiate_active(control).await?,
                accept_timeout,
            }),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, DataChannel::Connected(_))
    }

    /// Returns the connected stream, accepting exactly one inbound
    /// connection first when still listening. The listener is closed once
    /// the connection is accepted.
    pub async fn into_stream(self) -> Result<TcpStream, TransferError> {
        match self {
            DataChannel::Connected(stream) => Ok(stream),
            DataChannel::Listening {
                listener,
                accept_timeout,
            } => {
                let accepted = match accept_timeout {
                    Some(limit) => tokio::time::timeout(limit, listener.accept())
                        .await
                        .unwrap_or_else(|_| {
                            Err(io::Error::new(
                                io::ErrorKind::TimedOut,
                                "server did not open the data connection",
                            ))
                        }),
                    None => listener.accept().await,
                };
                let (stream, peer) =
                    accepted.map_err(|e| TransferError::connection("accept data connection", e))?;
                debug!("Accepted data connection from {}", peer);
                Ok(stream)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_listening_channel_accepts_once() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let channel = DataChannel::Listening {
            listener,
            accept_timeout: None,
        };
        assert!(!channel.is_connected());

        let dialer = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(b"payload").await.unwrap();
        });

        let mut stream = channel.into_stream().await.unwrap();
        let mut received = Vec::new();
        stream.read_to_end(&mut received).await.unwrap();
        dialer.await.unwrap();
        assert_eq!(received, b"payload");

        // The listener went away with the accept.
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_accept_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let channel = DataChannel::Listening {
            listener,
            accept_timeout: Some(Duration::from_millis(50)),
        };
        let err = channel.into_stream().await.unwrap_err();
        assert!(matches!(err, TransferError::Connection { .. }));
    }
}
