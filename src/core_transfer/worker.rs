use crate::core_auth::Credentials;
use crate::core_error::handler::report_failure;
use crate::core_error::TransferError;
use crate::core_ftpcommand::{FtpCommand, Reply};
use crate::core_network::{AddressingMode, ControlChannel, DataChannel};
use crate::core_transfer::{Throttle, TransferId};
use crate::helpers::resolve_local_path;
use log::{debug, warn};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Download,
    Upload,
}

impl Direction {
    pub fn command(self, filename: &str) -> FtpCommand {
        match self {
            Direction::Download => FtpCommand::Retr(filename.to_string()),
            Direction::Upload => FtpCommand::Stor(filename.to_string()),
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Direction::Download => "RETR",
            Direction::Upload => "STOR",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Direction::Download => "downloaded",
            Direction::Upload => "uploaded",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Download => f.write_str("download"),
            Direction::Upload => f.write_str("upload"),
        }
    }
}

/// Session state a worker runs with, copied at launch time.
#[derive(Clone, Debug)]
pub struct TransferSettings {
    pub host: String,
    pub port: u16,
    pub credentials: Credentials,
    pub mode: AddressingMode,
    pub local_dir: PathBuf,
    pub throttle: Throttle,
    pub max_reply_len: usize,
    pub accept_timeout: Option<Duration>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    pub id: TransferId,
    pub direction: Direction,
    pub filename: String,
}

/// What a finished worker hands back to the supervisor.
#[derive(Debug)]
pub struct TransferReport {
    pub request: TransferRequest,
    pub mode: AddressingMode,
    pub bytes: u64,
    pub final_reply: Option<Reply>,
    pub outcome: Result<(), TransferError>,
}

impl TransferReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Default)]
struct Progress {
    bytes: u64,
    final_reply: Option<Reply>,
}

pub(crate) enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

/// One complete RETR or STOR over a private control connection.
///
/// The worker never touches the interactive session's connection. Steps run
/// in order and the first hard error ends the transfer:
/// connect, login, negotiate, transfer command, accept (active mode only),
/// byte loop, completion reply.
pub struct TransferWorker {
    request: TransferRequest,
    settings: TransferSettings,
    label: String,
}

impl TransferWorker {
    pub fn new(request: TransferRequest, settings: TransferSettings) -> Self {
        let label = format!("[transfer {}]", request.id);
        Self {
            request,
            settings,
            label,
        }
    }

    pub async fn run(self) -> TransferReport {
        println!(
            "{} Starting {} of {} ({})",
            self.label,
            self.request.direction,
            self.request.filename,
            self.settings.mode.command_name()
        );

        debug!(
            "{} {} bytes per chunk, {:?} pause per chunk",
            self.label,
            self.settings.throttle.chunk_size(),
            self.settings.throttle.chunk_delay()
        );

        let mut progress = Progress::default();
        let outcome = self.execute(&mut progress).await;
        if let Err(e) = &outcome {
            report_failure(&self.label, e);
        }

        println!(
            "{} Finished {}: {} ({} bytes {})",
            self.label,
            self.request.direction,
            self.request.filename,
            progress.bytes,
            self.request.direction.past_tense()
        );

        TransferReport {
            request: self.request,
            mode: self.settings.mode,
            bytes: progress.bytes,
            final_reply: progress.final_reply,
            outcome,
        }
    }

    async fn execute(&self, progress: &mut Progress) -> Result<(), TransferError> {
        let settings = &self.settings;
        let direction = self.request.direction;
        let local_path = resolve_local_path(&settings.local_dir, &self.request.filename);

        // Upload sources are opened before anything reaches the server.
        let source = match direction {
            Direction::Upload => Some(
                File::open(&local_path)
                    .await
                    .map_err(|e| TransferError::local_io(&local_path, e))?,
            ),
            Direction::Download => None,
        };

        let mut control = ControlChannel::connect(&settings.host, settings.port, settings.max_reply_len)
            .await?
            .with_label(self.label.clone());
        control.read_reply().await?;
        control.login(&settings.credentials).await?;

        let data = DataChannel::negotiate(&mut control, settings.mode, settings.accept_timeout).await?;
        debug!(
            "{} Data channel {}",
            self.label,
            if data.is_connected() { "connected" } else { "listening" }
        );

        let reply = control
            .send_command(&direction.command(&self.request.filename))
            .await?;
        // Without a 1xx the server will not use the data connection, and an
        // active-mode accept would wait forever.
        if !reply.is_preliminary() {
            drop(data);
            return Err(TransferError::RejectedCommand {
                command: direction.verb(),
                reply: reply.to_string(),
            });
        }

        let streamed = match source {
            Some(file) => self.upload(file, data, &local_path, &mut progress.bytes).await,
            None => self.download(data, &local_path, &mut progress.bytes).await,
        };

        let closing = control.read_reply().await;
        control.close().await;
        if let Ok(reply) = &closing {
            if !reply.is_transfer_complete() {
                warn!("{} Server did not confirm the transfer: {}", self.label, reply);
            }
            progress.final_reply = Some(reply.clone());
        }
        streamed?;
        closing.map(|_| ())
    }

    async fn download(&self, data: DataChannel, local_path: &Path, bytes: &mut u64) -> Result<(), TransferError> {
        let mut file = File::create(local_path)
            .await
            .map_err(|e| TransferError::local_io(local_path, e))?;
        let mut stream = data.into_stream().await?;

        match copy_chunks(&mut stream, &mut file, &self.settings.throttle, bytes).await {
            Ok(()) => {
                debug!("{} Data connection reached end of stream", self.label);
                Ok(())
            }
            Err(CopyError::Read(source)) => Err(TransferError::TransferIo { bytes: *bytes, source }),
            Err(CopyError::Write(source)) => Err(TransferError::local_io(local_path, source)),
        }
    }

    async fn upload(&self, mut file: File, data: DataChannel, local_path: &Path, bytes: &mut u64) -> Result<(), TransferError> {
        let mut stream = data.into_stream().await?;

        match copy_chunks(&mut file, &mut stream, &self.settings.throttle, bytes).await {
            Ok(()) => stream
                .shutdown()
                .await
                .map_err(|source| TransferError::TransferIo { bytes: *bytes, source }),
            Err(CopyError::Read(source)) => Err(TransferError::local_io(local_path, source)),
            Err(CopyError::Write(source)) => Err(TransferError::TransferIo { bytes: *bytes, source }),
        }
    }
}

/// Moves chunks from `reader` to `writer` until end of stream, pausing
/// after each one. `bytes` counts what was fully written, also on error.
pub(crate) async fn copy_chunks<R, W>(reader: &mut R, writer: &mut W, throttle: &Throttle, bytes: &mut u64) -> Result<(), CopyError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; throttle.chunk_size()];
    loop {
        let n = reader.read(&mut buffer).await.map_err(CopyError::Read)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buffer[..n]).await.map_err(CopyError::Write)?;
        *bytes += n as u64;
        throttle.pause().await;
    }
    writer.flush().await.map_err(CopyError::Write)
}
