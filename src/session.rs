use crate::config::ClientConfig;
use crate::core_auth::Credentials;
use crate::core_error::TransferError;
use crate::core_ftpcommand::{FtpCommand, Reply};
use crate::core_network::{AddressingMode, ControlChannel, DataChannel};
use crate::core_transfer::worker::{copy_chunks, CopyError};
use crate::core_transfer::{Direction, Throttle, TransferId, TransferReport, TransferSettings, TransferSupervisor};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWrite;

const LISTING_CHUNK_SIZE: usize = 4096;

/// The interactive session: a logged-in control connection plus the
/// transfers launched from it.
pub struct Session {
    control: ControlChannel,
    host: String,
    port: u16,
    credentials: Credentials,
    mode: AddressingMode,
    local_dir: PathBuf,
    throttle: Throttle,
    max_reply_len: usize,
    accept_timeout: Option<Duration>,
    supervisor: TransferSupervisor,
}

impl Session {
    /// Wraps a control connection already logged in with `credentials`.
    pub fn new(control: ControlChannel, credentials: Credentials, config: &ClientConfig) -> Self {
        Self {
            control,
            host: config.host.clone(),
            port: config.port,
            credentials,
            mode: config.default_mode,
            local_dir: config.local_dir.clone(),
            throttle: config.throttle(),
            max_reply_len: config.max_reply_len,
            accept_timeout: config.accept_timeout(),
            supervisor: TransferSupervisor::new(),
        }
    }

    pub fn addressing_mode(&self) -> AddressingMode {
        self.mode
    }

    /// Applies to transfers launched from now on.
    pub fn set_addressing_mode(&mut self, mode: AddressingMode) {
        self.mode = mode;
    }

    pub fn launch_download(&mut self, filename: &str) -> TransferId {
        let settings = self.transfer_settings();
        self.supervisor.launch(Direction::Download, filename, settings)
    }

    pub fn launch_upload(&mut self, filename: &str) -> TransferId {
        let settings = self.transfer_settings();
        self.supervisor.launch(Direction::Upload, filename, settings)
    }

    fn transfer_settings(&self) -> TransferSettings {
        TransferSettings {
            host: self.host.clone(),
            port: self.port,
            credentials: self.credentials.clone(),
            mode: self.mode,
            local_dir: self.local_dir.clone(),
            throttle: self.throttle,
            max_reply_len: self.max_reply_len,
            accept_timeout: self.accept_timeout,
        }
    }

    /// Sends a control-only command; its reply is echoed by the channel.
    pub async fn passthrough(&mut self, command: FtpCommand) -> Result<Reply, TransferError> {
        self.control.send_command(&command).await
    }

    /// Runs LIST in the foreground with the current addressing mode and
    /// copies the listing to `out`. Returns the listing size in bytes.
    pub async fn list<W>(&mut self, out: &mut W) -> Result<u64, TransferError>
    where
        W: AsyncWrite + Unpin,
    {
        let data = DataChannel::negotiate(&mut self.control, self.mode, self.accept_timeout).await?;

        let reply = self.control.send_command(&FtpCommand::List).await?;
        if !reply.is_preliminary() {
            drop(data);
            return Err(TransferError::RejectedCommand {
                command: "LIST",
                reply: reply.to_string(),
            });
        }

        let mut stream = data.into_stream().await?;
        let mut bytes = 0;
        let copied = copy_chunks(&mut stream, out, &Throttle::unlimited(LISTING_CHUNK_SIZE), &mut bytes).await;
        drop(stream);

        self.control.read_reply().await?;
        match copied {
            Ok(()) => Ok(bytes),
            Err(CopyError::Read(source) | CopyError::Write(source)) => {
                Err(TransferError::TransferIo { bytes, source })
            }
        }
    }

    pub fn reap_transfers(&mut self) -> Vec<TransferReport> {
        self.supervisor.reap()
    }

    pub fn active_transfers(&self) -> usize {
        self.supervisor.active()
    }

    /// Sends QUIT, closes the control connection and waits for the
    /// transfers still running.
    pub async fn quit(mut self) -> Vec<TransferReport> {
        if let Err(e) = self.control.send_command(&FtpCommand::Quit).await {
            warn!("QUIT failed: {}", e);
        }
        self.control.close().await;
        wait_for_transfers(&mut self.supervisor).await
    }

    /// Ends a session whose control connection is no longer usable. Running
    /// transfers have connections of their own and are left to finish.
    pub async fn abandon(mut self) -> Vec<TransferReport> {
        self.control.close().await;
        wait_for_transfers(&mut self.supervisor).await
    }

}

async fn wait_for_transfers(supervisor: &mut TransferSupervisor) -> Vec<TransferReport> {
    let running = supervisor.active();
    if running > 0 {
        info!("Waiting for {} transfer(s) to finish", running);
    }
    supervisor.wait_all().await
}
