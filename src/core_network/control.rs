use crate::core_auth::Credentials;
use crate::core_error::TransferError;
use crate::core_ftpcommand::{FtpCommand, Reply};
use log::{debug, error, warn};
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{lookup_host, TcpStream};

/// The command/reply half of an FTP conversation.
///
/// One command is outstanding at a time: `send_command` writes the command
/// and waits for its complete reply before returning. Every reply read is
/// echoed on stdout, prefixed with the channel label when there is one.
pub struct ControlChannel {
    stream: BufReader<TcpStream>,
    max_reply_len: usize,
    label: Option<String>,
}

impl ControlChannel {
    /// Opens a control connection. The server banner is left unread.
    ///
    /// IPv4 addresses of `host` are tried first: PORT can only announce an
    /// IPv4 address, so an IPv6 control connection would rule out active mode.
    pub async fn connect(host: &str, port: u16, max_reply_len: usize) -> Result<Self, TransferError> {
        let step = || format!("connect to {}:{}", host, port);
        let resolved = lookup_host((host, port))
            .await
            .map_err(|e| TransferError::connection(step(), e))?;

        let mut last_error = None;
        for addr in prefer_ipv4(resolved.collect()) {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    debug!("Control connection open to {} ({})", host, addr);
                    return Ok(Self::from_stream(stream, max_reply_len));
                }
                Err(e) => {
                    debug!("Could not connect to {}: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        let source = last_error.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "host name resolved to no address")
        });
        Err(TransferError::connection(step(), source))
    }

    pub fn from_stream(stream: TcpStream, max_reply_len: usize) -> Self {
        Self {
            stream: BufReader::new(stream),
            max_reply_len: max_reply_len.max(1),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Local end of the control connection, i.e. the address the server can
    /// reach this client on.
    pub fn local_addr(&self) -> Result<SocketAddr, TransferError> {
        self.stream
            .get_ref()
            .local_addr()
            .map_err(|e| TransferError::connection("read local address of control connection", e))
    }

    pub async fn send_command(&mut self, command: &FtpCommand) -> Result<Reply, TransferError> {
        let line = format!("{}\r\n", command);
        debug!("-> {}", command.redacted());

        if let Err(e) = self.stream.get_mut().write_all(line.as_bytes()).await {
            error!("Failed to send {} on the control connection: {}", command.verb(), e);
            return Err(TransferError::connection(format!("send {}", command.verb()), e));
        }

        self.read_reply().await
    }

    /// Reads one complete reply, following `ddd-` continuation lines up to
    /// the closing `ddd ` line. At most `max_reply_len` bytes are kept; the
    /// rest of an over-long reply is read and dropped so the next reply
    /// starts on its own line.
    pub async fn read_reply(&mut self) -> Result<Reply, TransferError> {
        let mut raw: Vec<u8> = Vec::new();
        let mut first_line: Option<Vec<u8>> = None;
        let mut line: Vec<u8> = Vec::new();
        let mut truncated = false;

        loop {
            let budget = self.max_reply_len.saturating_sub(raw.len());
            line.clear();
            // The code prefix is always kept to recognise the closing line.
            let n = read_line_bounded(&mut self.stream, &mut line, budget.max(4))
                .await
                .map_err(|e| TransferError::connection("read reply", e))?;

            if n == 0 {
                if first_line.is_none() {
                    return Err(TransferError::connection(
                        "read reply",
                        io::Error::new(io::ErrorKind::UnexpectedEof, "control connection closed by server"),
                    ));
                }
                break;
            }

            let kept = line.len().min(budget);
            truncated |= kept < n;
            raw.extend_from_slice(&line[..kept]);

            let first = first_line.get_or_insert_with(|| line.clone());
            if ends_reply(first, &line) {
                break;
            }
        }

        if truncated {
            warn!("Reply longer than {} bytes, keeping the start of it", self.max_reply_len);
        }

        let reply = Reply::new(String::from_utf8_lossy(&raw).into_owned());
        debug!("<- {}", reply);
        self.echo(&reply);
        Ok(reply)
    }

    /// Sends USER then PASS. Anything but 230 after PASS is an
    /// authentication failure.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<Reply, TransferError> {
        self.send_command(&FtpCommand::User(credentials.username().to_string()))
            .await?;
        let reply = self
            .send_command(&FtpCommand::Pass(credentials.password().to_string()))
            .await?;

        if !reply.is_logged_in() {
            return Err(TransferError::Authentication(reply.to_string()));
        }
        Ok(reply)
    }

    pub async fn close(mut self) {
        if let Err(e) = self.stream.get_mut().shutdown().await {
            debug!("Error shutting down control connection: {}", e);
        }
    }

    fn echo(&self, reply: &Reply) {
        match &self.label {
            Some(label) => println!("{} {}", label, reply),
            None => println!("{}", reply),
        }
    }
}

/// Consumes one line from `reader`, keeping at most `keep` bytes of it in
/// `out`. Returns the number of bytes consumed, 0 at end of stream.
async fn read_line_bounded<R>(reader: &mut R, out: &mut Vec<u8>, keep: usize) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut consumed = 0;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(consumed);
        }
        let (len, complete) = match available.iter().position(|&b| b == b'\n') {
            Some(end) => (end + 1, true),
            None => (available.len(), false),
        };
        let room = keep.saturating_sub(out.len()).min(len);
        out.extend_from_slice(&available[..room]);
        reader.consume(len);
        consumed += len;
        if complete {
            return Ok(consumed);
        }
    }
}

/// Orders resolved addresses IPv4 first, keeping the resolver's order
/// within each family.
fn prefer_ipv4(mut addrs: Vec<SocketAddr>) -> Vec<SocketAddr> {
    addrs.sort_by_key(|addr| !addr.is_ipv4());
    addrs
}

/// Whether `line` closes the reply that started with `first_line`.
fn ends_reply(first_line: &[u8], line: &[u8]) -> bool {
    let continued = first_line.len() >= 4
        && first_line[..3].iter().all(u8::is_ascii_digit)
        && first_line[3] == b'-';
    if !continued {
        return true;
    }

    line.len() >= 4 && line[..3] == first_line[..3] && (line[3] == b' ' || line[3] == b'\r')
}
