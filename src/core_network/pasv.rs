use crate::core_error::TransferError;
use crate::core_ftpcommand::{FtpCommand, Reply};
use crate::core_network::ControlChannel;
use log::debug;
use regex::Regex;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::OnceLock;
use tokio::net::TcpStream;

fn pasv_tuple_regex() -> &'static Regex {
    static PASV_TUPLE: OnceLock<Regex> = OnceLock::new();
    PASV_TUPLE.get_or_init(|| {
        Regex::new(r"\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*\)")
            .expect("PASV tuple pattern is valid")
    })
}

/// Extracts the data address from a reply such as
/// `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2).`
pub fn parse_pasv_reply(reply: &Reply) -> Result<SocketAddrV4, TransferError> {
    let malformed = || TransferError::ProtocolParse {
        command: "PASV",
        reply: reply.to_string(),
    };

    let caps = pasv_tuple_regex().captures(reply.text()).ok_or_else(malformed)?;
    let mut fields = [0u8; 6];
    for (field, cap) in fields.iter_mut().zip(caps.iter().skip(1)) {
        *field = cap
            .and_then(|m| m.as_str().parse::<u8>().ok())
            .ok_or_else(malformed)?;
    }

    let ip = Ipv4Addr::new(fields[0], fields[1], fields[2], fields[3]);
    let port = u16::from(fields[4]) * 256 + u16::from(fields[5]);
    Ok(SocketAddrV4::new(ip, port))
}

/// Asks the server to listen and connects to the address it announces.
/// The caller owns the returned stream and drops it after the transfer.
pub async fn negotiate_passive(control: &mut ControlChannel) -> Result<TcpStream, TransferError> {
    let reply = control.send_command(&FtpCommand::Pasv).await?;
    if reply.is_rejection() {
        return Err(TransferError::RejectedCommand {
            command: "PASV",
            reply: reply.to_string(),
        });
    }

    let addr = parse_pasv_reply(&reply)?;
    debug!("Passive data address: {}", addr);

    TcpStream::connect(addr)
        .await
        .map_err(|e| TransferError::connection(format!("connect data channel to {}", addr), e))
}
