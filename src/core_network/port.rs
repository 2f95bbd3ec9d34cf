use crate::core_error::TransferError;
use crate::core_ftpcommand::FtpCommand;
use crate::core_network::ControlChannel;
use log::debug;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddrV4};
use tokio::net::TcpListener;

/// Encodes an address as the `h1,h2,h3,h4,p1,p2` argument of PORT.
pub fn format_port_argument(addr: SocketAddrV4) -> String {
    let [h1, h2, h3, h4] = addr.ip().octets();
    let port = addr.port();
    format!("{},{},{},{},{},{}", h1, h2, h3, h4, port / 256, port % 256)
}

/// Opens a listener on an ephemeral port and announces it with PORT.
///
/// The announced address is the local end of the control connection, the
/// one address the server is known to reach. Nothing is accepted here: the
/// server only dials back once the transfer command has been sent.
pub async fn negotiate_active(control: &mut ControlChannel) -> Result<TcpListener, TransferError> {
    let local_ip = match control.local_addr()?.ip() {
        IpAddr::V4(ip) => ip,
        IpAddr::V6(ip) => ip.to_ipv4_mapped().ok_or_else(|| {
            TransferError::connection(
                "derive PORT address",
                io::Error::new(io::ErrorKind::Unsupported, "PORT needs an IPv4 control connection"),
            )
        })?,
    };

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0))
        .await
        .map_err(|e| TransferError::connection("listen for data connection", e))?;
    let port = listener
        .local_addr()
        .map_err(|e| TransferError::connection("read data listener address", e))?
        .port();

    let announced = SocketAddrV4::new(local_ip, port);
    debug!("Active data address: {}", announced);

    let reply = control
        .send_command(&FtpCommand::Port(format_port_argument(announced)))
        .await?;
    if reply.is_rejection() {
        drop(listener);
        return Err(TransferError::RejectedCommand {
            command: "PORT",
            reply: reply.to_string(),
        });
    }

    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_command_for_control_address() {
        let addr = SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 5), 5001);
        let command = FtpCommand::Port(format_port_argument(addr));
        assert_eq!(command.to_string(), "PORT 192,168,1,5,19,137");
    }

    #[test]
    fn test_port_argument_extremes() {
        assert_eq!(
            format_port_argument(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 65535)),
            "127,0,0,1,255,255"
        );
        assert_eq!(
            format_port_argument(SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 255)),
            "10,0,0,1,0,255"
        );
    }
}
