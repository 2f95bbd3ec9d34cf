use crate::constants::FTP_CONTROL_PORT;
use anyhow::{bail, Context, Result};
use url::Url;

/// The server named on the command line.
#[derive(Debug, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Target {
    /// Accepts a bare host name or an `ftp://` URL.
    pub fn parse(input: &str) -> Result<Self> {
        if !input.contains("://") {
            return Ok(Target {
                host: input.to_string(),
                port: None,
                username: None,
                password: None,
            });
        }

        let url = Url::parse(input).with_context(|| format!("Invalid server URL: {}", input))?;
        if url.scheme() != "ftp" {
            bail!("Unsupported URL scheme '{}', expected ftp://", url.scheme());
        }
        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .with_context(|| format!("No host in URL: {}", input))?
            .to_string();

        Ok(Target {
            host,
            port: url.port_or_known_default(),
            username: Some(url.username())
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            password: url.password().map(str::to_string),
        })
    }
}

/// Resolves the service argument: a port number or the name `ftp`.
pub fn parse_service(service: &str) -> Result<u16> {
    if service.eq_ignore_ascii_case("ftp") {
        return Ok(FTP_CONTROL_PORT);
    }
    service
        .parse::<u16>()
        .with_context(|| format!("Unknown service '{}', expected a port number or 'ftp'", service))
}
