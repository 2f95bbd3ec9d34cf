// src/constants.rs

/// Well-known port of the FTP control connection.
pub const FTP_CONTROL_PORT: u16 = 21;

/// Chunk size of the transfer loop. Small on purpose: together with the
/// per-chunk delay it caps throughput at roughly 5 MiB per 30 seconds.
pub const DEFAULT_CHUNK_SIZE: usize = 128;
pub const DEFAULT_CHUNK_DELAY_US: u64 = 732;

/// Upper bound on the bytes accepted for a single control reply.
pub const DEFAULT_MAX_REPLY_LEN: usize = 8192;

pub const DEFAULT_CONFIG_PATH_UNIX: &str = "/etc/rouilleftp.conf";
pub const DEFAULT_CONFIG_PATH_WINDOWS: &str = "C:\\rouilleftp\\etc\\rouilleftp.conf";
