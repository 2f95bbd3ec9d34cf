// Commands sent on the control connection and the replies they produce
pub mod ftpcommand;
pub mod reply;

pub use ftpcommand::FtpCommand;
pub use reply::{reply_code, Reply};
