use std::fmt;

/// A command as written on the control connection, without its CRLF.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum FtpCommand {
    User(String),
    Pass(String),
    Pasv,
    Port(String),
    Retr(String),
    Stor(String),
    List,
    Pwd,
    Cwd(String),
    Mkd(String),
    Rmd(String),
    Dele(String),
    Quit,
}

impl FtpCommand {
    pub fn verb(&self) -> &'static str {
        match self {
            FtpCommand::User(_) => "USER",
            FtpCommand::Pass(_) => "PASS",
            FtpCommand::Pasv => "PASV",
            FtpCommand::Port(_) => "PORT",
            FtpCommand::Retr(_) => "RETR",
            FtpCommand::Stor(_) => "STOR",
            FtpCommand::List => "LIST",
            FtpCommand::Pwd => "PWD",
            FtpCommand::Cwd(_) => "CWD",
            FtpCommand::Mkd(_) => "MKD",
            FtpCommand::Rmd(_) => "RMD",
            FtpCommand::Dele(_) => "DELE",
            FtpCommand::Quit => "QUIT",
        }
    }

    fn argument(&self) -> Option<&str> {
        match self {
            FtpCommand::User(arg)
            | FtpCommand::Pass(arg)
            | FtpCommand::Port(arg)
            | FtpCommand::Retr(arg)
            | FtpCommand::Stor(arg)
            | FtpCommand::Cwd(arg)
            | FtpCommand::Mkd(arg)
            | FtpCommand::Rmd(arg)
            | FtpCommand::Dele(arg) => Some(arg.as_str()),
            FtpCommand::Pasv | FtpCommand::List | FtpCommand::Pwd | FtpCommand::Quit => None,
        }
    }

    /// Form of the command that is safe to put in the logs.
    pub fn redacted(&self) -> String {
        match self {
            FtpCommand::Pass(_) => "PASS ****".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for FtpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.argument() {
            Some(arg) => write!(f, "{} {}", self.verb(), arg),
            None => f.write_str(self.verb()),
        }
    }
}
