use crate::core_auth::prompt::prompt_password;
use crate::core_auth::Credentials;
use crate::core_error::handler::report_failure;
use crate::core_error::TransferError;
use crate::core_ftpcommand::FtpCommand;
use crate::core_network::{AddressingMode, ControlChannel};
use crate::session::Session;
use anyhow::{bail, Result};
use colored::*;
use log::{debug, error};
use std::io::Write;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// A line typed at the `ftp>` prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum ShellCommand {
    Help,
    Mode(Option<AddressingMode>),
    List,
    Pwd,
    Cwd(String),
    Mkd(String),
    Rmd(String),
    Dele(String),
    Retr(String),
    Stor(String),
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty line")]
    Empty,

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown command: {0}. Type HELP for the list of commands.")]
    Unknown(String),
}

fn required(arg: Option<String>, usage: &'static str) -> Result<String, ParseError> {
    arg.ok_or(ParseError::Usage(usage))
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or(ParseError::Empty)?;
        let arg = parts.next().map(str::to_string);

        match verb.to_ascii_uppercase().as_str() {
            "HELP" | "?" => Ok(ShellCommand::Help),
            "MODE" => match arg {
                None => Ok(ShellCommand::Mode(None)),
                Some(mode) => mode
                    .parse()
                    .map(|mode| ShellCommand::Mode(Some(mode)))
                    .map_err(|_| ParseError::Usage("MODE PASV | MODE PORT")),
            },
            "LIST" | "LS" => Ok(ShellCommand::List),
            "PWD" => Ok(ShellCommand::Pwd),
            "CWD" | "CD" => required(arg, "CWD <directory>").map(ShellCommand::Cwd),
            "MKD" => required(arg, "MKD <directory>").map(ShellCommand::Mkd),
            "RMD" => required(arg, "RMD <directory>").map(ShellCommand::Rmd),
            "DELE" => required(arg, "DELE <file>").map(ShellCommand::Dele),
            "RETR" | "GET" => required(arg, "RETR <file>").map(ShellCommand::Retr),
            "STOR" | "PUT" => required(arg, "STOR <file>").map(ShellCommand::Stor),
            "QUIT" | "EXIT" | "BYE" => Ok(ShellCommand::Quit),
            _ => Err(ParseError::Unknown(verb.to_string())),
        }
    }
}

pub fn print_help() {
    println!("\n{}", "--- rouilleftp ---".bold());
    println!("Available commands:");
    println!("  HELP               - Show this menu");
    println!("  MODE [PASV|PORT]   - Show or select the data connection mode");
    println!("  LIST               - List the remote directory");
    println!("  PWD                - Show the remote working directory");
    println!("  CWD <dir>          - Change the remote directory");
    println!("  MKD <dir>          - Create a remote directory");
    println!("  RMD <dir>          - Remove a remote directory");
    println!("  DELE <file>        - Delete a remote file");
    println!("  RETR <file>        - Download a file in the background");
    println!("  STOR <file>        - Upload a file in the background");
    println!("  QUIT               - Wait for transfers and exit\n");
}

/// The interactive front end reading commands from stdin.
pub struct Shell {
    lines: Lines<BufReader<Stdin>>,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }

    /// Logs in on `control`, asking for whatever was not supplied, until the
    /// server answers 230.
    pub async fn login(
        &mut self,
        control: &mut ControlChannel,
        mut username: Option<String>,
        mut password: Option<String>,
    ) -> Result<Credentials> {
        loop {
            let user = match username.take() {
                Some(user) => user,
                None => match self.read_line("User: ").await? {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => line.trim().to_string(),
                    None => bail!("Standard input closed before login"),
                },
            };
            let pass = match password.take() {
                Some(pass) => pass,
                None => prompt_password("Password: ").await?,
            };

            let credentials = Credentials::new(user, pass);
            match control.login(&credentials).await {
                Ok(_) => return Ok(credentials),
                Err(TransferError::Authentication(_)) => {
                    println!("{}", "Login failed, try again.".yellow());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Runs the command loop until QUIT or end of input. Losing the
    /// session's own control connection ends the program, once the running
    /// transfers are done.
    pub async fn run(&mut self, mut session: Session) -> Result<()> {
        print_help();

        let outcome = self.command_loop(&mut session).await;
        let reports = match &outcome {
            Ok(()) => session.quit().await,
            Err(e) => {
                error!("Control connection lost: {:#}", e);
                session.abandon().await
            }
        };

        let failed = reports.iter().filter(|report| !report.is_success()).count();
        if failed > 0 {
            println!("{} {} transfer(s) failed.", "[info]".cyan(), failed);
        }
        outcome
    }

    async fn command_loop(&mut self, session: &mut Session) -> Result<()> {
        loop {
            for report in session.reap_transfers() {
                debug!(
                    "Transfer {} done: {} bytes, success: {}",
                    report.request.id,
                    report.bytes,
                    report.is_success()
                );
            }

            let Some(line) = self.read_line("ftp> ").await? else {
                return Ok(());
            };
            let command = match ShellCommand::parse(&line) {
                Ok(command) => command,
                Err(ParseError::Empty) => continue,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            };

            match command {
                ShellCommand::Help => print_help(),
                ShellCommand::Mode(None) => {
                    println!("Current data mode: {}", session.addressing_mode());
                }
                ShellCommand::Mode(Some(mode)) => {
                    session.set_addressing_mode(mode);
                    println!("{} Data mode set to {}.", "[info]".cyan(), mode);
                }
                ShellCommand::List => {
                    let mut stdout = tokio::io::stdout();
                    if let Err(e) = session.list(&mut stdout).await {
                        report_failure("[list]", &e);
                    }
                }
                ShellCommand::Pwd => {
                    session.passthrough(FtpCommand::Pwd).await?;
                }
                ShellCommand::Cwd(dir) => {
                    session.passthrough(FtpCommand::Cwd(dir)).await?;
                }
                ShellCommand::Mkd(dir) => {
                    session.passthrough(FtpCommand::Mkd(dir)).await?;
                }
                ShellCommand::Rmd(dir) => {
                    session.passthrough(FtpCommand::Rmd(dir)).await?;
                }
                ShellCommand::Dele(file) => {
                    session.passthrough(FtpCommand::Dele(file)).await?;
                }
                ShellCommand::Retr(file) => {
                    let id = session.launch_download(&file);
                    println!(
                        "{} Download of {} started as transfer {} ({} running).",
                        "[info]".cyan(),
                        file,
                        id,
                        session.active_transfers()
                    );
                }
                ShellCommand::Stor(file) => {
                    let id = session.launch_upload(&file);
                    println!(
                        "{} Upload of {} started as transfer {} ({} running).",
                        "[info]".cyan(),
                        file,
                        id,
                        session.active_transfers()
                    );
                }
                ShellCommand::Quit => return Ok(()),
            }
        }
    }
}
