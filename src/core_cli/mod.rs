mod cli;
pub mod shell;
pub mod target;

pub use cli::Cli;
pub use shell::Shell;
