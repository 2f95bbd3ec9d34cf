use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which side opens the data connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum AddressingMode {
    /// PASV: the server listens, the client connects.
    #[default]
    Passive,
    /// PORT: the client listens, the server connects back.
    Active,
}

impl AddressingMode {
    pub fn command_name(self) -> &'static str {
        match self {
            AddressingMode::Passive => "PASV",
            AddressingMode::Active => "PORT",
        }
    }
}

impl FromStr for AddressingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PASV" | "PASSIVE" => Ok(AddressingMode::Passive),
            "PORT" | "ACTIVE" => Ok(AddressingMode::Active),
            other => Err(format!("unknown addressing mode '{}', expected PASV or PORT", other)),
        }
    }
}

impl TryFrom<String> for AddressingMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AddressingMode> for String {
    fn from(mode: AddressingMode) -> Self {
        mode.command_name().to_string()
    }
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressingMode::Passive => f.write_str("PASV (passive)"),
            AddressingMode::Active => f.write_str("PORT (active)"),
        }
    }
}
