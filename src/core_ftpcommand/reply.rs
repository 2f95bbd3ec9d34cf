use std::fmt;

pub const REPLY_TRANSFER_COMPLETE: u16 = 226;
pub const REPLY_LOGGED_IN: u16 = 230;
/// First code of the permanent negative completion range.
pub const REPLY_REJECTED: u16 = 500;

/// Returns the leading 3-digit code of a reply, or 0 when there is none.
pub fn reply_code(text: &str) -> u16 {
    let bytes = text.as_bytes();
    if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
        return 0;
    }
    bytes[..3]
        .iter()
        .fold(0, |code, digit| code * 10 + u16::from(digit - b'0'))
}

/// A complete reply read from the control connection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reply {
    text: String,
}

impl Reply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn code(&self) -> u16 {
        reply_code(&self.text)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_rejection(&self) -> bool {
        self.code() >= REPLY_REJECTED
    }

    /// 1xx: the server is about to use the data connection.
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code())
    }

    pub fn is_logged_in(&self) -> bool {
        self.code() == REPLY_LOGGED_IN
    }

    pub fn is_transfer_complete(&self) -> bool {
        self.code() == REPLY_TRANSFER_COMPLETE
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text.trim_end())
    }
}
