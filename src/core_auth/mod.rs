pub mod credentials;
pub mod prompt;

pub use credentials::Credentials;
