pub mod control;
pub mod data;
pub mod mode;
pub mod pasv;
pub mod port;

pub use control::ControlChannel;
pub use data::DataChannel;
pub use mode::AddressingMode;
