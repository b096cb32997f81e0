pub mod compile;
pub mod init;
pub mod serve;

pub use compile::{compile, CompileArgs};
pub use init::{init, InitArgs};
pub use serve::{serve, ServeArgs};
