pub mod build;
pub mod init;
pub mod mock;
pub mod progress;
pub mod validate;
