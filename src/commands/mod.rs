pub mod init;
pub mod prepare;
pub mod target;
