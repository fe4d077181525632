pub mod count;
pub mod init;
pub mod recent;
