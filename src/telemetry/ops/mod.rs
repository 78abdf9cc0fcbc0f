pub mod init;
pub mod group;
pub mod recipe;
pub mod schedule;
pub mod shopping;
