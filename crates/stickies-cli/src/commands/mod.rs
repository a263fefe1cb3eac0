pub mod add;
pub mod common;
pub mod delete;
pub mod list;
pub mod share;
pub mod show;
