//! Database access shared by the epidash crates

pub mod init;
pub mod models;
pub mod replace;

pub use init::init_pool;
pub use replace::{replace_table, BindRow};
