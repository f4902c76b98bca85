//! One module per subcommand, each exposing an `execute` function.

pub mod add;
pub mod completions;
pub mod get;
pub mod init;
pub mod list;
pub mod menu;
pub mod remove;
pub mod update;
pub mod version;
