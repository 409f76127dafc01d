//! One module per subcommand, each exposing `execute`.

pub mod add;
pub mod export;
pub mod get;
pub mod import_cmd;
pub mod init;
pub mod list;
pub mod passwd;
pub mod remove;
pub mod unlock;
pub mod verify;
