//! Subcommands of the `mizan` binary

pub mod debate;
pub mod extract;
pub mod info;
pub mod verify;
