#![doc = include_str!("../README.md")]

pub mod cli;
pub mod command;
pub mod error;
pub mod fs;

pub use error::*;
pub use fs::{Transaction, TxId};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run() -> Result<()> {
    use clap::Parser;
    use command::Command;

    let cli = cli::Cli::parse();
    match cli.command {
        Command::Hello => command::hello::execute(&cli.dir),
        Command::Shortcuts => command::shortcuts::execute(&cli.dir),
        Command::Nested(args) => command::nested::execute(args, &cli.dir),
    }
}
