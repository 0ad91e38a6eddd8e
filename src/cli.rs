use crate::command::Command;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fstx", version, about = "Demonstrate file system transactions")]
pub struct Cli {
    /// Directory the example transactions work in
    #[arg(
        long,
        short = 'C',
        value_name = "DIR",
        default_value = ".",
        global = true
    )]
    pub dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}
