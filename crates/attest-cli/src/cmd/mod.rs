use anyhow::Result;

use crate::args::{Cli, Command};

mod digest;
mod obfuscate;
mod unsalt;
mod verify;
mod wrap;

pub fn dispatch(cli: Cli) -> Result<()> {
    let max = cli.max_json_bytes;
    match cli.command {
        Command::Wrap { inputs, out, format, preserve_salted } => {
            wrap::run(&inputs, &out, &format, preserve_salted, max)
        }
        Command::Verify { files } => verify::run(&files, max),
        Command::Obfuscate { file, paths, out } => obfuscate::run(&file, &paths, out.as_deref(), max),
        Command::Digest { file } => digest::run(&file, max),
        Command::Unsalt { file } => unsalt::run(&file, max),
    }
}
