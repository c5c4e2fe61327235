use clap::CommandFactory;
use clap_complete::Shell;
use std::io;

use crate::Cli;

pub fn generate(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "file-index", &mut io::stdout());
}
