use clap::Args;
use clap_complete::Shell;

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to emit a completion script for.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Print the completion script for `shell` on stdout.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    clap_complete::generate(shell, command, "tembo", &mut stdout);
    Ok(())
}
