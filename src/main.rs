use clap::Parser;
use crossterm::tty::IsTty;
use ed_rus::Session;
use ed_rus::config::{RcConfig, RcLoader};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "ED_RUS_LOG";

#[derive(Parser)]
#[command(version, about = "A line-oriented text editor", long_about = None)]
struct Cli {
    /// Use PROMPT as the command prompt and turn it on
    #[arg(short, long)]
    prompt: Option<String>,

    /// Suppress byte counts and the `!` after shell commands
    #[arg(short, long)]
    silent: bool,

    /// Explain errors instead of printing a bare `?`
    #[arg(short, long)]
    verbose: bool,

    /// Print a sample .edrusrc and exit
    #[arg(long)]
    sample_rc: bool,

    /// File to edit
    file: Option<PathBuf>,
}

impl Cli {
    /// Flags win over the rc file.
    fn apply(&self, config: &mut RcConfig) {
        if let Some(prompt) = &self.prompt {
            config.prompt = prompt.clone();
            config.show_prompt = true;
        }
        if self.silent {
            config.silent = true;
        }
        if self.verbose {
            config.verbose = true;
        }
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // stdout belongs to the editor, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.sample_rc {
        print!("{}", RcLoader::generate_sample_rc());
        return Ok(ExitCode::SUCCESS);
    }

    // Load RC configuration
    let mut config = RcLoader::load_config();
    cli.apply(&mut config);

    let styled = io::stdout().is_tty();
    let mut session = Session::new(io::stdin().lock(), io::stdout().lock(), config)
        .with_styling(styled);

    if let Some(file) = cli.file {
        session.open_initial(file)?;
    }

    let clean = session.run()?;
    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_rc() {
        let cli = Cli::parse_from(["ed-rus", "-p", ":", "-v", "notes.txt"]);
        let mut config = RcConfig {
            silent: true,
            ..RcConfig::default()
        };
        cli.apply(&mut config);

        assert_eq!(config.prompt, ":");
        assert!(config.show_prompt);
        assert!(config.verbose);
        assert!(config.silent);
        assert_eq!(cli.file, Some(PathBuf::from("notes.txt")));
    }

    #[test]
    fn test_no_flags_keep_rc() {
        let cli = Cli::parse_from(["ed-rus"]);
        let mut config = RcConfig::default();
        cli.apply(&mut config);
        assert_eq!(config, RcConfig::default());
        assert!(cli.file.is_none());
        assert!(!cli.sample_rc);
    }

    #[test]
    fn test_sample_rc_flag() {
        let cli = Cli::parse_from(["ed-rus", "--sample-rc"]);
        assert!(cli.sample_rc);
        assert!(cli.file.is_none());
    }
}
