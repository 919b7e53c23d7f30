use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lingomark",
    version,
    about = "Segment annotated tutor chat text into typed segments",
    after_help = "Markers look like [TYPE:payload], e.g. [ERROR:goed] [CORRECTION:went] or \
                  [VOCAB_WORD:serendipity|a fortunate happenstance]. Settings are read from \
                  .lingomark/config.toml in the working directory. Logs go to stderr; set \
                  RUST_LOG=debug for more."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse text synchronously and print its segments as JSON.
    ///
    /// With several files, each is parsed in parallel and printed with its path.
    Parse {
        /// Input files ("-" or nothing reads stdin)
        files: Vec<String>,
    },

    /// Segment text through the background worker.
    Format {
        /// Input file ("-" reads stdin)
        #[arg(default_value = "-")]
        file: String,
        /// Print each batch as a JSON line as it arrives
        #[arg(long)]
        stream: bool,
        /// Skip the worker and parse in-process
        #[arg(long)]
        sync: bool,
    },

    /// Run the worker protocol over stdin/stdout, one JSON message per line.
    ///
    /// Input lines are {"id": N, "content": "..."}. Output lines are
    /// {"id": N, "segments": [...]}, {"id": N, "done": true} or {"id": N, "error": "..."}.
    Serve,

    /// Show the effective settings.
    Config {
        /// Write the effective settings to .lingomark/config.toml
        #[arg(long)]
        write: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_accepts_many_files() {
        let cli = Cli::try_parse_from(["lingomark", "parse", "a.txt", "b.txt"]).unwrap();
        match cli.command {
            Command::Parse { files } => assert_eq!(files, vec!["a.txt", "b.txt"]),
            _ => panic!("expected parse"),
        }
    }

    #[test]
    fn format_defaults_to_stdin() {
        let cli = Cli::try_parse_from(["lingomark", "format", "--stream"]).unwrap();
        match cli.command {
            Command::Format { file, stream, sync } => {
                assert_eq!(file, "-");
                assert!(stream);
                assert!(!sync);
            }
            _ => panic!("expected format"),
        }
    }
}
