use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "snip",
    version,
    about = "Capture text, save it to your WordPress snippet store and browse saved snippets",
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Relay configuration file
    #[arg(short, long, global = true, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bridge URL of the running relay (defaults to the configured bind address)
    #[arg(long, global = true, env = "SNIP_RELAY_URL")]
    pub relay: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all logging except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture a text selection (reads stdin when TEXT is absent)
    Capture {
        /// Selected text
        text: Option<String>,
    },

    /// Show the currently captured text
    Captured,

    /// Save text to the snippet store (defaults to the captured text)
    Save {
        /// Text to save
        text: Option<String>,

        /// Category sent with the snippet
        #[arg(short = 'C', long, default_value = "")]
        category: String,
    },

    /// List saved snippets, newest first
    List {
        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: u64,

        /// Filter by text
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// Preview a single snippet
    Show {
        /// Snippet ID
        id: i64,
    },

    /// Print the raw content of a snippet, for piping into a clipboard tool
    Copy {
        /// Snippet ID
        id: i64,
    },

    /// Store the site URL, username and application password
    Configure {
        /// WordPress site URL
        #[arg(long)]
        url: String,

        /// WordPress username
        #[arg(long)]
        username: String,

        /// Application password
        #[arg(long, env = "SNIP_APPLICATION_PASSWORD", hide_env_values = true)]
        secret: String,
    },

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output
    Json,
    /// Table output
    Table,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_list() {
        let args = Args::parse_from(["snip", "list", "--page", "2", "--search", "rust", "-o", "json"]);
        assert_eq!(args.output, OutputFormat::Json);
        match args.command {
            Commands::List { page, search } => {
                assert_eq!(page, 2);
                assert_eq!(search, "rust");
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_parse_save_defaults() {
        let args = Args::parse_from(["snip", "save"]);
        match args.command {
            Commands::Save { text, category } => {
                assert!(text.is_none());
                assert!(category.is_empty());
            }
            _ => panic!("expected save"),
        }
    }

    #[test]
    fn test_configure_requires_all_fields() {
        assert!(
            Args::try_parse_from(["snip", "configure", "--url", "https://example.com"]).is_err()
        );
    }
}
