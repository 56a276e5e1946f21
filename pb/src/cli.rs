//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// PalaceBuilder - memory palaces that grow as you finish your tasks
#[derive(Parser)]
#[command(
    name = "pb",
    about = "Decompose tasks with an LLM and reveal a memory palace layer by layer",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server and palace workers
    Serve {
        /// Address to bind, overriding the config
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Decompose a task description and print the plan as JSON
    Decompose {
        /// Task description
        text: String,
    },

    /// Render a task's palace once, in the foreground
    Render {
        /// Top-level task id (a sub-task id renders its parent)
        #[arg(short, long)]
        task: i64,
    },

    /// Write a layer mask PNG for inspection
    Mask {
        /// Number of layers
        #[arg(short, long)]
        total: usize,

        /// Completed orders, comma separated
        #[arg(short, long, value_delimiter = ',')]
        completed: Vec<i64>,

        /// Output file
        #[arg(short, long, default_value = "mask.png")]
        out: PathBuf,

        /// Mask width in pixels
        #[arg(long, default_value_t = 512)]
        width: u32,

        /// Mask height in pixels
        #[arg(long, default_value_t = 512)]
        height: u32,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("palacebuilder")
        .join("logs")
        .join("palacebuilder.log")
}

/// Generate the after_help text with API key status and log location
pub fn generate_after_help(key_envs: &[&str]) -> String {
    debug!(?key_envs, "generate_after_help: called");
    let mut help = String::from("API keys:\n");
    for env_name in key_envs {
        let icon = if std::env::var(env_name).is_ok() {
            "\u{2705}"
        } else {
            "\u{274C}"
        };
        help.push_str(&format!("  {} {}\n", icon, env_name));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["pb"]).is_err());
    }

    #[test]
    fn test_cli_parse_serve() {
        let cli = Cli::parse_from(["pb", "serve", "--bind", "0.0.0.0:9000"]);
        assert!(matches!(cli.command, Command::Serve { bind: Some(ref b) } if b == "0.0.0.0:9000"));
    }

    #[test]
    fn test_cli_parse_decompose_with_globals() {
        let cli = Cli::parse_from(["pb", "decompose", "Write a report", "-l", "debug", "-c", "pb.yml"]);
        assert!(matches!(cli.command, Command::Decompose { ref text } if text == "Write a report"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("pb.yml")));
    }

    #[test]
    fn test_cli_parse_render() {
        let cli = Cli::parse_from(["pb", "render", "--task", "12"]);
        assert!(matches!(cli.command, Command::Render { task: 12 }));
    }

    #[test]
    fn test_cli_parse_mask() {
        let cli = Cli::parse_from(["pb", "mask", "--total", "4", "--completed", "1,3", "--out", "m.png"]);
        match cli.command {
            Command::Mask {
                total,
                completed,
                out,
                width,
                height,
            } => {
                assert_eq!(total, 4);
                assert_eq!(completed, vec![1, 3]);
                assert_eq!(out, PathBuf::from("m.png"));
                assert_eq!((width, height), (512, 512));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_after_help_mentions_log_path() {
        let help = generate_after_help(&["PB_TEST_SURELY_UNSET_KEY"]);
        assert!(help.contains("PB_TEST_SURELY_UNSET_KEY"));
        assert!(help.contains("palacebuilder.log"));
    }
}
