//! picast Command-Line Interface
//!
//! A headless client for the picast camera service, enabling scriptable
//! recording control and catalog access over the HTTP API.

mod client;
mod colors;
mod commands;
mod exit_codes;

use clap::{Parser, Subcommand};
use client::ServiceClient;
use exit_codes::ExitCode;

/// picast - Camera Service CLI
#[derive(Parser, Debug)]
#[command(name = "picast")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Base URL of the picast service
    #[arg(long, global = true, default_value = "http://127.0.0.1:3000")]
    url: String,

    /// Session token (falls back to the PICAST_TOKEN environment variable)
    #[arg(long, global = true)]
    token: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show service health and camera status
    Status,
    /// Log in and print a session token
    Login {
        /// Username configured on the service
        username: String,

        /// Password (falls back to the PICAST_PASSWORD environment variable)
        #[arg(long)]
        password: Option<String>,
    },
    /// Control the recorder
    Record {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// List recordings available for download
    List,
    /// Download a recording
    Fetch {
        /// Recording filename (use 'picast list' to find)
        filename: String,

        /// Destination path (defaults to the filename in the current directory)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand, Debug)]
enum RecordAction {
    /// Start recording the camera stream
    Start,
    /// Stop recording and transcode to MP4
    Stop {
        /// Transcode frame rate
        #[arg(long)]
        fps: Option<u32>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Build the async runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    let exit_code = runtime.block_on(run(cli));
    std::process::exit(exit_code.as_i32());
}

async fn run(cli: Cli) -> ExitCode {
    let token = cli
        .token
        .clone()
        .or_else(|| std::env::var("PICAST_TOKEN").ok().filter(|t| !t.is_empty()));
    let client = ServiceClient::new(&cli.url, token);

    match cli.command {
        Commands::Status => commands::status(client, cli.json).await,
        Commands::Login { username, password } => {
            commands::login(client, username, password, cli.json, cli.quiet).await
        }
        Commands::Record { action } => match action {
            RecordAction::Start => commands::record_start(client, cli.json, cli.quiet).await,
            RecordAction::Stop { fps } => {
                commands::record_stop(client, fps, cli.json, cli.quiet).await
            }
        },
        Commands::List => commands::list(client, cli.json, cli.quiet).await,
        Commands::Fetch { filename, output } => {
            commands::fetch(client, filename, output, cli.json, cli.quiet, cli.verbose).await
        }
        Commands::Version => {
            commands::version(cli.json);
            ExitCode::Success
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    /// Verify the CLI definition is valid
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    /// Test parsing 'status' command
    #[test]
    fn parse_status() {
        let cli = Cli::try_parse_from(["picast", "status"]).unwrap();
        assert!(!cli.json);
        assert!(!cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.url, "http://127.0.0.1:3000");
        assert!(cli.token.is_none());
        assert!(matches!(cli.command, Commands::Status));
    }

    /// Test parsing status command with --json flag
    #[test]
    fn parse_status_with_json() {
        let cli = Cli::try_parse_from(["picast", "--json", "status"]).unwrap();
        assert!(cli.json);
        assert!(!cli.quiet);
    }

    /// Test parsing 'login' command
    #[test]
    fn parse_login() {
        let cli = Cli::try_parse_from(["picast", "login", "admin"]).unwrap();
        match cli.command {
            Commands::Login { username, password } => {
                assert_eq!(username, "admin");
                assert!(password.is_none());
            }
            _ => panic!("Expected Login command"),
        }
    }

    /// Test parsing login command with --password flag
    #[test]
    fn parse_login_with_password() {
        let cli =
            Cli::try_parse_from(["picast", "login", "admin", "--password", "hunter2"]).unwrap();
        match cli.command {
            Commands::Login { username, password } => {
                assert_eq!(username, "admin");
                assert_eq!(password, Some("hunter2".to_string()));
            }
            _ => panic!("Expected Login command"),
        }
    }

    /// Test parsing 'record start' command
    #[test]
    fn parse_record_start() {
        let cli = Cli::try_parse_from(["picast", "record", "start"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Record {
                action: RecordAction::Start
            }
        ));
    }

    /// Test parsing 'record stop' command
    #[test]
    fn parse_record_stop() {
        let cli = Cli::try_parse_from(["picast", "record", "stop"]).unwrap();
        match cli.command {
            Commands::Record {
                action: RecordAction::Stop { fps },
            } => {
                assert!(fps.is_none());
            }
            _ => panic!("Expected Record Stop command"),
        }
    }

    /// Test parsing record stop command with --fps flag
    #[test]
    fn parse_record_stop_with_fps() {
        let cli = Cli::try_parse_from(["picast", "record", "stop", "--fps", "30"]).unwrap();
        match cli.command {
            Commands::Record {
                action: RecordAction::Stop { fps },
            } => {
                assert_eq!(fps, Some(30));
            }
            _ => panic!("Expected Record Stop command"),
        }
    }

    /// Test parsing 'list' command
    #[test]
    fn parse_list() {
        let cli = Cli::try_parse_from(["picast", "list"]).unwrap();
        assert!(matches!(cli.command, Commands::List));
    }

    /// Test parsing list command with --quiet flag
    #[test]
    fn parse_list_with_quiet() {
        let cli = Cli::try_parse_from(["picast", "-q", "list"]).unwrap();
        assert!(cli.quiet);
        assert!(!cli.json);
    }

    /// Test parsing 'fetch' command
    #[test]
    fn parse_fetch() {
        let cli = Cli::try_parse_from(["picast", "fetch", "recording_1737295200000.mp4"]).unwrap();
        match cli.command {
            Commands::Fetch { filename, output } => {
                assert_eq!(filename, "recording_1737295200000.mp4");
                assert!(output.is_none());
            }
            _ => panic!("Expected Fetch command"),
        }
    }

    /// Test parsing fetch command with -o flag
    #[test]
    fn parse_fetch_with_output() {
        let cli = Cli::try_parse_from([
            "picast",
            "fetch",
            "recording_1737295200000.mp4",
            "-o",
            "/tmp/clip.mp4",
        ])
        .unwrap();
        match cli.command {
            Commands::Fetch { output, .. } => {
                assert_eq!(output, Some("/tmp/clip.mp4".to_string()));
            }
            _ => panic!("Expected Fetch command"),
        }
    }

    /// Test parsing 'version' command
    #[test]
    fn parse_version() {
        let cli = Cli::try_parse_from(["picast", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }

    /// Test parsing with a custom service URL
    #[test]
    fn parse_custom_url() {
        let cli =
            Cli::try_parse_from(["picast", "--url", "http://camera-pi.local:3000", "status"])
                .unwrap();
        assert_eq!(cli.url, "http://camera-pi.local:3000");
    }

    /// Test parsing with a session token
    #[test]
    fn parse_token_flag() {
        let cli = Cli::try_parse_from(["picast", "--token", "deadbeef", "list"]).unwrap();
        assert_eq!(cli.token, Some("deadbeef".to_string()));
    }

    /// Test that global flags work after subcommand
    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["picast", "list", "--json", "-q"]).unwrap();
        assert!(cli.json);
        assert!(cli.quiet);
    }

    /// Test invalid command returns error
    #[test]
    fn parse_invalid_command() {
        let result = Cli::try_parse_from(["picast", "invalid"]);
        assert!(result.is_err());
    }

    /// Test missing login username returns error
    #[test]
    fn parse_missing_login_username() {
        let result = Cli::try_parse_from(["picast", "login"]);
        assert!(result.is_err());
    }

    /// Test missing fetch filename returns error
    #[test]
    fn parse_missing_fetch_filename() {
        let result = Cli::try_parse_from(["picast", "fetch"]);
        assert!(result.is_err());
    }

    /// Test bare 'record' without an action returns error
    #[test]
    fn parse_record_requires_action() {
        let result = Cli::try_parse_from(["picast", "record"]);
        assert!(result.is_err());
    }

    /// Test non-numeric fps returns error
    #[test]
    fn parse_invalid_fps() {
        let result = Cli::try_parse_from(["picast", "record", "stop", "--fps", "smooth"]);
        assert!(result.is_err());
    }
}
