//! CLI module - Command-line interface for Division
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{AccountId, RequestId};

/// Division - AI image generation with a prepaid credit ledger
#[derive(Debug, Parser)]
#[command(name = "division")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Create an account and log in
    Signup {
        name: String,
        email: String,
        #[arg(long)]
        password: String,
        /// Repeat the password
        #[arg(long)]
        confirm: String,
    },

    /// Log in to an existing account
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },

    /// End the current session
    Logout,

    /// Show the logged-in account and its balance
    #[command(alias = "me")]
    Whoami,

    /// List purchasable credit plans
    Plans,

    /// Submit a bank transfer for a plan
    Buy {
        /// Plan name, e.g. "Starter Pack"
        plan: String,
        /// UTR / transaction ID of the transfer
        utr: String,
    },

    /// Show your payment requests
    Requests,

    /// Show recent balance changes
    #[command(alias = "h")]
    History {
        /// Number of entries to show
        #[arg(default_value = "20")]
        limit: u64,
    },

    /// List style presets
    Styles,

    /// Generate images from a prompt
    #[command(alias = "gen", alias = "g")]
    Generate {
        #[arg(required = true)]
        prompt: Vec<String>,
        /// Number of images
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,
        /// Style preset id (see `division styles`)
        #[arg(short, long)]
        style: Option<String>,
    },

    /// Edit an existing image with a prompt
    Edit {
        /// Source image file
        image: PathBuf,
        #[arg(required = true)]
        prompt: Vec<String>,
    },

    /// Administrator commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum AdminCommands {
    /// List pending payment requests
    Pending,
    /// List all payment requests
    Requests,
    /// Approve a pending request and grant its credits
    Approve { id: RequestId },
    /// Reject a pending request
    Reject { id: RequestId },
    /// List all accounts
    #[command(alias = "ls")]
    Users,
    /// Overwrite an account's balance
    SetCredits { id: AccountId, credits: i64 },
    /// Add credits to an account
    Grant { id: AccountId, credits: i64 },
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_with_options() {
        let cli = Cli::try_parse_from([
            "division", "generate", "-n", "2", "--style", "anime", "a", "red", "fox",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate {
                prompt,
                count,
                style,
            } => {
                assert_eq!(prompt.join(" "), "a red fox");
                assert_eq!(count, 2);
                assert_eq!(style.as_deref(), Some("anime"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_admin_approve_id() {
        let cli = Cli::try_parse_from(["division", "admin", "approve", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Admin {
                command: AdminCommands::Approve { id }
            } if id == RequestId::new(7)
        ));
    }

    #[test]
    fn rejects_non_numeric_ids() {
        assert!(Cli::try_parse_from(["division", "admin", "reject", "abc"]).is_err());
    }

    #[test]
    fn signup_requires_confirmation() {
        assert!(
            Cli::try_parse_from([
                "division",
                "signup",
                "Jane",
                "jane@example.com",
                "--password",
                "secret123"
            ])
            .is_err()
        );
    }
}
