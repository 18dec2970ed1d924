use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "git-linear")]
#[command(about = "Create git branches from Linear issues")]
#[command(
    long_about = "git-linear helps you create properly-named git branches from your assigned Linear issues."
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store your Linear personal API key
    Auth,

    /// Remove the stored Linear API key
    Logout,
}
