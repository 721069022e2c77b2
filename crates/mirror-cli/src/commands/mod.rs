//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod replicate;
pub mod seed;

/// Graph Mirror - CDC replication between property-graph databases
#[derive(Parser)]
#[command(name = "mirror")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replicate changes from the source graph to the sink
    Replicate(replicate::ReplicateArgs),

    /// Seed the source database with test triples
    Seed(seed::SeedArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Replicate(args) => replicate::execute(args).await,
            Commands::Seed(args) => seed::execute(args).await,
        }
    }
}
