//! Seed the source database with test data.

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use mirror_graph::{seed_triples, GraphClient, GraphConfig};

#[derive(Args)]
pub struct SeedArgs {
    /// Number of (:Resource)-[:RELATES_TO]->(:Resource) triples to create
    pub count: usize,

    /// Source driver URI
    #[arg(short = 'o', long = "source_address", default_value = "bolt://localhost:7687")]
    pub source_address: String,

    /// Database name
    #[arg(short = 'd', long, default_value = "")]
    pub database: String,

    /// Username
    #[arg(short = 'u', long, default_value = "neo4j")]
    pub username: String,

    /// Password
    #[arg(short = 'p', long, default_value = "password")]
    pub password: String,
}

pub async fn execute(args: SeedArgs) -> Result<()> {
    if args.count == 0 {
        bail!("seed count must be positive");
    }

    let client = GraphClient::connect(&GraphConfig {
        uri: args.source_address,
        user: args.username,
        password: args.password,
        database: args.database,
    })
    .await?;

    seed_triples(&client, args.count).await?;

    println!(
        "{} {} triple(s) on the source",
        "Seeded".green().bold(),
        args.count
    );
    Ok(())
}
