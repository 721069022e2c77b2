//! Replication command.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tokio_util::sync::CancellationToken;

use mirror_graph::{GraphClient, GraphConfig, Pacing, Replicator, ReplicatorConfig};

#[derive(Args)]
pub struct ReplicateArgs {
    /// Source driver URI
    #[arg(short = 'o', long = "source_address", default_value = "bolt://localhost:7687")]
    pub source_address: String,

    /// Sink driver URI
    #[arg(short = 'i', long = "sink_address", default_value = "bolt://localhost:7787")]
    pub sink_address: String,

    /// Database name on both endpoints
    #[arg(short = 'd', long, default_value = "")]
    pub database: String,

    /// Username shared by both endpoints
    #[arg(short = 'u', long, default_value = "neo4j")]
    pub username: String,

    /// Password shared by both endpoints
    #[arg(short = 'p', long, default_value = "password")]
    pub password: String,

    /// Change identifier to query changes from; empty bootstraps to the
    /// source's current change id
    #[arg(short = 'f', long, default_value = "")]
    pub from: String,
}

pub async fn execute(args: ReplicateArgs) -> Result<()> {
    let source = GraphClient::connect(&GraphConfig {
        uri: args.source_address,
        user: args.username.clone(),
        password: args.password.clone(),
        database: args.database.clone(),
    })
    .await?;
    let sink = GraphClient::connect(&GraphConfig {
        uri: args.sink_address,
        user: args.username,
        password: args.password,
        database: args.database,
    })
    .await?;

    let replicator = Arc::new(Replicator::new(
        source,
        sink,
        ReplicatorConfig {
            from: args.from,
            selectors: Vec::new(),
            pacing: Pacing::default(),
        },
    ));
    replicator.bootstrap().await?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    println!("{}", "starting...".bold());
    let task = tokio::spawn({
        let replicator = Arc::clone(&replicator);
        async move { replicator.run(cancel).await }
    });
    task.await??;
    println!("{}", "quitting...".bold());

    Ok(())
}
