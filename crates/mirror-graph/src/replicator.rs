//! The replication loop.
//!
//! One long-running task per (source, sink, database) triple. Each poll
//! cycle opens a read transaction on the source, streams the change
//! records since the cursor, and applies every record in arrival order.
//! A record's mutation and the cursor mirror commit in one sink
//! transaction, so the mirror reflects exactly the last successfully
//! applied event. The cursor never advances past a failed commit; on
//! restart the source re-emits from the last stored id and the
//! idempotent queries absorb the redelivery.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use neo4rs::Query;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use mirror_core::{compose, ChangeEvent, RawEvent};

use crate::client::GraphClient;
use crate::cursor::{self, Cursor};
use crate::params::{bind, bolt_value};

const QUERY_CHANGES: &str = "CALL cdc.query($from, $selectors)";
const EARLIEST_CHANGE_ID: &str = "CALL cdc.earliest()";
const CURRENT_CHANGE_ID: &str = "CALL cdc.current()";

/// Poll-cycle pacing: a longer wait before the first cycle, then a short
/// delay between cycles.
#[derive(Debug, Clone)]
pub struct Pacing {
    pub initial_delay: Duration,
    pub poll_interval: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Replication settings. Passed explicitly to the constructor; there is
/// no process-wide state.
#[derive(Debug, Clone, Default)]
pub struct ReplicatorConfig {
    /// Start cursor. Empty means "bootstrap to the source's current
    /// change id".
    pub from: String,
    /// Opaque filter expressions, passed through to the source's change
    /// query unchanged.
    pub selectors: Vec<Value>,
    pub pacing: Pacing,
}

/// One-way CDC replicator between a source and a sink graph.
pub struct Replicator {
    source: GraphClient,
    sink: GraphClient,
    cursor: Cursor,
    selectors: Vec<Value>,
    pacing: Pacing,
}

impl Replicator {
    pub fn new(source: GraphClient, sink: GraphClient, config: ReplicatorConfig) -> Self {
        Self {
            source,
            sink,
            cursor: Cursor::new(config.from),
            selectors: config.selectors,
            pacing: config.pacing,
        }
    }

    /// The in-memory replication cursor, readable by observers.
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Oldest change id the source still retains.
    pub async fn earliest_change_id(&self) -> Result<String> {
        self.query_change_id(EARLIEST_CHANGE_ID).await
    }

    /// Most recent change id on the source.
    pub async fn current_change_id(&self) -> Result<String> {
        self.query_change_id(CURRENT_CHANGE_ID).await
    }

    async fn query_change_id(&self, cypher: &str) -> Result<String> {
        let rows = self
            .source
            .rows(Query::new(cypher.to_string()))
            .await
            .context("unable to query change identifier")?;
        if rows.len() != 1 {
            bail!("expected one record, but got {}", rows.len());
        }
        rows[0]
            .get("id")
            .map_err(|e| anyhow!("unable to extract id: {e:?}"))
    }

    /// Initialize the cursor. An empty configured start cursor adopts
    /// the source's current change id; anything else is kept verbatim.
    /// Errors here are fatal; the loop never starts.
    pub async fn bootstrap(&self) -> Result<()> {
        if !self.cursor.is_empty() {
            return Ok(());
        }
        let current = self
            .current_change_id()
            .await
            .context("unable to determine initial cursor")?;
        info!(cursor = %current, "bootstrapped cursor from source");
        self.cursor.set(current);
        Ok(())
    }

    /// Run the replication loop until cancelled or a cycle fails.
    ///
    /// Cancellation is a clean shutdown, not an error: the loop exits at
    /// the next safe point — between records or at the next suspension.
    /// An in-flight sink transaction may either commit or be aborted by
    /// the driver; both outcomes are safe on restart.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let mut delay = self.pacing.initial_delay;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("replication loop cancelled");
                    return Ok(());
                }
                _ = tokio::time::sleep(delay) => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("replication loop cancelled");
                    return Ok(());
                }
                result = self.poll_changes() => {
                    result.context("unable to query/process changes")?;
                }
            }

            delay = self.pacing.poll_interval;
        }
    }

    /// One poll cycle: stream the changes since the cursor within a
    /// single read transaction on the source and apply each in order.
    async fn poll_changes(&self) -> Result<()> {
        let from = self.cursor.get();
        debug!(%from, "polling for changes");

        let mut txn = self
            .source
            .begin()
            .await
            .context("unable to open read transaction on source")?;
        let query = Query::new(QUERY_CHANGES.to_string())
            .param("from", from.as_str())
            .param("selectors", bolt_value(&Value::Array(self.selectors.clone())));
        let mut rows = txn.execute(query).await.context("change query failed")?;

        while let Some(row) = rows
            .next(txn.handle())
            .await
            .context("change stream read failed")?
        {
            let id: String = row
                .get("id")
                .map_err(|_| anyhow!("missing or invalid id value returned"))?;
            let event: Value = row
                .get("event")
                .map_err(|e| anyhow!("missing event payload on record {id}: {e:?}"))?;

            self.apply_change(&id, &event)
                .await
                .with_context(|| format!("error processing record {id}"))?;
            self.cursor.set(id);
        }

        txn.commit()
            .await
            .context("unable to finish read transaction on source")?;
        Ok(())
    }

    /// Translate one change record and apply it to the sink.
    ///
    /// A non-empty mutation and the cursor-mirror write commit in one
    /// transaction. A no-op advances only the in-memory cursor; the
    /// mirror catches up on the next non-empty commit.
    async fn apply_change(&self, id: &str, event: &Value) -> Result<()> {
        let record = serde_json::json!({ "id": id, "event": event });
        println!(
            "{}",
            serde_json::to_string_pretty(&record).unwrap_or_else(|_| record.to_string())
        );

        let raw: RawEvent = serde_json::from_value(event.clone())
            .context("unrecognized change event shape")?;
        let change = ChangeEvent::try_from(raw).context("incompatible change event")?;

        let Some(mutation) = compose(&change)? else {
            debug!(id, "change produced no mutation; advancing cursor only");
            return Ok(());
        };

        let mut txn = self
            .sink
            .begin()
            .await
            .context("unable to open write transaction on sink")?;
        txn.run(bind(Query::new(mutation.cypher.clone()), &mutation.params))
            .await
            .context("mutation failed on sink")?;
        txn.run(cursor::store_query(id))
            .await
            .context("unable to store change identifier")?;
        txn.commit().await.context("unable to commit change")?;

        info!(id, "applied change");
        Ok(())
    }
}
