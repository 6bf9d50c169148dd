//! JSON-Lines Batch Mode
//!
//! Reads one request per line from stdin, translates concurrently, and
//! writes one response per line to stdout as each finishes.
//!
//! ```text
//! stdin  ──► parse ──► semaphore ──► spawn(translate) ──► mpsc ──► stdout
//!              │                          │
//!              ├─ malformed: 400          └─ panicked: 500 (generic)
//!              └─ cache command: answered inline
//! ```
//!
//! A line carrying `"command"` manages the cache instead of translating:
//!
//! ```text
//! {"command":"cache_stats","top":5}   statistics and the most-hit entries
//! {"command":"cache_purge"}           drop expired entries
//! {"command":"cache_clear"}           drop everything, reset counters
//! ```
//!
//! Responses are written in completion order; callers correlate by `id`.
//! Ctrl-C stops reading and lets in-flight requests finish.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use lingua_core::{
    BackendPreference, CacheReport, ErrorReport, TranslateRequest, TranslationError,
    TranslationResult, TranslationService,
};

/// Entries listed by `cache_stats` when the line gives no `top`
const DEFAULT_TOP: usize = 10;

/// One input line
#[derive(Debug, Deserialize)]
struct BatchRequest {
    source_language: String,
    target_language: String,
    text: String,
    #[serde(default)]
    context: String,
    prefer: Option<String>,
}

/// Cache maintenance a line can ask for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheCommand {
    /// Report statistics and the most-hit entries
    CacheStats,
    /// Drop expired entries
    CachePurge,
    /// Drop every entry and reset counters
    CacheClear,
}

/// One cache-command input line
#[derive(Debug, Deserialize)]
struct CommandRequest {
    command: CacheCommand,
    top: Option<usize>,
}

/// Result of a cache command
#[derive(Debug, PartialEq, Serialize)]
pub struct CacheOutcome {
    /// The command that ran
    pub command: CacheCommand,
    /// Entries removed by `cache_purge`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purged: Option<usize>,
    /// Cache state after the command
    pub cache: CacheReport,
}

/// A parsed input line
#[derive(Debug)]
pub enum BatchLine {
    /// Translate and answer asynchronously
    Translate(TranslateRequest),
    /// Manage the cache and answer inline
    Cache {
        /// What to do
        command: CacheCommand,
        /// Entries to list in the report
        top: usize,
    },
}

/// One output line
#[derive(Debug, PartialEq, Serialize)]
pub struct BatchResponse {
    /// Request id, generated when the line carried none
    pub id: String,
    /// HTTP-style status
    pub status: u16,
    /// The translation, when it succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TranslationResult>,
    /// The classified failure otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
    /// Answer to a cache command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheOutcome>,
}

impl BatchResponse {
    fn ok(id: String, result: TranslationResult) -> Self {
        Self {
            id,
            status: 200,
            result: Some(result),
            error: None,
            cache: None,
        }
    }

    fn error(id: String, report: ErrorReport) -> Self {
        Self {
            id,
            status: report.http_status(),
            result: None,
            error: Some(report),
            cache: None,
        }
    }

    fn cache(id: String, outcome: CacheOutcome) -> Self {
        Self {
            id,
            status: 200,
            result: None,
            error: None,
            cache: Some(outcome),
        }
    }

    /// Response for a service outcome
    pub fn from_outcome(id: String, outcome: Result<TranslationResult, TranslationError>) -> Self {
        match outcome {
            Ok(result) => match result.error.clone() {
                Some(report) => Self::error(id, report),
                None => Self::ok(id, result),
            },
            Err(e) => Self::error(id, e.report()),
        }
    }

    fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Parse one input line into an id and a request or cache command
///
/// A line that cannot be parsed becomes a ready-made 400 response, keeping
/// the line's `id` when one could be read.
pub fn parse_line(line: &str) -> Result<(String, BatchLine), BatchResponse> {
    let value: serde_json::Value = serde_json::from_str(line).map_err(|e| {
        BatchResponse::error(
            Uuid::new_v4().to_string(),
            TranslationError::validation("request", format!("Malformed request line: {e}"))
                .report(),
        )
    })?;
    let id = value
        .get("id")
        .and_then(serde_json::Value::as_str)
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

    if value.get("command").is_some() {
        let raw: CommandRequest = serde_json::from_value(value).map_err(|e| {
            BatchResponse::error(
                id.clone(),
                TranslationError::validation("command", format!("Unknown cache command: {e}"))
                    .report(),
            )
        })?;
        let top = raw.top.unwrap_or(DEFAULT_TOP);
        return Ok((
            id,
            BatchLine::Cache {
                command: raw.command,
                top,
            },
        ));
    }

    let raw: BatchRequest = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(e) => {
            return Err(BatchResponse::error(
                id,
                TranslationError::validation("request", format!("Malformed request line: {e}"))
                    .report(),
            ))
        }
    };

    let preference = match raw.prefer.as_deref() {
        None => BackendPreference::Auto,
        Some(value) => match value.parse::<BackendPreference>() {
            Ok(p) => p,
            Err(msg) => {
                return Err(BatchResponse::error(
                    id,
                    TranslationError::validation("prefer", msg).report(),
                ))
            }
        },
    };

    let request = TranslateRequest::new(raw.source_language, raw.target_language, raw.text)
        .with_context(raw.context)
        .with_preference(preference);
    Ok((id, BatchLine::Translate(request)))
}

/// Run a cache command against the service
pub fn run_cache_command(
    service: &TranslationService,
    id: String,
    command: CacheCommand,
    top: usize,
) -> BatchResponse {
    let purged = match command {
        CacheCommand::CacheStats => None,
        CacheCommand::CachePurge => Some(service.purge_expired()),
        CacheCommand::CacheClear => {
            if let Err(e) = service.clear_cache() {
                return BatchResponse::error(id, e.report());
            }
            None
        }
    };
    debug!(?command, ?purged, "Cache command handled");
    BatchResponse::cache(
        id,
        CacheOutcome {
            command,
            purged,
            cache: service.cache_report(top),
        },
    )
}

/// Totals for one batch run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Lines answered
    pub total: usize,
    /// Lines answered with a failure
    pub failed: usize,
}

/// Wait for a free slot, or `None` if `interrupt` completes first
async fn acquire_slot<F: Future>(
    semaphore: &Arc<Semaphore>,
    interrupt: F,
) -> Result<Option<OwnedSemaphorePermit>> {
    tokio::select! {
        permit = Arc::clone(semaphore).acquire_owned() => {
            Ok(Some(permit.context("Batch semaphore closed")?))
        }
        _ = interrupt => Ok(None),
    }
}

/// Process stdin until EOF or Ctrl-C
pub async fn run(service: Arc<TranslationService>, concurrency: usize) -> Result<BatchSummary> {
    let concurrency = concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let (tx, mut rx) = mpsc::channel::<BatchResponse>(concurrency * 2);

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        let mut summary = BatchSummary::default();
        while let Some(response) = rx.recv().await {
            summary.total += 1;
            if !response.is_success() {
                summary.failed += 1;
            }
            let line = serde_json::to_string(&response)?;
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<_, anyhow::Error>(summary)
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(concurrency, "Batch mode reading requests from stdin");
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = &mut ctrl_c => {
                warn!("Interrupted, finishing in-flight requests");
                break;
            }
        };
        let Some(line) = line else {
            debug!("End of input");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let (id, request) = match parse_line(&line) {
            Ok((id, BatchLine::Translate(request))) => (id, request),
            Ok((id, BatchLine::Cache { command, top })) => {
                let response = run_cache_command(&service, id, command, top);
                tx.send(response).await.context("Output writer stopped")?;
                continue;
            }
            Err(response) => {
                tx.send(response).await.context("Output writer stopped")?;
                continue;
            }
        };

        let Some(permit) = acquire_slot(&semaphore, &mut ctrl_c).await? else {
            warn!(id = %id, "Interrupted while waiting for a free slot, request dropped");
            break;
        };
        let service = Arc::clone(&service);
        let tx = tx.clone();

        tasks.spawn(async move {
            let _permit = permit;
            let work = tokio::spawn(async move { service.translate(&request).await });
            let response = match work.await {
                Ok(outcome) => BatchResponse::from_outcome(id, outcome),
                Err(join_error) => BatchResponse::error(id, ErrorReport::unexpected(&join_error)),
            };
            if tx.send(response).await.is_err() {
                warn!("Output writer stopped, dropping response");
            }
        });
    }

    while tasks.join_next().await.is_some() {}
    drop(tx);

    let summary = writer.await.context("Output writer panicked")??;
    info!(total = summary.total, failed = summary.failed, "Batch finished");
    Ok(summary)
}
