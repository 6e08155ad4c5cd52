use std::path::PathBuf;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{error, info, warn};
use zeroize::Zeroizing;

use crate::config::SecretString;
use crate::services::command::SwapCommand;

static TX_HASH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"txhash:\s*([A-Fa-f0-9]+)").expect("valid txhash pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Command was staged to the sink only.
    DryRun,
    Confirmed,
    /// Zero exit, but no hash could be found in the output.
    SubmittedWithoutHash,
    Failed {
        exit_code: Option<i32>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub status: ExecutionStatus,
    pub tx_hash: Option<String>,
    pub output: String,
}

impl ExecutionOutcome {
    fn dry_run() -> Self {
        Self {
            status: ExecutionStatus::DryRun,
            tx_hash: None,
            output: String::new(),
        }
    }

    fn failed(exit_code: Option<i32>, output: String) -> Self {
        Self {
            status: ExecutionStatus::Failed { exit_code },
            tx_hash: None,
            output,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            ExecutionStatus::Confirmed | ExecutionStatus::SubmittedWithoutHash
        )
    }
}

pub fn extract_tx_hash(output: &str) -> Option<String> {
    TX_HASH_PATTERN
        .captures(output)
        .and_then(|captures| captures.get(1))
        .map(|hash| hash.as_str().to_string())
}

/// Runs the chain client once. Nothing here retries: resubmitting a swap
/// has to be an explicit new invocation.
pub struct Executor {
    sink_path: PathBuf,
    dry_run: bool,
    timeout: Option<Duration>,
}

impl Executor {
    pub fn new(sink_path: PathBuf, dry_run: bool, timeout: Option<Duration>) -> Self {
        Self {
            sink_path,
            dry_run,
            timeout,
        }
    }

    pub async fn execute(&self, command: &SwapCommand, secret: &SecretString) -> ExecutionOutcome {
        self.record(command).await;

        if self.dry_run {
            info!(
                event = "dry_run",
                sink = %self.sink_path.display(),
                "Dry-run mode: command saved, chain client not invoked"
            );
            return ExecutionOutcome::dry_run();
        }

        let started_at = Instant::now();
        let outcome = self.run(command, secret).await;
        let latency_ms = started_at.elapsed().as_millis() as u64;

        match &outcome.status {
            ExecutionStatus::Confirmed => info!(
                event = "swap_submitted",
                tx_hash = outcome.tx_hash.as_deref().unwrap_or(""),
                latency_ms,
                "Transaction submitted"
            ),
            ExecutionStatus::SubmittedWithoutHash => warn!(
                event = "swap_submitted",
                latency_ms,
                "Transaction hash not found in chain client output"
            ),
            ExecutionStatus::Failed { exit_code } => error!(
                event = "swap_failed",
                exit_code = exit_code.unwrap_or(-1),
                latency_ms,
                output = outcome.output.trim(),
                "Chain client execution failed"
            ),
            ExecutionStatus::DryRun => {}
        }
        outcome
    }

    async fn record(&self, command: &SwapCommand) {
        if let Err(err) = tokio::fs::write(&self.sink_path, format!("{}\n", command)).await {
            warn!(
                event = "command_sink_failed",
                sink = %self.sink_path.display(),
                error = %err,
                "Failed to write command to diagnostic sink"
            );
        }
    }

    async fn run(&self, command: &SwapCommand, secret: &SecretString) -> ExecutionOutcome {
        let mut child = match Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                return ExecutionOutcome::failed(
                    None,
                    format!("failed to start {}: {}", command.program(), err),
                )
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            let mut line = Zeroizing::new(Vec::with_capacity(secret.expose().len() + 1));
            line.extend_from_slice(secret.expose().as_bytes());
            line.push(b'\n');
            if let Err(err) = stdin.write_all(&line).await {
                // The client may exit before reading its prompt.
                warn!(error = %err, "Failed to write passphrase to chain client");
            }
            drop(stdin);
        }

        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    return ExecutionOutcome::failed(
                        None,
                        format!(
                            "chain client timed out after {} ms",
                            limit.as_millis() as u64
                        ),
                    )
                }
            },
            None => child.wait_with_output().await,
        };

        let output = match waited {
            Ok(output) => output,
            Err(err) => {
                return ExecutionOutcome::failed(
                    None,
                    format!("failed to collect chain client output: {}", err),
                )
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return ExecutionOutcome::failed(output.status.code(), combined);
        }

        match extract_tx_hash(&combined) {
            Some(hash) => ExecutionOutcome {
                status: ExecutionStatus::Confirmed,
                tx_hash: Some(hash),
                output: combined,
            },
            None => ExecutionOutcome {
                status: ExecutionStatus::SubmittedWithoutHash,
                tx_hash: None,
                output: combined,
            },
        }
    }
}
