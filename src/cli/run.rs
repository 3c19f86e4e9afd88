use super::config::{resolve_config_path, BallotConfig};
use super::logging;
use ballot::ballot::{
    BallotHandle, EventRecord, EventStream, EventStreamError, WeakBallotHandle, WorkflowStatus,
};
use ballot::script::{Script, StepReport};
use ballot::serialization::ExportFormat;
use futures::StreamExt;
use std::path::Path;

/// Run a scripted ballot session
///
/// Builds a ballot from the configuration, executes every step of the script
/// in order and prints the final result.
///
/// ## Configuration Loading
///
/// 1. `--config` flag if provided
/// 2. Default config at `~/.local/share/ballot/config.toml`
///
/// Run `ballot init` first if neither exists.
///
/// ## Notifications
///
/// With `follow`, a background task subscribes to the push stream before the
/// first step and prints every record as one JSON line, in sequence order.
/// Records it misses by lagging are read back from the log. With `export`, the
/// whole log is written to that file, even when a step aborted the run.
pub async fn execute(
    script_path: String,
    config_path: Option<String>,
    export: Option<String>,
    format: ExportFormat,
    follow: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = resolve_config_path(config_path);
    if !config_path.exists() {
        return Err(format!(
            "Config file '{}' not found. Run `ballot init` first.",
            config_path.display()
        )
        .into());
    }
    let config = BallotConfig::load(&config_path)?;
    logging::init(&config.logging)?;

    let script = Script::load(Path::new(&script_path))?;

    println!("🗳️  Ballot: {}", config.ballot.question.trim());
    println!("Config: {}", config_path.display());
    println!("Script: {} ({} steps)", script_path, script.steps.len());
    println!();

    let handle = BallotHandle::new(config.build_ballot()?);
    let follower = if follow {
        let from = handle.read(|b| b.events().next_sequence()).await;
        let stream = handle.subscribe().await;
        Some(tokio::spawn(follow_events(stream, handle.downgrade(), from)))
    } else {
        None
    };

    let outcome = handle
        .execute(|ballot| script.run(ballot, print_step))
        .await;

    let snapshot = handle.snapshot().await;
    println!();
    println!("Phase: {}", snapshot.phase);
    match snapshot.winner {
        Some(winner) => {
            let description = handle
                .read(|b| b.winning_proposal_description().map(str::to_string))
                .await
                .unwrap_or_default();
            println!("Winner: #{} {}", winner, description);
        }
        None if snapshot.phase == WorkflowStatus::ArbitrationPending => {
            let tied = handle.read(|b| b.tied_proposal_ids()).await;
            println!("Draw between {:?}, awaiting arbitration", tied);
        }
        None => println!("No winner yet"),
    }

    let records = handle.read(|b| b.events().records().to_vec()).await;

    // Dropping the last handle closes the push channel and ends the follower.
    drop(handle);
    if let Some(follower) = follower {
        let next = follower.await?;
        // Anything the follower could not read back before the ballot closed
        for record in records.iter().filter(|r| r.sequence >= next) {
            print_event(record);
        }
    }

    if let Some(export) = export {
        export_log(&records, Path::new(&export), format)?;
        println!("Exported {} events to {}", records.len(), export);
    }

    outcome?;
    Ok(())
}

fn print_step(report: &StepReport) {
    match &report.result {
        Ok(outcome) => println!(
            "  [{}] {} {}: {}",
            report.step, report.caller, report.action, outcome
        ),
        Err(err) => println!(
            "  [{}] {} {}: {} ({})",
            report.step,
            report.caller,
            report.action,
            err.kind(),
            err
        ),
    }
}

/// Print records from `from` onward and return the first sequence not printed.
async fn follow_events(mut stream: EventStream, ballot: WeakBallotHandle, from: u64) -> u64 {
    let mut next = from;
    while let Some(item) = stream.next().await {
        match item {
            Ok(record) if record.sequence < next => {}
            Ok(record) => {
                print_event(&record);
                next = record.sequence + 1;
            }
            Err(EventStreamError::Lagged(missed)) => {
                tracing::debug!(missed, next, "event follower lagged, reading the log");
                let Some(handle) = ballot.upgrade() else {
                    break;
                };
                let gap = handle.read(|b| b.events_since(next).to_vec()).await;
                drop(handle);
                for record in &gap {
                    print_event(record);
                }
                if let Some(last) = gap.last() {
                    next = last.sequence + 1;
                }
            }
        }
    }
    next
}

fn print_event(record: &EventRecord) {
    match serde_json::to_string(record) {
        Ok(line) => println!("  event {}", line),
        Err(e) => tracing::warn!(error = %e, "failed to encode event"),
    }
}

fn export_log(
    records: &[EventRecord],
    path: &Path,
    format: ExportFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = format.encode(&records)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create export directory: {}", e))?;
    }
    std::fs::write(path, bytes)
        .map_err(|e| format!("Failed to write export '{}': {}", path.display(), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot::ballot::{Ballot, BallotError, BallotPolicy, Identity};
    use tempfile::TempDir;

    const SCRIPT: &str = r#"
[[step]]
caller = "admin"
action = "register_voter"
voter = "alice"

[[step]]
caller = "admin"
action = "advance"

[[step]]
caller = "alice"
action = "submit_proposal"
description = "Alyra"

[[step]]
caller = "admin"
action = "advance"

[[step]]
caller = "admin"
action = "advance"

[[step]]
caller = "alice"
action = "cast_vote"
proposal_id = 0

[[step]]
caller = "admin"
action = "advance"

[[step]]
caller = "admin"
action = "tally"
"#;

    fn setup(temp_dir: &TempDir, script: &str) -> (String, String) {
        let config_path = temp_dir.path().join("config.toml");
        BallotConfig::create_default(&config_path, "admin", "Best school?").unwrap();

        let script_path = temp_dir.path().join("session.toml");
        std::fs::write(&script_path, script).unwrap();

        (
            script_path.to_string_lossy().to_string(),
            config_path.to_string_lossy().to_string(),
        )
    }

    #[tokio::test]
    async fn test_run_script_and_export() {
        let temp_dir = TempDir::new().unwrap();
        let (script, config) = setup(&temp_dir, SCRIPT);
        let export = temp_dir.path().join("out").join("events.json");

        execute(
            script,
            Some(config),
            Some(export.to_string_lossy().to_string()),
            ExportFormat::Json,
            true,
        )
        .await
        .unwrap();

        let bytes = std::fs::read(&export).unwrap();
        let records: Vec<EventRecord> = ExportFormat::Json.decode(&bytes).unwrap();
        assert_eq!(records.len(), 8);
        assert_eq!(records[0].sequence, 0);
    }

    #[tokio::test]
    async fn test_follower_reads_back_lagged_records() {
        let admin = Identity::from("admin");
        let ballot =
            Ballot::with_channel_capacity(admin.clone(), "q", BallotPolicy::default(), 1).unwrap();
        let handle = BallotHandle::new(ballot);
        let stream = handle.subscribe().await;
        let follower = tokio::spawn(follow_events(stream, handle.downgrade(), 0));

        handle
            .execute(|b| {
                for i in 0..10 {
                    b.register_voter(&admin, Identity::new(format!("v{}", i)))?;
                }
                Ok::<_, BallotError>(())
            })
            .await
            .unwrap();
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        drop(handle);
        assert_eq!(follower.await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_run_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.toml");

        let result = execute(
            "session.toml".to_string(),
            Some(missing.to_string_lossy().to_string()),
            None,
            ExportFormat::Cbor,
            false,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_exports_even_when_step_fails() {
        let temp_dir = TempDir::new().unwrap();
        let script = r#"
[[step]]
caller = "admin"
action = "register_voter"
voter = "alice"

[[step]]
caller = "alice"
action = "advance"
"#;
        let (script, config) = setup(&temp_dir, script);
        let export = temp_dir.path().join("events.cbor");

        let result = execute(
            script,
            Some(config),
            Some(export.to_string_lossy().to_string()),
            ExportFormat::Cbor,
            false,
        )
        .await;
        assert!(result.is_err());

        let records: Vec<EventRecord> =
            ExportFormat::Cbor.decode(&std::fs::read(&export).unwrap()).unwrap();
        assert_eq!(records.len(), 1);
    }
}
