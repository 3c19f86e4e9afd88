use ballot::ballot::EventRecord;
use ballot::serialization::ExportFormat;
use std::path::Path;

/// Print an exported notification log
///
/// Decodes the file and prints one JSON line per record with
/// `sequence >= from`.
pub async fn execute(
    input: String,
    format: ExportFormat,
    from: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    for line in render(Path::new(&input), format, from)? {
        println!("{}", line);
    }
    Ok(())
}

fn render(
    path: &Path,
    format: ExportFormat,
    from: u64,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read export '{}': {}", path.display(), e))?;
    let records: Vec<EventRecord> = format.decode(&bytes)?;

    let mut lines = Vec::new();
    for record in records.iter().filter(|r| r.sequence >= from) {
        lines.push(serde_json::to_string(record)?);
    }
    Ok(lines)
}
