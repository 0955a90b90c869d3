//! # CLI Command Implementations

use std::path::{Path, PathBuf};
use urtree::{
    Config, JsonLinesSink, OutputFormat, Overrides, RedbSink, RunOptions, RunSummary, group_records,
    read_records, run,
};
use urtree_core::{NodeStats, TweetId, UrTreeError};

/// Validate output path.
///
/// The parent directory must exist; the file itself may not yet.
fn validate_output_path(path: &Path) -> Result<PathBuf, UrTreeError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        UrTreeError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(UrTreeError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| UrTreeError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// STATS COMMAND
// =============================================================================

/// Compute statistics for every post in `input`.
pub async fn cmd_stats(
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    overrides: &Overrides,
    json_mode: bool,
) -> Result<(), UrTreeError> {
    let config = Config::load_or_default(config_path)?.with_overrides(overrides)?;
    let options = RunOptions {
        workers: config.processing.workers,
        batch_size: config.processing.batch_size,
    };

    let outcome = read_records(input)?;
    let skipped = outcome.skipped;
    let groups = group_records(outcome.records, config.processing.order)?;

    let summary = match (config.output.format, output) {
        (OutputFormat::Jsonl, Some(path)) => {
            let mut sink = JsonLinesSink::create(&validate_output_path(path)?)?;
            run(groups, &mut sink, options).await?
        }
        (OutputFormat::Jsonl, None) => {
            let mut sink = JsonLinesSink::new(std::io::stdout().lock());
            run(groups, &mut sink, options).await?
        }
        (OutputFormat::Redb, Some(path)) => {
            let mut sink = RedbSink::open(validate_output_path(path)?)?;
            run(groups, &mut sink, options).await?
        }
        (OutputFormat::Redb, None) => {
            return Err(UrTreeError::ConfigError(
                "redb output requires --output".to_string(),
            ));
        }
    };

    report_summary(&summary, skipped, output, json_mode);
    Ok(())
}

/// Print run totals on stderr, keeping stdout free for results.
fn report_summary(summary: &RunSummary, skipped: usize, output: Option<&Path>, json_mode: bool) {
    if json_mode {
        let value = serde_json::json!({
            "groups": summary.groups,
            "records": summary.records,
            "singletons": summary.singletons,
            "nodes": summary.nodes,
            "anomalies": summary.anomalies,
            "skipped_lines": skipped,
            "output": output.map(|p| p.to_string_lossy().into_owned()),
        });
        eprintln!("{}", value);
        return;
    }

    eprintln!("urtree stats");
    eprintln!("============");
    eprintln!("Groups:        {}", summary.groups);
    eprintln!("Records:       {}", summary.records);
    eprintln!("Singletons:    {}", summary.singletons);
    eprintln!("Nodes:         {}", summary.nodes);
    eprintln!("Anomalies:     {}", summary.anomalies);
    eprintln!("Skipped lines: {}", skipped);
    if let Some(path) = output {
        eprintln!("Output:        {:?}", path);
    }
}

// =============================================================================
// SHOW COMMAND
// =============================================================================

/// Print the stored statistics of one post.
pub fn cmd_show(database: &Path, tweet: u64, json_mode: bool) -> Result<(), UrTreeError> {
    if !database.is_file() {
        return Err(UrTreeError::IoError(format!(
            "Database '{}' does not exist",
            database.display()
        )));
    }
    let sink = RedbSink::open(database)?;
    let stats = sink
        .get(TweetId(tweet))?
        .ok_or(UrTreeError::NodeNotFound(TweetId(tweet)))?;

    let value =
        serde_json::to_value(&stats).map_err(|e| UrTreeError::SerializationError(e.to_string()))?;
    if json_mode {
        print_json(&value);
        return Ok(());
    }

    if let serde_json::Value::Object(columns) = value {
        for (name, value) in columns {
            println!("{:<24} {}", name, value);
        }
    }
    Ok(())
}

// =============================================================================
// COLUMNS COMMAND
// =============================================================================

/// List the output columns.
pub fn cmd_columns(json_mode: bool) -> Result<(), UrTreeError> {
    if json_mode {
        print_json(&serde_json::json!(NodeStats::COLUMNS.as_slice()));
        return Ok(());
    }
    for column in NodeStats::COLUMNS {
        println!("{}", column);
    }
    Ok(())
}


// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use urtree::Sink;
    use urtree_core::RawRecord;

    fn database_with(dir: &Path, records: &[RawRecord]) -> PathBuf {
        let path = dir.join("stats.redb");
        let mut sink = RedbSink::open(&path).expect("open");
        let stats: Vec<_> = records.iter().map(NodeStats::singleton).collect();
        sink.write_batch(&stats).expect("write");
        path
    }

    #[test]
    fn output_path_keeps_file_name_under_canonical_parent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = validate_output_path(&dir.path().join("out.jsonl")).expect("valid");
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("out.jsonl"));
        assert!(path.parent().is_some_and(Path::is_dir));
    }

    #[test]
    fn output_path_in_missing_directory_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = validate_output_path(&dir.path().join("absent").join("out.jsonl"));
        assert!(matches!(result, Err(UrTreeError::IoError(_))));
    }

    #[test]
    fn show_missing_id_is_node_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = database_with(dir.path(), &[RawRecord::root(7, 1)]);

        assert!(cmd_show(&path, 7, true).is_ok());
        assert!(cmd_show(&path, 7, false).is_ok());
        assert!(matches!(
            cmd_show(&path, 8, false),
            Err(UrTreeError::NodeNotFound(TweetId(8)))
        ));
    }

    #[test]
    fn show_without_database_does_not_create_one() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.redb");
        assert!(matches!(
            cmd_show(&path, 1, false),
            Err(UrTreeError::IoError(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn columns_prints_in_both_modes() {
        assert!(cmd_columns(false).is_ok());
        assert!(cmd_columns(true).is_ok());
    }
}
