use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::{IngestArgs, default_index_path};
use crate::engine::{FormatConfig, TimetableParser};
use crate::grid;
use crate::model::{IngestCounts, IngestPaths, IngestRunManifest};
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    let index_path = args
        .index_path
        .clone()
        .unwrap_or_else(|| default_index_path(&cache_root));
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "ingest_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    info!(
        input = %args.input.display(),
        variant = args.variant.as_str(),
        run_id = %run_id,
        "starting timetable ingest"
    );

    let config = resolve_format_config(&args)?;
    let delimiter = delimiter_byte(args.delimiter)?;
    let loaded = grid::load_grid(&args.input, delimiter)?;
    info!(
        rows = loaded.grid.len(),
        sha256 = %loaded.sha256,
        "loaded timetable grid"
    );

    let parser = TimetableParser::new(config).context("failed to build timetable parser")?;
    let ingestion = parser
        .ingest(&loaded.grid)
        .with_context(|| format!("failed to ingest {}", args.input.display()))?;
    info!(
        header_row = ingestion.header_row,
        group_columns = ingestion.header.len(),
        extended_periods = parser.config().extended_period_bucket,
        duplicates_merged = ingestion.stats.duplicates_merged,
        stopped_at_footer = ?ingestion.stats.stopped_at_footer,
        "parsed timetable grid"
    );

    write_json_pretty(&index_path, &ingestion.index)?;
    info!(path = %index_path.display(), "wrote schedule index");

    let warnings = ingestion
        .diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<String>>();
    if !warnings.is_empty() {
        warn!(count = warnings.len(), "ingest finished with diagnostics");
    }

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_ingest_command(&args),
        format_variant: args.variant.as_str().to_string(),
        source_sha256: loaded.sha256,
        paths: IngestPaths {
            cache_root: cache_root.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            input_path: args.input.display().to_string(),
            index_path: index_path.display().to_string(),
        },
        counts: IngestCounts {
            row_count: loaded.grid.len(),
            header_row: ingestion.header_row,
            rows_scanned: ingestion.stats.rows_scanned,
            rows_skipped: ingestion.stats.rows_skipped,
            cells_parsed: ingestion.stats.cells_parsed,
            lessons_total: ingestion.index.lessons.len(),
            groups_total: ingestion.index.groups.len(),
            instructors_total: ingestion.index.instructors.len(),
            diagnostics_total: ingestion.diagnostics.len(),
        },
        validity_range: ingestion.index.validity_range,
        warnings,
    };

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote ingest run manifest");
    info!(
        lessons = manifest.counts.lessons_total,
        groups = manifest.counts.groups_total,
        instructors = manifest.counts.instructors_total,
        "ingest completed"
    );

    Ok(())
}

fn resolve_format_config(args: &IngestArgs) -> Result<FormatConfig> {
    let preset = args.variant.preset();
    match &args.format_config {
        Some(path) => {
            let config = preset.with_overrides_from(path)?;
            info!(path = %path.display(), "applied format config overrides");
            Ok(config)
        }
        None => Ok(preset),
    }
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character, got {delimiter:?}");
    }
    Ok(delimiter as u8)
}

fn render_ingest_command(args: &IngestArgs) -> String {
    let mut parts = vec![
        "timetable ingest".to_string(),
        format!("--input {}", args.input.display()),
        format!("--cache-root {}", args.cache_root.display()),
        format!("--delimiter '{}'", args.delimiter),
        format!("--variant {}", args.variant.as_str()),
    ];

    let optional_paths: [(&str, &Option<PathBuf>); 3] = [
        ("--index-path", &args.index_path),
        ("--manifest-path", &args.manifest_path),
        ("--format-config", &args.format_config),
    ];
    for (flag, value) in optional_paths {
        if let Some(path) = value {
            parts.push(format!("{flag} {}", path.display()));
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::cli::FormatVariant;

    fn args() -> IngestArgs {
        IngestArgs {
            input: PathBuf::from("schedule.csv"),
            cache_root: PathBuf::from(".cache/timetable"),
            index_path: None,
            manifest_path: None,
            delimiter: ';',
            variant: FormatVariant::RoomColumn,
            format_config: Some(PathBuf::from("format.json")),
        }
    }

    #[test]
    fn render_ingest_command_lists_set_options() {
        let command = render_ingest_command(&args());

        assert!(command.starts_with("timetable ingest --input schedule.csv"));
        assert!(command.contains("--variant room-column"));
        assert!(command.contains("--format-config format.json"));
        assert!(!command.contains("--index-path"));
    }

    #[test]
    fn delimiter_byte_rejects_non_ascii() {
        assert_eq!(delimiter_byte(';').expect("ascii delimiter"), b';');
        assert!(delimiter_byte('§').is_err());
    }
}
