use anyhow::Result;
use tracing::{info, warn};

use crate::cli::{StatusArgs, default_index_path};
use crate::model::{IngestRunManifest, ScheduleIndex};
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let index_path = args
        .index_path
        .clone()
        .unwrap_or_else(|| default_index_path(&args.cache_root));

    info!(cache_root = %args.cache_root.display(), "status requested");

    if index_path.exists() {
        let index: ScheduleIndex = read_json(&index_path)?;
        let validity = index
            .validity_range
            .map(|range| format!("{}..{}", range.from, range.to))
            .unwrap_or_default();

        info!(
            path = %index_path.display(),
            lessons = index.lessons.len(),
            groups = index.groups.len(),
            instructors = index.instructors.len(),
            validity = %validity,
            "loaded schedule index"
        );
    } else {
        warn!(path = %index_path.display(), "schedule index missing");
    }

    match latest_manifest(&manifest_dir)? {
        Some(manifest) => info!(
            run_id = %manifest.run_id,
            status = %manifest.status,
            variant = %manifest.format_variant,
            updated_at = %manifest.updated_at,
            source_sha256 = %manifest.source_sha256,
            diagnostics = manifest.counts.diagnostics_total,
            "latest ingest run"
        ),
        None => warn!(path = %manifest_dir.display(), "no ingest run manifests found"),
    }

    Ok(())
}

/// Manifest names embed a compact UTC timestamp, so the lexically last one is
/// the most recent run.
fn latest_manifest(manifest_dir: &std::path::Path) -> Result<Option<IngestRunManifest>> {
    if !manifest_dir.is_dir() {
        return Ok(None);
    }

    let mut latest = None;
    for entry in std::fs::read_dir(manifest_dir)? {
        let path = entry?.path();
        let is_run_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("ingest_run_") && name.ends_with(".json"));
        if is_run_manifest && latest.as_ref().is_none_or(|current| &path > current) {
            latest = Some(path);
        }
    }

    latest.map(|path| read_json(&path)).transpose()
}
