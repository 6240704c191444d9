//! Best-effort removal of artifact files left behind on disk.

use std::path::Path;
use std::time::{Duration, SystemTime};

use chime_core::artifact::is_artifact_file_name;
use tracing::{debug, info, warn};

/// Result of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    pub failed: usize,
}

/// Delete every `reminder_<owner>.<wav|mp3>` in `dir` older than `max_age`.
///
/// A zero `max_age` removes every matching file regardless of age. Files that
/// cannot be inspected or removed are counted in `failed`; the sweep goes on.
pub async fn sweep_stale_artifacts(dir: &Path, max_age: Duration) -> SweepReport {
    let mut report = SweepReport::default();

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot read artifact directory");
            return report;
        }
    };

    let now = SystemTime::now();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "artifact directory listing failed");
                report.failed += 1;
                break;
            }
        };

        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !is_artifact_file_name(name) {
            continue;
        }

        let path = entry.path();
        if !max_age.is_zero() {
            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot read artifact age");
                    report.failed += 1;
                    continue;
                }
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age <= max_age {
                debug!(path = %path.display(), age_secs = age.as_secs(), "artifact still fresh");
                continue;
            }
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "removed stale artifact");
                report.removed += 1;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove stale artifact");
                report.failed += 1;
            }
        }
    }

    report
}

/// Remove one artifact file. A file that is already gone counts as removed.
pub async fn remove_artifact(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "artifact removed");
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to remove artifact");
            false
        }
    }
}
