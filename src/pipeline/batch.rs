use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::foundation::error::{StepcastError, StepcastResult};
use crate::foundation::threads::build_thread_pool;
use crate::pipeline::orchestrator::{BuildResult, Orchestrator, dry_run_scene};
use crate::scene::model::SceneSpec;

/// File name picked up when scanning a directory.
pub const SCENE_FILE_NAME: &str = "scene.json";

/// Batch options.
#[derive(Clone, Debug, Default)]
pub struct BatchOpts {
    /// Validate only.
    pub dry_run: bool,
    /// Scenes built concurrently. `None` or `Some(1)` builds one at a time.
    pub jobs: Option<usize>,
}

/// Per-scene results of a batch, in input order.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BatchReport {
    /// One result per input file.
    pub results: Vec<BuildResult>,
}

impl BatchReport {
    /// Number of scenes processed.
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Number of successful scenes.
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Number of failed scenes.
    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// True when every scene succeeded (and there was at least one).
    pub fn all_succeeded(&self) -> bool {
        !self.results.is_empty() && self.failed() == 0
    }

    /// Failed results only.
    pub fn failures(&self) -> impl Iterator<Item = &BuildResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

/// `path` itself if it is not a directory, otherwise every `scene.json` below it, sorted.
pub fn find_scene_files(path: &Path) -> StepcastResult<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut out = Vec::new();
    for entry in walkdir::WalkDir::new(path).follow_links(true) {
        let entry = entry.map_err(|e| anyhow::anyhow!("scan '{}': {e}", path.display()))?;
        if entry.file_type().is_file() && entry.file_name() == SCENE_FILE_NAME {
            out.push(entry.into_path());
        }
    }
    out.sort();
    Ok(out)
}

/// Scene id used in results when a file cannot be loaded: the parent directory name for a
/// `scene.json`, otherwise the file stem.
pub fn fallback_scene_id(path: &Path) -> String {
    let from_parent = path.file_name().is_some_and(|n| n == SCENE_FILE_NAME);
    let name = if from_parent {
        path.parent().and_then(Path::file_name)
    } else {
        path.file_stem()
    };
    name.map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "scene".to_string())
}

/// Build (or dry-run, per `opts`) every file independently.
///
/// A scene that fails, including one that does not load, never stops its siblings. Two files
/// declaring the same scene id would share an artifact directory, so every file after the first
/// with a given id fails to load.
pub fn build_batch(
    orchestrator: &Orchestrator,
    paths: &[PathBuf],
    opts: &BatchOpts,
) -> StepcastResult<BatchReport> {
    run_batch(paths, opts, |scene| {
        if opts.dry_run {
            orchestrator.dry_run(scene)
        } else {
            orchestrator.build(scene)
        }
    })
}

/// Validate every file without constructing any port.
pub fn dry_run_batch(paths: &[PathBuf]) -> StepcastResult<BatchReport> {
    let opts = BatchOpts {
        dry_run: true,
        jobs: None,
    };
    run_batch(paths, &opts, dry_run_scene)
}

fn run_batch<F>(paths: &[PathBuf], opts: &BatchOpts, build: F) -> StepcastResult<BatchReport>
where
    F: Fn(&SceneSpec) -> BuildResult + Sync + Send,
{
    let loaded = load_all(paths);

    let run_one = |(path, scene): &(&PathBuf, StepcastResult<SceneSpec>)| -> BuildResult {
        match scene {
            Ok(scene) => build(scene),
            Err(err) => {
                tracing::error!(path = %path.display(), "{err}");
                BuildResult::load_failure(fallback_scene_id(path), err, opts.dry_run)
            }
        }
    };

    let results: Vec<BuildResult> = match opts.jobs {
        Some(0) => return Err(StepcastError::config("batch jobs must be >= 1")),
        Some(jobs) if jobs > 1 => {
            let pool = build_thread_pool(Some(jobs), "batch")?;
            pool.install(|| loaded.par_iter().map(run_one).collect())
        }
        _ => loaded.iter().map(run_one).collect(),
    };

    let report = BatchReport { results };
    tracing::info!(
        total = report.total(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        dry_run = opts.dry_run,
        "batch finished"
    );
    Ok(report)
}

fn load_all(paths: &[PathBuf]) -> Vec<(&PathBuf, StepcastResult<SceneSpec>)> {
    let mut seen: BTreeMap<String, &PathBuf> = BTreeMap::new();
    paths
        .iter()
        .map(|path| {
            let scene = SceneSpec::from_path(path).and_then(|scene| {
                if let Some(first) = seen.get(&scene.id) {
                    return Err(StepcastError::load(
                        "id",
                        format!(
                            "duplicate scene id '{}' (already defined in '{}')",
                            scene.id,
                            first.display()
                        ),
                    ));
                }
                seen.insert(scene.id.clone(), path);
                Ok(scene)
            });
            (path, scene)
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/batch.rs"]
mod tests;
