//! Per-stage wall-clock timing, appended to a tab-separated file.

use crate::SplaceError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const HEADERS: [&str; 5] = ["Date", "Input_Directory", "File_Count", "Step", "Duration_Seconds"];

#[derive(Default)]
struct Timings {
    started: HashMap<String, Instant>,
    /// Insertion-ordered accumulated durations
    finished: Vec<(String, Duration)>,
}

/// Records stage durations when enabled. All operations are no-ops when
/// disabled.
pub struct Benchmark {
    output_path: PathBuf,
    enabled: bool,
    timings: Mutex<Timings>,
}

impl Benchmark {
    pub fn new(output_path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            output_path: output_path.into(),
            enabled,
            timings: Mutex::new(Timings::default()),
        }
    }

    pub fn disabled() -> Self {
        Self::new("benchmark.tsv", false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn start(&self, step: &str) {
        if !self.enabled {
            return;
        }
        self.timings.lock().started.insert(step.to_string(), Instant::now());
        info!("Benchmark started for: {}", step);
    }

    /// Stop a running timer. Repeated runs of one step accumulate.
    pub fn stop(&self, step: &str) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        let mut timings = self.timings.lock();
        let Some(started) = timings.started.remove(step) else {
            warn!("Benchmark stop called for {} without start", step);
            return None;
        };

        let elapsed = started.elapsed();
        match timings.finished.iter_mut().find(|(name, _)| name == step) {
            Some((_, total)) => *total += elapsed,
            None => timings.finished.push((step.to_string(), elapsed)),
        }
        info!("Benchmark finished for: {} ({:.2}s)", step, elapsed.as_secs_f64());
        Some(elapsed)
    }

    /// Recorded steps in the order they first finished
    pub fn durations(&self) -> Vec<(String, Duration)> {
        self.timings.lock().finished.clone()
    }

    /// Append one row per recorded step. The header is written only when the
    /// file does not exist yet.
    pub fn save(&self, input_dir: &Path, file_count: usize) -> Result<(), SplaceError> {
        if !self.enabled {
            return Ok(());
        }

        let write_header = !self.output_path.exists();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output_path)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(file);

        let csv_err =
            |e: csv::Error| SplaceError::Other(format!("Failed to write benchmark: {}", e));
        if write_header {
            writer.write_record(HEADERS).map_err(csv_err)?;
        }

        let date = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let input_name = input_dir_name(input_dir);
        let count = file_count.to_string();
        for (step, duration) in self.durations() {
            let seconds = format!("{:.4}", duration.as_secs_f64());
            writer
                .write_record([
                    date.as_str(),
                    input_name.as_str(),
                    count.as_str(),
                    step.as_str(),
                    seconds.as_str(),
                ])
                .map_err(csv_err)?;
        }
        writer.flush()?;

        info!("Benchmark results saved to {}", self.output_path.display());
        Ok(())
    }
}

fn input_dir_name(input_dir: &Path) -> String {
    let absolute = std::path::absolute(input_dir).unwrap_or_else(|_| input_dir.to_path_buf());
    absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| absolute.display().to_string())
}
