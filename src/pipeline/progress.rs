// src/pipeline/progress.rs

/// Fraction of categories completed. With nothing to wait for the run is already done.
pub fn progress(completions: usize, total: usize) -> f32 {
    if total == 0 {
        return 1.0;
    }
    completions as f32 / total as f32
}
