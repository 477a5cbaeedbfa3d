/// Mean of per-core usage percentages; `0.0` when no cores are reported.
pub fn average_usage(per_core: &[f32]) -> f32 {
    if per_core.is_empty() {
        return 0.0;
    }
    per_core.iter().sum::<f32>() / per_core.len() as f32
}
