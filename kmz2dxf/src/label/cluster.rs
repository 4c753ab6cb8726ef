//! Découpage en séries le long d'un câble

use std::ops::Range;

/// Partitionne des abscisses triées en séries contiguës
///
/// Une nouvelle série commence dès que l'écart avec la valeur précédente
/// dépasse strictement `max_gap`. Un seul passage, déterministe.
pub fn partition_runs(sorted: &[f64], max_gap: f64) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    if sorted.is_empty() {
        return runs;
    }

    let mut start = 0;
    for i in 1..sorted.len() {
        if sorted[i] - sorted[i - 1] > max_gap {
            runs.push(start..i);
            start = i;
        }
    }
    runs.push(start..sorted.len());
    runs
}

/// Index de la médiane basse
pub fn lower_median_index(len: usize) -> usize {
    len.saturating_sub(1) / 2
}
