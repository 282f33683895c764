//! Character-proportional time allocation with display-duration clamping.

/// How a segment's time budget was split between its chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// Chunk end offsets relative to the segment start, strictly increasing.
    /// The last one always equals the budget.
    pub boundaries: Vec<u64>,
    /// The budget could not give every chunk the minimum display time, so
    /// the unclamped proportional split was kept.
    pub too_short: bool,
    /// Every chunk hit the maximum display time and the last chunk was
    /// stretched to the segment end.
    pub stretched: bool,
}

impl Allocation {
    /// Duration of chunk `i`.
    pub fn duration(&self, i: usize) -> u64 {
        let start = if i == 0 { 0 } else { self.boundaries[i - 1] };
        self.boundaries[i] - start
    }
}

/// Durations `clamp(scale * weight, min, max)` for a given scale.
fn clamped(weights: &[f64], scale: f64, min: f64, max: f64) -> Vec<f64> {
    weights.iter().map(|w| (scale * w).clamp(min, max)).collect()
}

/// Split `budget` ms between chunks in proportion to their character weights.
///
/// Each chunk is clamped to `[min_ms, max_ms]`; unclamped chunks share the
/// rest of the budget proportionally to their weight. This is the fixed point
/// of repeatedly clamping and redistributing the shortfall, found by bisecting
/// on the common scale factor.
///
/// `weights` must be non-empty with no more entries than `budget` has
/// milliseconds.
pub fn allocate(budget: u64, weights: &[usize], min_ms: u64, max_ms: u64) -> Allocation {
    let n = weights.len();
    debug_assert!(n > 0);

    let weights: Vec<f64> = weights.iter().map(|&w| w.max(1) as f64).collect();
    let total_weight: f64 = weights.iter().sum();
    let budget_f = budget as f64;
    let (min, max) = (min_ms as f64, max_ms.max(min_ms) as f64);

    let mut too_short = false;
    let mut stretched = false;

    let durations = if n as f64 * min > budget_f {
        too_short = true;
        weights.iter().map(|w| budget_f * w / total_weight).collect()
    } else if n as f64 * max < budget_f {
        stretched = true;
        let mut durations = vec![max; n];
        durations[n - 1] = budget_f - max * (n - 1) as f64;
        durations
    } else {
        // sum(clamped(scale)) is non-decreasing in scale; bisect for the budget.
        let mut lo = 0.0;
        let mut hi = max * n as f64 / weights.iter().cloned().fold(f64::MAX, f64::min);
        for _ in 0..100 {
            let mid = (lo + hi) / 2.0;
            let sum: f64 = clamped(&weights, mid, min, max).iter().sum();
            if sum < budget_f {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        clamped(&weights, hi, min, max)
    };

    Allocation {
        boundaries: to_boundaries(&durations, budget),
        too_short,
        stretched,
    }
}

/// Round cumulative durations to whole milliseconds, keeping every chunk at
/// least 1ms long and pinning the final boundary to the budget.
fn to_boundaries(durations: &[f64], budget: u64) -> Vec<u64> {
    let n = durations.len() as u64;
    let mut boundaries = Vec::with_capacity(durations.len());
    let mut cumulative = 0.0;
    let mut prev = 0u64;

    for (i, d) in durations.iter().enumerate() {
        let i = i as u64;
        cumulative += d;
        let boundary = if i == n - 1 {
            budget
        } else {
            let remaining_chunks = n - 1 - i;
            (cumulative.round() as u64)
                .max(prev + 1)
                .min(budget.saturating_sub(remaining_chunks))
        };
        boundaries.push(boundary);
        prev = boundary;
    }
    boundaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn durations(a: &Allocation) -> Vec<u64> {
        (0..a.boundaries.len()).map(|i| a.duration(i)).collect()
    }

    #[test]
    fn test_single_chunk_gets_whole_budget() {
        let a = allocate(4000, &[26], 800, 7000);
        assert_eq!(a.boundaries, vec![4000]);
        assert!(!a.too_short && !a.stretched);
    }

    #[test]
    fn test_proportional_split() {
        let a = allocate(10_000, &[60, 40], 800, 7000);
        assert_eq!(durations(&a), vec![6000, 4000]);
    }

    #[test]
    fn test_min_clamp_redistributes() {
        // 2% share would be 200ms; it gets 800 and the others shrink.
        let a = allocate(10_000, &[49, 49, 2], 800, 7000);
        let d = durations(&a);
        assert_eq!(d[2], 800);
        assert_eq!(d[0], d[1]);
        assert_eq!(d.iter().sum::<u64>(), 10_000);
    }

    #[test]
    fn test_max_clamp_redistributes() {
        let a = allocate(12_000, &[90, 5, 5], 800, 7000);
        let d = durations(&a);
        assert_eq!(d[0], 7000);
        assert_eq!(d[1], 2500);
        assert_eq!(d[2], 2500);
    }

    #[test]
    fn test_too_short_keeps_proportional() {
        let a = allocate(1000, &[10, 30], 800, 7000);
        assert!(a.too_short);
        assert_eq!(durations(&a), vec![250, 750]);
    }

    #[test]
    fn test_all_at_max_stretches_last() {
        let a = allocate(20_000, &[10, 10], 800, 7000);
        assert!(a.stretched);
        assert_eq!(durations(&a), vec![7000, 13_000]);
    }

    #[test]
    fn test_boundaries_strictly_increase() {
        let a = allocate(3, &[1000, 1, 1], 800, 7000);
        assert_eq!(a.boundaries, vec![1, 2, 3]);
    }
}
