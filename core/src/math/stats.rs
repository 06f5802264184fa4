pub struct StatsHelper;

impl StatsHelper {
    /// Average absolute change between consecutive samples.
    pub fn mean_abs_change(samples: &[f64]) -> f64 {
        if samples.len() < 2 {
            return 0.0;
        }
        let total: f64 = samples.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
        total / (samples.len() - 1) as f64
    }

    /// Share of `count` within `total`, zero for an empty total.
    pub fn fraction(count: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_abs_change_ignores_direction() {
        assert_eq!(StatsHelper::mean_abs_change(&[4.0]), 0.0);
        assert_eq!(StatsHelper::mean_abs_change(&[0.0, 2.0, 0.0]), 2.0);
    }

    #[test]
    fn fraction_handles_zero_total() {
        assert_eq!(StatsHelper::fraction(3, 0), 0.0);
        assert_eq!(StatsHelper::fraction(1, 4), 0.25);
    }
}
