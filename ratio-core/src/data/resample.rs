//! Daily → weekly close sampling.

/// Every 7th daily close, anchored at the most recent day.
///
/// Input is oldest-first (as the crypto history endpoints return it); output
/// is most-recent-first, ready to become a [`PriceSeries`](crate::domain::PriceSeries).
pub fn weekly_closes(daily_oldest_first: &[f64]) -> Vec<f64> {
    daily_oldest_first.iter().rev().step_by(7).copied().collect()
}

/// Number of daily points to request for `weeks` weekly closes, with a buffer
/// for missing days.
pub fn days_for_weeks(weeks: usize) -> usize {
    weeks * 7 + 30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_at_latest_day() {
        let daily: Vec<f64> = (1..=15).map(|d| d as f64).collect();
        assert_eq!(weekly_closes(&daily), vec![15.0, 8.0, 1.0]);
    }

    #[test]
    fn partial_week_still_sampled() {
        let daily = vec![1.0, 2.0, 3.0];
        assert_eq!(weekly_closes(&daily), vec![3.0]);
        assert!(weekly_closes(&[]).is_empty());
    }

    #[test]
    fn buffer_for_weeks() {
        assert_eq!(days_for_weeks(20), 170);
    }
}
