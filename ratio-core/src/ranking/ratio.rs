//! Pairwise relative-strength test on a synthetic pair ratio.
//!
//! For two series A and B the per-period ratio `A[i] / B[i]` over the latest
//! `window` periods is treated as an instrument of its own. A is stronger
//! than B when the current ratio (index 0) sits strictly above the ratio's
//! own simple moving average over the same window.

use crate::indicators::sma;

/// Decided outcome of one matchup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    AWins,
    BWins,
}

/// Reasons a pair cannot be judged on the merits.
///
/// The tournament folds every fault into [`PairOutcome::BWins`]; callers that
/// need to tell a real loss from an unusable pair match on this instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioFault {
    /// Window of zero periods.
    EmptyWindow,
    /// One of the series has fewer than `window` prices.
    InsufficientHistory {
        required: usize,
        a_len: usize,
        b_len: usize,
    },
    /// B's price is zero at `period` inside the window.
    ZeroDenominator { period: usize },
}

/// Strict evaluation: distinguishes faults from a genuine B win.
pub fn evaluate_pair(a: &[f64], b: &[f64], window: usize) -> Result<PairOutcome, RatioFault> {
    if window == 0 {
        return Err(RatioFault::EmptyWindow);
    }
    if a.len() < window || b.len() < window {
        return Err(RatioFault::InsufficientHistory {
            required: window,
            a_len: a.len(),
            b_len: b.len(),
        });
    }

    let mut ratios = Vec::with_capacity(window);
    for (period, (&pa, &pb)) in a[..window].iter().zip(&b[..window]).enumerate() {
        if pb == 0.0 {
            return Err(RatioFault::ZeroDenominator { period });
        }
        ratios.push(pa / pb);
    }

    let current = ratios[0];
    let ratio_ma = sma(&ratios, window).ok_or(RatioFault::EmptyWindow)?;

    // NaN compares false, which lands on BWins like every other fault.
    if current > ratio_ma {
        Ok(PairOutcome::AWins)
    } else {
        Ok(PairOutcome::BWins)
    }
}

/// Tournament rule: true iff A beats B.
///
/// Fails closed: a short series or a zero in B's window is a loss for A.
pub fn wins_matchup(a: &[f64], b: &[f64], window: usize) -> bool {
    matches!(evaluate_pair(a, b, window), Ok(PairOutcome::AWins))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(start: f64, step: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| start + step * i as f64).collect()
    }

    #[test]
    fn rising_ratio_wins() {
        // A has rallied recently against a flat B: ratio now above its MA.
        let a = linear(200.0, -5.0, 20);
        let b = vec![100.0; 20];
        assert!(wins_matchup(&a, &b, 20));
        assert!(!wins_matchup(&b, &a, 20));
    }

    #[test]
    fn falling_ratio_loses() {
        let a = linear(100.0, 5.0, 20);
        let b = vec![100.0; 20];
        assert_eq!(evaluate_pair(&a, &b, 20), Ok(PairOutcome::BWins));
    }

    #[test]
    fn zero_denominator_fails_closed() {
        let a = linear(500.0, -1.0, 20);
        let mut b = vec![10.0; 20];
        b[5] = 0.0;
        assert!(!wins_matchup(&a, &b, 20));
        assert_eq!(
            evaluate_pair(&a, &b, 20),
            Err(RatioFault::ZeroDenominator { period: 5 })
        );
    }

    #[test]
    fn zero_outside_window_is_ignored() {
        let a = linear(200.0, -5.0, 25);
        let mut b = vec![100.0; 25];
        b[22] = 0.0;
        assert!(wins_matchup(&a, &b, 20));
    }

    #[test]
    fn short_series_is_a_loss_for_a() {
        let a = linear(200.0, -5.0, 19);
        let b = vec![100.0; 20];
        assert!(!wins_matchup(&a, &b, 20));
        assert_eq!(
            evaluate_pair(&a, &b, 20),
            Err(RatioFault::InsufficientHistory {
                required: 20,
                a_len: 19,
                b_len: 20
            })
        );
    }

    #[test]
    fn empty_window_is_a_fault() {
        assert_eq!(evaluate_pair(&[1.0], &[1.0], 0), Err(RatioFault::EmptyWindow));
    }

    #[test]
    fn flat_ratio_is_not_a_win() {
        // Proportional series give a constant ratio: current == MA, so A does not win.
        let a = vec![2.0; 20];
        let b = vec![1.0; 20];
        assert!(!wins_matchup(&a, &b, 20));
        assert!(!wins_matchup(&b, &a, 20));
    }

    #[test]
    fn nan_price_is_a_loss_for_a() {
        let mut a = linear(200.0, -5.0, 20);
        a[0] = f64::NAN;
        let b = vec![100.0; 20];
        assert!(!wins_matchup(&a, &b, 20));
    }
}
