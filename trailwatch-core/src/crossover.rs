//! Crossover detection between two series.
//!
//! A crosses over B at t when A was at or below B at t-1 and is strictly
//! above B at t. The tracker keeps the previous pair explicitly.

use serde::{Deserialize, Serialize};

/// `a_prev <= b_prev && a > b`.
pub fn crossed_over(a_prev: f64, b_prev: f64, a: f64, b: f64) -> bool {
    a_prev <= b_prev && a > b
}

/// Crossovers detected on one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cross {
    /// A crossed over B.
    pub up: bool,
    /// B crossed over A.
    pub down: bool,
}

/// Retains the last `(a, b)` pair so each tick can be compared against it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossTracker {
    previous: Option<(f64, f64)>,
}

impl CrossTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the previous pair if none has been recorded yet.
    pub fn seed(&mut self, a: f64, b: f64) {
        if self.previous.is_none() {
            self.previous = Some((a, b));
        }
    }

    /// Compare `(a, b)` against the retained pair, then retain `(a, b)`.
    pub fn update(&mut self, a: f64, b: f64) -> Cross {
        let cross = match self.previous {
            Some((a_prev, b_prev)) => Cross {
                up: crossed_over(a_prev, b_prev, a, b),
                down: crossed_over(b_prev, a_prev, b, a),
            },
            None => Cross::default(),
        };
        self.previous = Some((a, b));
        cross
    }

    pub fn previous(&self) -> Option<(f64, f64)> {
        self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_requires_prior_at_or_below() {
        assert!(crossed_over(1.0, 2.0, 3.0, 2.0));
        assert!(crossed_over(2.0, 2.0, 3.0, 2.0));
        // Already above on the previous tick: no cross
        assert!(!crossed_over(3.0, 2.0, 4.0, 2.0));
        // Touching is not crossing
        assert!(!crossed_over(1.0, 2.0, 2.0, 2.0));
    }

    #[test]
    fn nan_never_crosses() {
        assert!(!crossed_over(f64::NAN, 2.0, 3.0, 2.0));
        assert!(!crossed_over(1.0, 2.0, f64::NAN, 2.0));
    }

    #[test]
    fn tracker_first_update_has_no_history() {
        let mut t = CrossTracker::new();
        assert_eq!(t.update(5.0, 1.0), Cross::default());
        assert_eq!(t.previous(), Some((5.0, 1.0)));
    }

    #[test]
    fn tracker_detects_both_directions() {
        let mut t = CrossTracker::new();
        t.update(1.0, 2.0);
        assert_eq!(t.update(3.0, 2.0), Cross { up: true, down: false });
        assert_eq!(t.update(4.0, 2.0), Cross::default());
        assert_eq!(t.update(1.0, 2.0), Cross { up: false, down: true });
    }

    #[test]
    fn seed_does_not_overwrite() {
        let mut t = CrossTracker::new();
        t.seed(1.0, 1.0);
        t.seed(9.0, 0.0);
        assert_eq!(t.previous(), Some((1.0, 1.0)));
        assert!(t.update(2.0, 1.0).up);
    }
}
