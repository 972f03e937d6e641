// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Probabilistic sampling so that only a fraction of cycles pay for timing.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Decides, per measurement cycle, whether the cycle is recorded.
#[derive(Debug, Clone)]
pub struct SamplingGate {
    rate: f64,
    rng: StdRng,
}

impl SamplingGate {
    /// Creates a gate that admits cycles with probability `rate`, clamped to `[0, 1]`.
    ///
    /// A seed makes the admitted sequence reproducible.
    pub fn new(rate: f64, seed: Option<u64>) -> Self {
        let rate = if rate.is_nan() { 1.0 } else { rate.clamp(0.0, 1.0) };
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rate, rng }
    }

    /// Returns the admission probability.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Returns `true` if this cycle should be measured.
    pub fn admit(&mut self) -> bool {
        if self.rate >= 1.0 {
            true
        } else if self.rate <= 0.0 {
            false
        } else {
            self.rng.gen_bool(self.rate)
        }
    }
}

impl Default for SamplingGate {
    fn default() -> Self {
        Self::new(1.0, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extreme_rates_are_deterministic() {
        let mut always = SamplingGate::new(1.0, None);
        let mut never = SamplingGate::new(0.0, None);
        for _ in 0..100 {
            assert!(always.admit());
            assert!(!never.admit());
        }
    }

    #[test]
    fn test_out_of_range_rates_are_clamped() {
        assert_eq!(SamplingGate::new(4.0, None).rate(), 1.0);
        assert_eq!(SamplingGate::new(-1.0, None).rate(), 0.0);
        assert_eq!(SamplingGate::new(f64::NAN, None).rate(), 1.0);
    }

    #[test]
    fn test_partial_rate_admits_a_fraction() {
        let mut gate = SamplingGate::new(0.25, Some(7));
        let admitted = (0..10_000).filter(|_| gate.admit()).count();
        assert!((2000..3000).contains(&admitted), "admitted {admitted}");
    }

    #[test]
    fn test_seed_is_reproducible() {
        let mut a = SamplingGate::new(0.5, Some(42));
        let mut b = SamplingGate::new(0.5, Some(42));
        let seq_a: Vec<bool> = (0..64).map(|_| a.admit()).collect();
        let seq_b: Vec<bool> = (0..64).map(|_| b.admit()).collect();
        assert_eq!(seq_a, seq_b);
    }
}
