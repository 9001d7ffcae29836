// Copyright 2025 Fernando Borretti
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

//! Deterministic randomness derived from string seeds.
//!
//! Sessions store only their seed. Every ordering and subset is recomputed
//! from it, so these functions must produce the same output everywhere,
//! bit for bit.

const FNV_OFFSET_BASIS: u32 = 2166136261;
const FNV_PRIME: u32 = 16777619;

/// Hash a string into a 32-bit seed with FNV-1a.
pub fn seed_from_string(s: &str) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in s.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// A minimal, completely insecure PRNG (Mulberry32).
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn from_seed(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn from_string(seed: &str) -> Self {
        Self::from_seed(seed_from_string(seed))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Generate a float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / 4294967296.0
    }
}

/// Fisher-Yates shuffle, walking from the last element to the first.
pub fn shuffle<T: Clone>(items: &[T], seed: &str) -> Vec<T> {
    let mut rng = Mulberry32::from_string(seed);
    let mut v: Vec<T> = items.to_vec();
    for i in (1..v.len()).rev() {
        let j = (rng.next_f64() * (i + 1) as f64).floor() as usize;
        v.swap(i, j);
    }
    v
}

/// Shuffle, then keep the first `count` elements.
pub fn pick_subset<T: Clone>(items: &[T], count: usize, seed: &str) -> Vec<T> {
    let mut v = shuffle(items, seed);
    v.truncate(count);
    v
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn test_seed_from_string() {
        assert_eq!(seed_from_string(""), 2166136261);
        assert_eq!(seed_from_string("a"), 3826002220);
        assert_eq!(seed_from_string("hello"), 1335831723);
    }

    #[test]
    fn test_mulberry32_known_values() {
        let mut rng = Mulberry32::from_seed(0);
        assert_eq!(rng.next_f64(), 0.26642920868471265);
        assert_eq!(rng.next_f64(), 0.0003297457005828619);

        let mut rng = Mulberry32::from_string("hello");
        assert_eq!(rng.next_f64(), 0.6311965801287442);
        assert_eq!(rng.next_f64(), 0.7983490515034646);
        assert_eq!(rng.next_f64(), 0.30862852558493614);
    }

    #[test]
    fn test_next_f64_range() {
        let mut rng = Mulberry32::from_string("range");
        for _ in 0..10_000 {
            let x = rng.next_f64();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_shuffle_known_order() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(shuffle(&items, "hello"), vec![1, 4, 9, 5, 8, 0, 3, 2, 7, 6]);
        let letters = ["a", "b", "c", "d", "e"];
        assert_eq!(shuffle(&letters, "seed"), vec!["c", "b", "d", "a", "e"]);
    }

    #[test]
    fn test_shuffle_is_deterministic() {
        let items: Vec<String> = (0..50).map(|i| format!("q{i}")).collect();
        assert_eq!(shuffle(&items, "timed::1"), shuffle(&items, "timed::1"));
    }

    #[test]
    fn test_shuffle_is_permutation() {
        for n in [0usize, 1, 2, 3, 17, 100] {
            let items: Vec<usize> = (0..n).collect();
            for seed in ["", "a", "review::all::all::1700000000000"] {
                let shuffled = shuffle(&items, seed);
                assert_eq!(shuffled.len(), n);
                let set: BTreeSet<usize> = shuffled.into_iter().collect();
                let expected: BTreeSet<usize> = items.iter().copied().collect();
                assert_eq!(set, expected);
            }
        }
    }

    #[test]
    fn test_shuffle_does_not_mutate_input() {
        let items = vec![1, 2, 3, 4];
        let _ = shuffle(&items, "x");
        assert_eq!(items, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_pick_subset() {
        let items = ["a", "b", "c", "d", "e", "f"];
        assert_eq!(pick_subset(&items, 3, "exam::1"), vec!["b", "c", "f"]);
        // The subset is a prefix of the shuffle under the same seed.
        assert_eq!(
            pick_subset(&items, 3, "seed"),
            shuffle(&items, "seed")[..3].to_vec()
        );
    }

    #[test]
    fn test_pick_subset_count_exceeds_length() {
        let items = ["a", "b"];
        let subset = pick_subset(&items, 10, "seed");
        assert_eq!(subset.len(), 2);
    }
}
