//! Random draws used by composition
//!
//! Every draw goes through a caller-supplied [`Rng`] so that a station
//! seeded with a fixed value replays the same programme.

use rand::Rng;

/// True with probability `p`
pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.gen::<f64>() < p
}

/// Uniform pick from a slice
pub fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    Some(&items[rng.gen_range(0..items.len())])
}

/// Weighted pick over `(value, weight)` pairs
///
/// Falls back to the first entry if the weights sum to zero.
pub fn weighted_pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [(T, u32)]) -> Option<&'a T> {
    let total: u32 = items.iter().map(|(_, w)| *w).sum();
    if total == 0 {
        return items.first().map(|(v, _)| v);
    }
    let mut r = rng.gen_range(0..total);
    for (value, weight) in items {
        if r < *weight {
            return Some(value);
        }
        r -= weight;
    }
    items.first().map(|(v, _)| v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    #[test]
    fn test_chance_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!((0..100).all(|_| chance(&mut rng, 1.0)));
        assert!((0..100).all(|_| !chance(&mut rng, 0.0)));
    }

    #[test]
    fn test_pick_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let empty: [u8; 0] = [];
        assert!(pick(&mut rng, &empty).is_none());
        assert_eq!(pick(&mut rng, &[7]), Some(&7));
    }

    #[test]
    fn test_weighted_pick_skips_zero_weights() {
        let mut rng = StdRng::seed_from_u64(3);
        let items = [("never", 0), ("always", 5)];
        for _ in 0..50 {
            assert_eq!(weighted_pick(&mut rng, &items), Some(&"always"));
        }
    }

    #[test]
    fn test_weighted_pick_distribution() {
        let mut rng = StdRng::seed_from_u64(42);
        let items = [("a", 3), ("b", 1)];
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for _ in 0..4000 {
            *counts.entry(*weighted_pick(&mut rng, &items).unwrap()).or_default() += 1;
        }
        let a = counts["a"] as f64 / 4000.0;
        assert!((a - 0.75).abs() < 0.05, "a share was {}", a);
    }

    #[test]
    fn test_weighted_pick_all_zero_falls_back_to_first() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(weighted_pick(&mut rng, &[("x", 0), ("y", 0)]), Some(&"x"));
        let empty: [(&str, u32); 0] = [];
        assert_eq!(weighted_pick(&mut rng, &empty), None);
    }
}
