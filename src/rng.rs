/// Source of uniform floats in `[0, 1)` used for the bounded random trials of
/// the decision pass. Implementations must be deterministic for a given seed.
pub trait RandomSource {
    fn next_f32(&mut self) -> f32;

    fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f32;
        (min + (self.next_f32() * span).floor() as i32).min(max)
    }

    fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        (self.next_f32() * len as f32).floor().min((len - 1) as f32) as usize
    }
}

#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn from_entropy() -> Self {
        Self::new(rand::random::<u32>())
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl RandomSource for Rng {
    fn next_f32(&mut self) -> f32 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        ((out as f64 / 4_294_967_296.0) as f32).min(0.999_999_9)
    }
}

/// Replays a fixed list of values, cycling when exhausted.
#[derive(Clone, Debug)]
pub struct SequenceRng {
    values: Vec<f32>,
    cursor: usize,
}

impl SequenceRng {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, cursor: 0 }
    }

    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for SequenceRng {
    fn next_f32(&mut self) -> f32 {
        if self.values.is_empty() {
            self.cursor += 1;
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value.clamp(0.0, 0.999_999_9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_produces_same_sequence() {
        let mut a = Rng::new(424_242);
        let mut b = Rng::new(424_242);
        for _ in 0..64 {
            assert_eq!(a.next_f32().to_bits(), b.next_f32().to_bits());
        }
    }

    #[test]
    fn int_stays_inside_inclusive_bounds() {
        let mut rng = Rng::new(7);
        let mut seen = [false; 2];
        for _ in 0..500 {
            let value = rng.int(2, 3);
            assert!((2..=3).contains(&value));
            seen[(value - 2) as usize] = true;
        }
        assert!(seen[0] && seen[1]);
    }

    #[test]
    fn pick_index_never_overflows_len() {
        let mut rng = Rng::new(99);
        for _ in 0..500 {
            assert!(rng.pick_index(6) < 6);
        }
        assert_eq!(rng.pick_index(0), 0);
    }

    #[test]
    fn sequence_rng_maps_values_onto_choices() {
        let mut rng = SequenceRng::new(vec![0.0, 0.99, 0.5]);
        assert_eq!(rng.pick_index(6), 0);
        assert_eq!(rng.int(2, 3), 3);
        assert_eq!(rng.pick_index(6), 3);
        assert_eq!(rng.pick_index(6), 0);
        assert_eq!(rng.draws(), 4);
    }
}
