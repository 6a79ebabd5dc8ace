//! Random train/test split over generated examples.

use rand::Rng;
use rand::seq::SliceRandom;

/// Shuffle `examples` and split them into `(train, test)`.
///
/// The first `floor(train_fraction * len)` shuffled examples go to train.
/// `train_fraction` is clamped to `[0, 1]`.
pub fn train_test_split<T, R: Rng + ?Sized>(
    mut examples: Vec<T>,
    train_fraction: f32,
    rng: &mut R,
) -> (Vec<T>, Vec<T>) {
    examples.shuffle(rng);

    let fraction = train_fraction.clamp(0.0, 1.0);
    let split_index = (fraction * examples.len() as f32) as usize;
    let test = examples.split_off(split_index.min(examples.len()));

    (examples, test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_split_sizes() {
        let mut rng = StdRng::seed_from_u64(42);
        let (train, test) = train_test_split((0..100).collect::<Vec<i32>>(), 0.9, &mut rng);

        assert_eq!(train.len(), 90);
        assert_eq!(test.len(), 10);

        let mut all: Vec<i32> = train.into_iter().chain(test).collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_seeded() {
        let split = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            train_test_split((0..20).collect::<Vec<u32>>(), 0.5, &mut rng)
        };

        assert_eq!(split(7), split(7));
    }

    #[test]
    fn test_degenerate_fractions() {
        let mut rng = StdRng::seed_from_u64(1);
        let (train, test) = train_test_split(vec![1, 2, 3], 1.5, &mut rng);
        assert_eq!((train.len(), test.len()), (3, 0));

        let (train, test) = train_test_split(Vec::<u8>::new(), 0.9, &mut rng);
        assert!(train.is_empty() && test.is_empty());
    }
}
