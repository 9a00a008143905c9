use parking_lot::Mutex;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal, Uniform};

use super::{Initializer, Result};

/// An initializer that samples a probabilistic distribution.
///
/// The generator keeps its own rng so that graph-level sharing through an
/// `Arc` stays possible; a fixed seed makes initialization reproducible.
pub struct RandInit<D> {
    rng: Mutex<StdRng>,
    distribution: D,
}

impl<D: Distribution<f64>> RandInit<D> {
    /// Creates a new `RandInit` initializer.
    ///
    /// # Arguments
    /// * `seed` - An optional seed for the rng.
    /// * `distribution` - The distribution to sample from.
    ///
    /// # Returns
    /// A new `RandInit` instance.
    pub fn new(seed: Option<u64>, distribution: D) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            rng: Mutex::new(rng),
            distribution,
        }
    }
}

impl RandInit<Uniform<f64>> {
    /// Creates a new `RandInit` initializer with a uniform distribution.
    ///
    /// # Arguments
    /// * `seed` - An optional seed for the rng.
    /// * `low` - The inclusive lower limit.
    /// * `high` - The exclusive upper limit.
    ///
    /// # Returns
    /// An error if the range is invalid (low > high).
    pub fn uniform(seed: Option<u64>, low: f64, high: f64) -> Result<Self> {
        Ok(Self::new(seed, Uniform::new(low, high)?))
    }
}

impl RandInit<Normal<f64>> {
    /// Creates a new `RandInit` initializer with a normal distribution.
    ///
    /// # Arguments
    /// * `seed` - An optional seed for the rng.
    /// * `mean` - The mean of the distribution.
    /// * `std_dev` - The standard deviation of the distribution.
    ///
    /// # Returns
    /// An error if `std_dev` is not finite (NaN or infinite).
    pub fn normal(seed: Option<u64>, mean: f64, std_dev: f64) -> Result<Self> {
        Ok(Self::new(seed, Normal::new(mean, std_dev)?))
    }
}

impl<D: Distribution<f64> + Send + Sync> Initializer for RandInit<D> {
    fn generate(&self, n: usize) -> Vec<f64> {
        let mut rng = self.rng.lock();
        (0..n).map(|_| self.distribution.sample(&mut *rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_stays_in_range() {
        let init = RandInit::uniform(Some(7), -1.0, 1.0).unwrap();
        let values = init.generate(100);

        assert_eq!(values.len(), 100);
        assert!(values.iter().all(|v| (-1.0..1.0).contains(v)));
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = RandInit::normal(Some(42), 0.0, 1.0).unwrap();
        let b = RandInit::normal(Some(42), 0.0, 1.0).unwrap();

        assert_eq!(a.generate(10), b.generate(10));
    }

    #[test]
    fn invalid_uniform_range() {
        assert!(RandInit::uniform(None, 1.0, -1.0).is_err());
    }

    #[test]
    fn invalid_std_dev() {
        assert!(RandInit::normal(None, 0.0, f64::NAN).is_err());
    }
}
