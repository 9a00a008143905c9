use super::Initializer;

/// An initializer that always generates the same value.
#[derive(Debug, Clone, Copy)]
pub struct ConstInit {
    value: f64,
}

impl ConstInit {
    /// Creates a new `ConstInit` initializer.
    ///
    /// # Arguments
    /// * `value` - The value to always generate.
    ///
    /// # Returns
    /// A new `ConstInit` instance.
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    /// Returns the fill value.
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Initializer for ConstInit {
    fn generate(&self, n: usize) -> Vec<f64> {
        vec![self.value; n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        let init = ConstInit::new(1.0);
        assert!(init.generate(0).is_empty());
    }

    #[test]
    fn fills() {
        let init = ConstInit::new(0.5);
        assert_eq!(init.generate(3), vec![0.5; 3]);
    }
}
