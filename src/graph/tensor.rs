use serde::{Deserialize, Serialize};

/// Element type of a tensor.
///
/// Values are stored as `f64` internally; `F32` tensors round every stored
/// element through `f32` so that mixed-precision variable sets behave like
/// they would on a real runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DType {
    F32,
    F64,
}

impl DType {
    /// Rounds `value` to this dtype's precision.
    ///
    /// # Arguments
    /// * `value` - The value to quantize.
    ///
    /// # Returns
    /// The value representable in this dtype.
    pub fn quantize(self, value: f64) -> f64 {
        match self {
            DType::F32 => value as f32 as f64,
            DType::F64 => value,
        }
    }
}

/// A flat, dtype-tagged tensor value.
///
/// Shape information lives on the owning `VariableRef`; a `TensorValue` only
/// carries the element buffer and its precision tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorValue {
    dtype: DType,
    data: Vec<f64>,
}

impl TensorValue {
    /// Creates a new tensor value, quantizing every element to `dtype`.
    ///
    /// # Arguments
    /// * `dtype` - The precision tag.
    /// * `values` - The element buffer.
    ///
    /// # Returns
    /// A new `TensorValue` instance.
    pub fn new(dtype: DType, values: Vec<f64>) -> Self {
        let mut tensor = Self {
            dtype,
            data: values,
        };
        tensor.quantize_all();
        tensor
    }

    /// Creates a tensor of `len` copies of `value`.
    ///
    /// # Arguments
    /// * `dtype` - The precision tag.
    /// * `len` - The number of elements.
    /// * `value` - The fill value.
    ///
    /// # Returns
    /// A new `TensorValue` instance.
    pub fn filled(dtype: DType, len: usize, value: f64) -> Self {
        Self::new(dtype, vec![value; len])
    }

    /// Returns the precision tag.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns whether the tensor has no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the element buffer.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutates the element buffer in place, re-quantizing afterwards.
    ///
    /// # Arguments
    /// * `f` - The mutation to apply to the raw buffer.
    pub fn map_in_place<F: FnOnce(&mut [f64])>(&mut self, f: F) {
        f(&mut self.data);
        self.quantize_all();
    }

    /// Re-casts this tensor into `dtype`, quantizing the elements.
    ///
    /// # Arguments
    /// * `dtype` - The target precision tag.
    ///
    /// # Returns
    /// A new `TensorValue` in the requested dtype.
    pub fn cast(&self, dtype: DType) -> Self {
        Self::new(dtype, self.data.clone())
    }

    fn quantize_all(&mut self) {
        if self.dtype == DType::F32 {
            for value in &mut self.data {
                *value = *value as f32 as f64;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f64_values_kept_exact() {
        let tensor = TensorValue::new(DType::F64, vec![0.1, 0.2]);
        assert_eq!(tensor.data(), &[0.1, 0.2]);
    }

    #[test]
    fn f32_values_rounded_on_store() {
        let tensor = TensorValue::new(DType::F32, vec![0.1]);
        assert_eq!(tensor.data()[0], 0.1f32 as f64);
        assert_ne!(tensor.data()[0], 0.1);
    }

    #[test]
    fn map_in_place_requantizes() {
        let mut tensor = TensorValue::filled(DType::F32, 2, 0.0);
        tensor.map_in_place(|data| data.fill(0.3));
        assert_eq!(tensor.data(), &[0.3f32 as f64; 2]);
    }

    #[test]
    fn cast_changes_precision() {
        let tensor = TensorValue::new(DType::F64, vec![0.1]);
        let cast = tensor.cast(DType::F32);
        assert_eq!(cast.dtype(), DType::F32);
        assert_eq!(cast.data()[0], 0.1f32 as f64);
    }
}
