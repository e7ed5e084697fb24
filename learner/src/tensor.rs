use crate::LearnerError;

/// A named, shaped f32 buffer.
///
/// This is the unit the checkpoint store persists and the aggregator merges.
/// The element count invariant (`data.len() == shape product`) is enforced at
/// construction, so every `Tensor` in the system is well-formed.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    name: String,
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Creates a new `Tensor`.
    ///
    /// # Errors
    /// Returns `LearnerError::InvalidInput` if the shape contains a zero
    /// dimension, or `LearnerError::ShapeMismatch` if `data` does not hold
    /// exactly the shape product's worth of elements.
    pub fn new(
        name: impl Into<String>,
        shape: Vec<usize>,
        data: Vec<f32>,
    ) -> Result<Self, LearnerError> {
        if shape.iter().any(|&d| d == 0) {
            return Err(LearnerError::InvalidInput("tensor dimensions must be positive"));
        }

        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(LearnerError::ShapeMismatch {
                what: "tensor data",
                got: vec![data.len()],
                expected: vec![expected],
            });
        }

        Ok(Self { name: name.into(), shape, data })
    }

    /// Returns the tensor's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the flat element buffer, in row-major order.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns whether the tensor holds no elements.
    ///
    /// Always false for a constructed tensor, kept for API completeness.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consumes the tensor and returns its flat buffer.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_shape_and_data() {
        let t = Tensor::new("w", vec![2, 3], vec![0.0; 6]).unwrap();
        assert_eq!(t.name(), "w");
        assert_eq!(t.shape(), &[2, 3]);
        assert_eq!(t.len(), 6);
    }

    #[test]
    fn rejects_element_count_mismatch() {
        let err = Tensor::new("w", vec![2, 3], vec![0.0; 5]).unwrap_err();
        assert!(matches!(err, LearnerError::ShapeMismatch { .. }));
    }

    #[test]
    fn rejects_zero_dimension() {
        let err = Tensor::new("w", vec![2, 0], vec![]).unwrap_err();
        assert!(matches!(err, LearnerError::InvalidInput(_)));
    }
}
