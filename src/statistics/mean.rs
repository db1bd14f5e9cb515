use super::EmptySequenceError;

pub trait MeanExt: Iterator {
    fn mean(self) -> Result<f64, EmptySequenceError>;
}
impl<T> MeanExt for T
where
    T: Iterator<Item = f64> + Clone,
{
    fn mean(self) -> Result<f64, EmptySequenceError> {
        let n: usize = self.clone().count();
        if n == 0 {
            return Err(EmptySequenceError);
        }
        // Sum of fractions is used to avoid infinite value
        Ok(self.map(|x| x / n as f64).sum())
    }
}

/// `k`-th moment about the mean, with `n` in the denominator.
pub fn central_moment(
    values: impl Iterator<Item = f64> + Clone,
    k: i32,
) -> Result<f64, EmptySequenceError> {
    let mean = values.clone().mean()?;
    values.map(|x| (x - mean).powi(k)).mean()
}
