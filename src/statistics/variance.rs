use crate::statistics::mean::MeanExt;

use super::EmptySequenceError;

pub trait VarianceExt: Iterator {
    /// Sum of squared deviations from the mean.
    fn centered_sum_of_squares(self) -> Result<f64, EmptySequenceError>;
}
impl<T> VarianceExt for T
where
    T: Iterator<Item = f64> + Clone,
{
    fn centered_sum_of_squares(self) -> Result<f64, EmptySequenceError> {
        let mean = self.clone().mean()?;
        Ok(self.map(|x| (x - mean).powi(2)).sum())
    }
}
