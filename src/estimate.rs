pub trait Estimate<V> {
    type Err;
    type Output;

    /// Fits a model from the elements of the iterator.
    fn fit(&self, examples: impl Iterator<Item = V> + Clone) -> Result<Self::Output, Self::Err>
    where
        Self: Sized;
}
pub trait EstimateExt: Iterator {
    /// Fits a model from the elements of the iterator.
    fn fit<E: Estimate<Self::Item>>(self, estimator: &E) -> Result<E::Output, E::Err>
    where
        Self: Clone + Sized,
    {
        estimator.fit(self)
    }
}
impl<I: Iterator> EstimateExt for I {}
