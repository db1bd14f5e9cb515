use core::num::NonZeroUsize;

use getset::{CopyGetters, Getters};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use strict_num::FiniteF64;
use thiserror::Error;

use crate::{
    estimate::Estimate,
    matrix::{Container2D, Container2DMut, Index, MatrixBuf, SingularMatrixError, Size},
    statistics::{mean::MeanExt, variance::VarianceExt},
};

/// Label of the intercept term in the design matrix.
pub const INTERCEPT_LABEL: &str = "const";

pub trait Sample {
    fn predictors(&self) -> impl Iterator<Item = FiniteF64> + Clone;
    fn response(&self) -> FiniteF64;
}

/// Intercept column followed by the predictors, row-aligned with the response.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    x: MatrixBuf<Vec<f64>>,
    y: Vec<f64>,
}
impl DesignMatrix {
    pub fn from_samples<V>(examples: impl Iterator<Item = V> + Clone) -> Result<Self, OlsError>
    where
        V: Sample,
    {
        let k: NonZeroUsize = num_predictor_variables(examples.clone())?;
        let n: usize = examples.clone().count();
        let cols = k.get() + 1;
        if n < cols {
            return Err(OlsError::TooFewExamples { rows: n, cols });
        }

        let size = Size {
            rows: NonZeroUsize::new(n).unwrap(),
            cols: NonZeroUsize::new(cols).unwrap(),
        };
        let mut x = MatrixBuf::<Vec<f64>>::zero(size);
        let mut y = Vec::with_capacity(n);
        for (row, example) in examples.enumerate() {
            x.set_cell(Index { row, col: 0 }, 1.);
            for (i, predictor) in example.predictors().enumerate() {
                x.set_cell(Index { row, col: i + 1 }, predictor.get());
            }
            y.push(example.response().get());
        }
        Ok(Self { x, y })
    }

    pub fn rows(&self) -> usize {
        self.x.size().rows.get()
    }
    pub fn cols(&self) -> usize {
        self.x.size().cols.get()
    }
    pub fn x(&self) -> &MatrixBuf<Vec<f64>> {
        &self.x
    }
    pub fn response(&self) -> &[f64] {
        &self.y
    }
}

fn num_predictor_variables<V>(
    examples: impl Iterator<Item = V> + Clone,
) -> Result<NonZeroUsize, OlsError>
where
    V: Sample,
{
    let first: V = examples.clone().next().ok_or(OlsError::EmptyExamples)?;
    let k: usize = first.predictors().count();
    for example in examples.clone() {
        if example.predictors().count() != k {
            return Err(OlsError::NumPredictorsNotConstant);
        }
    }
    NonZeroUsize::new(k).ok_or(OlsError::NoPredictors)
}

#[derive(Debug, Error, Clone, Copy)]
pub enum OlsError {
    #[error("no examples")]
    EmptyExamples,
    #[error("no predictor variables")]
    NoPredictors,
    #[error("number of predictors is not constant")]
    NumPredictorsNotConstant,
    #[error("too few examples: {rows} rows for {cols} design matrix columns")]
    TooFewExamples { rows: usize, cols: usize },
    #[error("design matrix is rank deficient (collinear or constant predictors)")]
    SingularDesign,
}
impl From<SingularMatrixError> for OlsError {
    fn from(_: SingularMatrixError) -> Self {
        Self::SingularDesign
    }
}

/// Ordinary least squares via the normal equations.
#[derive(Debug, Clone)]
pub struct OlsEstimator;
impl<V> Estimate<V> for OlsEstimator
where
    V: Sample,
{
    type Err = OlsError;
    type Output = OlsFit;

    fn fit(&self, examples: impl Iterator<Item = V> + Clone) -> Result<Self::Output, Self::Err>
    where
        Self: Sized,
    {
        let design = DesignMatrix::from_samples(examples)?;
        OlsFit::from_design(&design)
    }
}

/// Predictors and response shifted to zero mean.
///
/// Fitting the slopes on centred columns keeps a large common offset in a
/// predictor from swamping its spread.
#[derive(Debug, Clone)]
struct Centered {
    /// $n \times k$, the intercept column dropped
    x: MatrixBuf<Vec<f64>>,
    y: Vec<f64>,
    x_means: Vec<f64>,
    y_mean: f64,
}
impl Centered {
    fn new(design: &DesignMatrix) -> Result<Self, OlsError> {
        let n = design.rows();
        let k = design.cols() - 1;
        let column_mean = |col: usize| {
            (0..n)
                .map(move |row| design.x().cell(Index { row, col }))
                .mean()
                .map_err(|_| OlsError::EmptyExamples)
        };
        let x_means = (1..=k)
            .map(column_mean)
            .collect::<Result<Vec<f64>, OlsError>>()?;
        let y_mean = design
            .response()
            .iter()
            .copied()
            .mean()
            .map_err(|_| OlsError::EmptyExamples)?;

        let size = Size {
            rows: design.x().size().rows,
            cols: NonZeroUsize::new(k).ok_or(OlsError::NoPredictors)?,
        };
        let mut x = MatrixBuf::<Vec<f64>>::zero(size);
        for row in 0..n {
            for (col, mean) in x_means.iter().copied().enumerate() {
                let value = design.x().cell(Index { row, col: col + 1 }) - mean;
                x.set_cell(Index { row, col }, value);
            }
        }
        let y = design.response().iter().map(|y| y - y_mean).collect();
        Ok(Self {
            x,
            y,
            x_means,
            y_mean,
        })
    }
}

/// `(XᵀX)⁻¹`, computed on the unit-diagonal rescaling of `XᵀX` so that the
/// rank check does not depend on the units of the predictors.
#[allow(non_snake_case)]
fn XTX_inv(XTX: &MatrixBuf<Vec<f64>>) -> Result<MatrixBuf<Vec<f64>>, OlsError> {
    let p = XTX.size().rows.get();
    let scales = (0..p)
        .map(|i| XTX.cell(Index { row: i, col: i }).sqrt())
        .collect::<Vec<f64>>();
    if scales.iter().any(|s| !(*s > 0.) || !s.is_finite()) {
        return Err(OlsError::SingularDesign);
    }

    let mut normalized = XTX.clone();
    rescale(&mut normalized, &scales);
    let mut inverse = normalized.inverse()?;
    rescale(&mut inverse, &scales);
    Ok(inverse)
}
fn rescale(matrix: &mut MatrixBuf<Vec<f64>>, scales: &[f64]) {
    for row in 0..scales.len() {
        for col in 0..scales.len() {
            let index = Index { row, col };
            let value = matrix.cell(index) / (scales[row] * scales[col]);
            matrix.set_cell(index, value);
        }
    }
}

#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct OlsFit {
    /// ```math
    /// (b_0, b_1, ..., b_k)
    /// ```
    ///
    /// - $b_0$: the intercept
    /// - $k$: the number of predictor variables
    params: Vec<f64>,
    /// Standard errors of the params
    #[getset(get = "pub")]
    bse: Vec<f64>,
    #[getset(get = "pub")]
    residuals: Vec<f64>,
    #[getset(get_copy = "pub")]
    n_observations: usize,
    #[getset(get_copy = "pub")]
    df_model: usize,
    #[getset(get_copy = "pub")]
    df_resid: usize,
    /// Sum of squared residuals
    #[getset(get_copy = "pub")]
    ssr: f64,
    #[getset(get_copy = "pub")]
    centered_tss: f64,
    /// Square root of the eigenvalue ratio of $X^T X$
    #[getset(get_copy = "pub")]
    condition_number: f64,
}
impl OlsFit {
    /// Slopes come from the centred normal equations
    /// $b = (X_c^T X_c)^{-1} X_c^T y_c$ and the intercept from
    /// $b_0 = \bar y - \sum_j b_j \bar x_j$.
    #[allow(non_snake_case)]
    pub fn from_design(design: &DesignMatrix) -> Result<Self, OlsError> {
        let n = design.rows();
        let p = design.cols();
        let k = p - 1;
        let centered = Centered::new(design)?;

        let Xc = &centered.x;
        let XcT = Xc.transpose();
        let XcTXc_inv = XTX_inv(&XcT.mul_matrix(Xc))?;
        let y_size = Size {
            rows: Xc.size().rows,
            cols: NonZeroUsize::new(1).unwrap(),
        };
        let yc = MatrixBuf::new(y_size, centered.y.clone());
        let b = XcTXc_inv.mul_matrix(&XcT.mul_matrix(&yc));
        let slopes = (0..k)
            .map(|row| b.cell(Index { row, col: 0 }))
            .collect::<Vec<f64>>();
        let intercept = centered.y_mean
            - slopes
                .iter()
                .zip(&centered.x_means)
                .map(|(b, mean)| b * mean)
                .sum::<f64>();

        let residuals = (0..n)
            .map(|row| {
                let y_hat: f64 = (0..k)
                    .map(|col| slopes[col] * Xc.cell(Index { row, col }))
                    .sum();
                centered.y[row] - y_hat
            })
            .collect::<Vec<f64>>();
        let ssr = residuals.iter().map(|e| e * e).sum();
        let centered_tss = design
            .response()
            .iter()
            .copied()
            .centered_sum_of_squares()
            .map_err(|_| OlsError::EmptyExamples)?;

        let mut fit = Self {
            params: core::iter::once(intercept).chain(slopes).collect(),
            bse: vec![],
            residuals,
            n_observations: n,
            df_model: k,
            df_resid: n - p,
            ssr,
            centered_tss,
            condition_number: f64::NAN,
        };

        // Var(b_0) = σ² (1/n + x̄ᵀ (X_cᵀX_c)⁻¹ x̄)
        let means = &centered.x_means;
        let mut intercept_factor = 1. / n as f64;
        for i in 0..k {
            for j in 0..k {
                intercept_factor +=
                    means[i] * XcTXc_inv.cell(Index { row: i, col: j }) * means[j];
            }
        }
        let scale = fit.scale();
        fit.bse = core::iter::once(intercept_factor)
            .chain((0..k).map(|i| XcTXc_inv.cell(Index { row: i, col: i })))
            .map(|factor| (scale * factor).sqrt())
            .collect();

        let X = design.x();
        let eigenvalues = X.transpose().mul_matrix(X).symmetric_eigenvalues();
        let min = eigenvalues[0];
        let max = eigenvalues[eigenvalues.len() - 1];
        fit.condition_number = if min > 0. {
            (max / min).sqrt()
        } else {
            f64::INFINITY
        };

        Ok(fit)
    }

    /// Residual variance; undefined for an exactly determined system.
    pub fn scale(&self) -> f64 {
        if self.df_resid == 0 {
            return f64::NAN;
        }
        self.ssr / self.df_resid as f64
    }

    pub fn r_squared(&self) -> f64 {
        if self.centered_tss == 0. {
            return f64::NAN;
        }
        1. - self.ssr / self.centered_tss
    }

    pub fn adjusted_r_squared(&self) -> f64 {
        if self.df_resid == 0 {
            return f64::NAN;
        }
        let adjustment = (self.n_observations - 1) as f64 / self.df_resid as f64;
        1. - adjustment * (1. - self.r_squared())
    }

    /// Null hypothesis: $b_i = 0$
    pub fn t_values(&self) -> Vec<f64> {
        self.params
            .iter()
            .copied()
            .zip(self.bse.iter().copied())
            .map(|(b, se)| (b - 0.) / se)
            .collect()
    }

    pub fn p_values(&self) -> Vec<f64> {
        let dist = self.t_distribution();
        self.t_values()
            .into_iter()
            .map(|t| match &dist {
                Some(dist) => two_sided_p_value(dist, t),
                None => f64::NAN,
            })
            .collect()
    }

    /// Two-sided confidence intervals at significance level `alpha`.
    ///
    /// Bounds are NaN unless `alpha` lies strictly between 0 and 1.
    pub fn conf_int(&self, alpha: f64) -> Vec<(f64, f64)> {
        let t_critical = match self.t_distribution() {
            Some(dist) if 0. < alpha && alpha < 1. => dist.inverse_cdf(1. - alpha / 2.),
            _ => f64::NAN,
        };
        self.params
            .iter()
            .copied()
            .zip(self.bse.iter().copied())
            .map(|(b, se)| (b - t_critical * se, b + t_critical * se))
            .collect()
    }

    /// Joint test that every slope except the intercept is zero.
    pub fn f_value(&self) -> f64 {
        if self.df_resid == 0 {
            return f64::NAN;
        }
        let explained = self.centered_tss - self.ssr;
        (explained / self.df_model as f64) / self.scale()
    }

    pub fn f_p_value(&self) -> f64 {
        let f = self.f_value();
        let Ok(dist) = FisherSnedecor::new(self.df_model as f64, self.df_resid as f64) else {
            return f64::NAN;
        };
        if f.is_nan() {
            return f64::NAN;
        }
        if f == f64::INFINITY {
            return 0.;
        }
        1. - dist.cdf(f.max(0.))
    }

    pub fn log_likelihood(&self) -> f64 {
        let n = self.n_observations as f64;
        -n / 2. * ((2. * core::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.)
    }

    /// Number of estimated params, intercept included.
    pub fn k_params(&self) -> usize {
        self.params.len()
    }

    pub fn aic(&self) -> f64 {
        -2. * self.log_likelihood() + 2. * self.k_params() as f64
    }

    pub fn bic(&self) -> f64 {
        let n = self.n_observations as f64;
        -2. * self.log_likelihood() + n.ln() * self.k_params() as f64
    }

    fn t_distribution(&self) -> Option<StudentsT> {
        StudentsT::new(0., 1., self.df_resid as f64).ok()
    }
}
impl LinearRegression for OlsFit {
    fn predict(
        &self,
        predictors: impl Iterator<Item = f64> + Clone,
    ) -> Result<f64, LinearRegressionError> {
        if predictors.clone().count() + 1 != self.params.len() {
            return Err(LinearRegressionError::NumPredictorsNumParamsMismatched);
        }

        let mut sum = self.params[0];
        for (param, predictor) in self.params[1..].iter().copied().zip(predictors) {
            sum += param * predictor
        }

        Ok(sum)
    }
    fn params(&self) -> &[f64] {
        &self.params
    }
}

fn two_sided_p_value(dist: &StudentsT, t: f64) -> f64 {
    if t.is_nan() {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.;
    }
    (2. * (1. - dist.cdf(t.abs()))).clamp(0., 1.)
}

pub trait LinearRegression {
    fn predict(
        &self,
        predictors: impl Iterator<Item = f64> + Clone,
    ) -> Result<f64, LinearRegressionError>;
    fn params(&self) -> &[f64];
}
#[derive(Debug, Error, Clone, Copy)]
pub enum LinearRegressionError {
    #[error("number of predictors and params are not the same")]
    NumPredictorsNumParamsMismatched,
}
