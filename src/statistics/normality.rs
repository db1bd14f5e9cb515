//! Residual diagnostics reported under the coefficient table.

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};

use super::mean::central_moment;

/// The omnibus skewness test is undefined below this sample size.
const MIN_OMNIBUS_OBSERVATIONS: usize = 8;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResidualDiagnostics {
    pub omnibus: f64,
    pub omnibus_p_value: f64,
    pub skew: f64,
    pub kurtosis: f64,
    pub durbin_watson: f64,
    pub jarque_bera: f64,
    pub jarque_bera_p_value: f64,
}
impl ResidualDiagnostics {
    pub fn new(residuals: &[f64]) -> Self {
        let (omnibus, omnibus_p_value) = omnibus(residuals);
        let (jarque_bera, jarque_bera_p_value) = jarque_bera(residuals);
        Self {
            omnibus,
            omnibus_p_value,
            skew: skewness(residuals),
            kurtosis: kurtosis(residuals),
            durbin_watson: durbin_watson(residuals),
            jarque_bera,
            jarque_bera_p_value,
        }
    }
}

/// Biased sample skewness $m_3 / m_2^{3/2}$.
pub fn skewness(values: &[f64]) -> f64 {
    let (Ok(m2), Ok(m3)) = (
        central_moment(values.iter().copied(), 2),
        central_moment(values.iter().copied(), 3),
    ) else {
        return f64::NAN;
    };
    m3 / m2.powf(1.5)
}

/// Pearson (non-excess) kurtosis $m_4 / m_2^2$.
pub fn kurtosis(values: &[f64]) -> f64 {
    let (Ok(m2), Ok(m4)) = (
        central_moment(values.iter().copied(), 2),
        central_moment(values.iter().copied(), 4),
    ) else {
        return f64::NAN;
    };
    m4 / m2.powi(2)
}

pub fn durbin_watson(residuals: &[f64]) -> f64 {
    let ssr: f64 = residuals.iter().map(|e| e * e).sum();
    let diff: f64 = residuals.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    diff / ssr
}

/// Statistic and its $\chi^2_2$ p-value.
pub fn jarque_bera(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let s = skewness(values);
    let k = kurtosis(values);
    let jb = n / 6. * (s.powi(2) + (k - 3.).powi(2) / 4.);
    (jb, chi_squared_2_sf(jb))
}

/// D'Agostino-Pearson $K^2$ and its $\chi^2_2$ p-value.
pub fn omnibus(values: &[f64]) -> (f64, f64) {
    if values.len() < MIN_OMNIBUS_OBSERVATIONS {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let z_skew = skew_test_z(n, skewness(values));
    let z_kurtosis = kurtosis_test_z(n, kurtosis(values));
    let k2 = z_skew.powi(2) + z_kurtosis.powi(2);
    (k2, chi_squared_2_sf(k2))
}

/// D'Agostino's transformation of sample skewness to a standard normal score.
fn skew_test_z(n: f64, skew: f64) -> f64 {
    let mut y = skew * ((n + 1.) * (n + 3.) / (6. * (n - 2.))).sqrt();
    let beta2 = 3. * (n * n + 27. * n - 70.) * (n + 1.) * (n + 3.)
        / ((n - 2.) * (n + 5.) * (n + 7.) * (n + 9.));
    let w2 = -1. + (2. * (beta2 - 1.)).sqrt();
    let delta = 1. / (0.5 * w2.ln()).sqrt();
    let alpha = (2. / (w2 - 1.)).sqrt();
    if y == 0. {
        y = 1.;
    }
    delta * (y / alpha + ((y / alpha).powi(2) + 1.).sqrt()).ln()
}

/// Anscombe-Glynn transformation of sample kurtosis to a standard normal score.
fn kurtosis_test_z(n: f64, kurtosis: f64) -> f64 {
    let expected = 3. * (n - 1.) / (n + 1.);
    let variance =
        24. * n * (n - 2.) * (n - 3.) / ((n + 1.).powi(2) * (n + 3.) * (n + 5.));
    let x = (kurtosis - expected) / variance.sqrt();
    let sqrt_beta1 = 6. * (n * n - 5. * n + 2.) / ((n + 7.) * (n + 9.))
        * (6. * (n + 3.) * (n + 5.) / (n * (n - 2.) * (n - 3.))).sqrt();
    let a = 6. + 8. / sqrt_beta1 * (2. / sqrt_beta1 + (1. + 4. / sqrt_beta1.powi(2)).sqrt());
    let term1 = 1. - 2. / (9. * a);
    let denom = 1. + x * (2. / (a - 4.)).sqrt();
    if denom == 0. {
        return f64::NAN;
    }
    let term2 = denom.signum() * ((1. - 2. / a) / denom.abs()).cbrt();
    (term1 - term2) / (2. / (9. * a)).sqrt()
}

fn chi_squared_2_sf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x == f64::INFINITY {
        return 0.;
    }
    let Ok(dist) = ChiSquared::new(2.) else {
        return f64::NAN;
    };
    1. - dist.cdf(x.max(0.))
}
