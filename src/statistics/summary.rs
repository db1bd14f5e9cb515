use core::fmt;

use serde::Serialize;
use thiserror::Error;

use super::{
    lin_regr::{LinearRegression, OlsFit, INTERCEPT_LABEL},
    normality::ResidualDiagnostics,
};

const WIDTH: usize = 78;

#[derive(Debug, Clone, Serialize)]
pub struct CoefficientRow {
    pub name: String,
    pub coef: f64,
    pub std_err: f64,
    pub t: f64,
    pub p_value: f64,
    pub conf_lower: f64,
    pub conf_upper: f64,
}

/// Everything printed for one fitted model.
#[derive(Debug, Clone, Serialize)]
pub struct RegressionSummary {
    pub dependent: String,
    pub n_observations: usize,
    pub df_resid: usize,
    pub df_model: usize,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub f_p_value: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub alpha: f64,
    pub coefficients: Vec<CoefficientRow>,
    pub diagnostics: ResidualDiagnostics,
    pub condition_number: f64,
}
impl RegressionSummary {
    /// `predictors` names the design matrix columns after the intercept, in order.
    pub fn new(
        fit: &OlsFit,
        dependent: &str,
        predictors: &[impl AsRef<str>],
        alpha: f64,
    ) -> Result<Self, SummaryError> {
        if !(0. < alpha && alpha < 1.) {
            return Err(SummaryError::InvalidAlpha(alpha));
        }
        if predictors.len() + 1 != fit.params().len() {
            return Err(SummaryError::NumNamesNumParamsMismatched {
                names: predictors.len(),
                params: fit.params().len(),
            });
        }

        let names = core::iter::once(INTERCEPT_LABEL)
            .chain(predictors.iter().map(|name| name.as_ref()));
        let t_values = fit.t_values();
        let p_values = fit.p_values();
        let conf_int = fit.conf_int(alpha);
        let coefficients = names
            .enumerate()
            .map(|(i, name)| CoefficientRow {
                name: name.to_string(),
                coef: fit.params()[i],
                std_err: fit.bse()[i],
                t: t_values[i],
                p_value: p_values[i],
                conf_lower: conf_int[i].0,
                conf_upper: conf_int[i].1,
            })
            .collect::<Vec<CoefficientRow>>();

        Ok(Self {
            dependent: dependent.to_string(),
            n_observations: fit.n_observations(),
            df_resid: fit.df_resid(),
            df_model: fit.df_model(),
            r_squared: fit.r_squared(),
            adj_r_squared: fit.adjusted_r_squared(),
            f_statistic: fit.f_value(),
            f_p_value: fit.f_p_value(),
            log_likelihood: fit.log_likelihood(),
            aic: fit.aic(),
            bic: fit.bic(),
            alpha,
            coefficients,
            diagnostics: ResidualDiagnostics::new(fit.residuals()),
            condition_number: fit.condition_number(),
        })
    }
}
#[derive(Debug, Error, Clone, Copy)]
pub enum SummaryError {
    #[error("significance level must be in (0, 1), got {0}")]
    InvalidAlpha(f64),
    #[error("{names} predictor names for {params} params")]
    NumNamesNumParamsMismatched { names: usize, params: usize },
}

impl fmt::Display for RegressionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let double_rule = "=".repeat(WIDTH);
        let single_rule = "-".repeat(WIDTH);

        writeln!(f, "{:^WIDTH$}", "OLS Regression Results")?;
        writeln!(f, "{double_rule}")?;
        let header = [
            (
                ("Dep. Variable:", self.dependent.clone()),
                ("R-squared:", num(self.r_squared, 3)),
            ),
            (
                ("Model:", "OLS".to_string()),
                ("Adj. R-squared:", num(self.adj_r_squared, 3)),
            ),
            (
                ("Method:", "Least Squares".to_string()),
                ("F-statistic:", num(self.f_statistic, 2)),
            ),
            (
                ("No. Observations:", self.n_observations.to_string()),
                ("Prob (F-statistic):", sci(self.f_p_value)),
            ),
            (
                ("Df Residuals:", self.df_resid.to_string()),
                ("Log-Likelihood:", num(self.log_likelihood, 2)),
            ),
            (
                ("Df Model:", self.df_model.to_string()),
                ("AIC:", num(self.aic, 1)),
            ),
            (
                ("Covariance Type:", "nonrobust".to_string()),
                ("BIC:", num(self.bic, 1)),
            ),
        ];
        for (left, right) in header {
            write_pair_row(f, left, right)?;
        }
        writeln!(f, "{double_rule}")?;

        let name_width = self
            .coefficients
            .iter()
            .map(|row| row.name.len() + 1)
            .max()
            .unwrap_or(0)
            .max(12);
        let lower = format!("[{}", num(self.alpha / 2., 3));
        let upper = format!("{}]", num(1. - self.alpha / 2., 3));
        writeln!(
            f,
            "{:<name_width$}{:>11}{:>11}{:>11}{:>11}{:>11}{:>11}",
            "", "coef", "std err", "t", "P>|t|", lower, upper
        )?;
        writeln!(f, "{single_rule}")?;
        for row in &self.coefficients {
            writeln!(
                f,
                "{:<name_width$}{:>11}{:>11}{:>11}{:>11}{:>11}{:>11}",
                row.name,
                num(row.coef, 4),
                num(row.std_err, 3),
                num(row.t, 3),
                num(row.p_value, 3),
                num(row.conf_lower, 3),
                num(row.conf_upper, 3),
            )?;
        }
        writeln!(f, "{double_rule}")?;

        let d = &self.diagnostics;
        let footer = [
            (
                ("Omnibus:", num(d.omnibus, 3)),
                ("Durbin-Watson:", num(d.durbin_watson, 3)),
            ),
            (
                ("Prob(Omnibus):", num(d.omnibus_p_value, 3)),
                ("Jarque-Bera (JB):", num(d.jarque_bera, 3)),
            ),
            (("Skew:", num(d.skew, 3)), ("Prob(JB):", num(d.jarque_bera_p_value, 3))),
            (
                ("Kurtosis:", num(d.kurtosis, 3)),
                ("Cond. No.", sci_or_num(self.condition_number)),
            ),
        ];
        for (left, right) in footer {
            write_pair_row(f, left, right)?;
        }
        write!(f, "{double_rule}")
    }
}

fn write_pair_row(
    f: &mut fmt::Formatter<'_>,
    (left_label, left_value): (&str, String),
    (right_label, right_value): (&str, String),
) -> fmt::Result {
    writeln!(
        f,
        "{left_label:<20}{left_value:>18}   {right_label:<22}{right_value:>15}"
    )
}

/// Fixed-point with lower-case non-finite values.
fn num(x: f64, precision: usize) -> String {
    match non_finite(x) {
        Some(s) => s.to_string(),
        None => format!("{x:.precision$}"),
    }
}

fn sci(x: f64) -> String {
    match non_finite(x) {
        Some(s) => s.to_string(),
        None => format!("{x:.2e}"),
    }
}

fn sci_or_num(x: f64) -> String {
    if x.is_finite() && x.abs() >= 1e4 {
        return sci(x);
    }
    num(x, 2)
}

fn non_finite(x: f64) -> Option<&'static str> {
    if x.is_nan() {
        Some("nan")
    } else if x == f64::INFINITY {
        Some("inf")
    } else if x == f64::NEG_INFINITY {
        Some("-inf")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use strict_num::FiniteF64;

    use crate::{
        estimate::Estimate,
        statistics::lin_regr::{OlsEstimator, Sample},
    };

    use super::*;

    struct Row(Vec<f64>, f64);
    impl Sample for &Row {
        fn predictors(&self) -> impl Iterator<Item = FiniteF64> + Clone {
            self.0.iter().copied().map(|x| FiniteF64::new(x).unwrap())
        }
        fn response(&self) -> FiniteF64 {
            FiniteF64::new(self.1).unwrap()
        }
    }

    fn fit(rows: &[Row]) -> OlsFit {
        OlsEstimator.fit(rows.iter()).unwrap()
    }

    #[test]
    fn test_exactly_determined_summary() {
        let rows = [
            Row(vec![1., 2.], 1.),
            Row(vec![2., 3.], 2.),
            Row(vec![3., 5.], 3.),
        ];
        let fit = fit(&rows);
        let summary = RegressionSummary::new(&fit, "y", &["x1", "x2"], 0.05).unwrap();
        assert_eq!(summary.n_observations, 3);
        let names = summary
            .coefficients
            .iter()
            .map(|row| row.name.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(names, ["const", "x1", "x2"]);

        let text = summary.to_string();
        assert!(text.contains("OLS Regression Results"));
        assert!(text.contains("No. Observations:"));
        assert!(text.lines().any(|line| line.starts_with("const ")));
        assert!(text.lines().any(|line| line.starts_with("x1 ")));
        assert!(text.lines().any(|line| line.starts_with("x2 ")));
        assert!(text.contains("nan"));
        assert!(text.contains("[0.025"));
        assert!(text.contains("0.975]"));
    }

    #[test]
    fn test_summary_values() {
        let rows = [
            Row(vec![1.21], 1.69),
            Row(vec![3.], 5.89),
            Row(vec![5.16], 4.11),
            Row(vec![8.31], 5.49),
            Row(vec![10.21], 8.65),
        ];
        let fit = fit(&rows);
        let summary = RegressionSummary::new(&fit, "y", &["x".to_string()], 0.1).unwrap();
        assert_eq!(summary.df_resid, 3);
        assert_eq!(summary.df_model, 1);
        assert_eq!(summary.coefficients.len(), 2);
        let slope = &summary.coefficients[1];
        assert!(slope.conf_lower < slope.coef && slope.coef < slope.conf_upper);
        assert!(summary.to_string().contains("[0.050"));
    }

    #[test]
    fn test_invalid_inputs() {
        let rows = [
            Row(vec![1.], 1.),
            Row(vec![2.], 3.),
            Row(vec![3.], 2.),
        ];
        let fit = fit(&rows);
        assert!(matches!(
            RegressionSummary::new(&fit, "y", &["x1", "x2"], 0.05),
            Err(SummaryError::NumNamesNumParamsMismatched {
                names: 2,
                params: 2
            })
        ));
        assert!(matches!(
            RegressionSummary::new(&fit, "y", &["x1"], 1.5),
            Err(SummaryError::InvalidAlpha(_))
        ));
    }

    #[test]
    fn test_num() {
        assert_eq!(num(f64::NAN, 3), "nan");
        assert_eq!(num(f64::NEG_INFINITY, 3), "-inf");
        assert_eq!(num(1.23456, 2), "1.23");
        assert_eq!(sci(0.000123), "1.23e-4");
    }
}
