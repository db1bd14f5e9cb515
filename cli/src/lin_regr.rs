use std::{io, path::PathBuf};

use clap::{Args, ValueEnum};
use log::{debug, info};
use ols::{
    estimate::EstimateExt,
    statistics::{
        lin_regr::{OlsError, OlsEstimator},
        summary::{RegressionSummary, SummaryError},
    },
};
use thiserror::Error;

use crate::dataset::{ColumnError, Dataset, LoadError, MissingColumnError};

#[derive(Debug, Clone, Args)]
pub struct LinRegrArgs {
    /// Path to the CSV file containing the data
    pub input: PathBuf,
    /// The dependent variable for the regression
    pub y: String,
    /// The independent variable(s) for the regression
    #[arg(required = true)]
    pub x: Vec<String>,
    /// Significance level of the coefficient confidence intervals
    #[arg(long, default_value_t = 0.05, value_parser = parse_alpha)]
    pub alpha: f64,
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}
impl LinRegrArgs {
    pub fn run(self, out: &mut impl io::Write) -> Result<(), LinRegrError> {
        let summary = self.summarize()?;
        match self.format {
            Format::Text => writeln!(out, "{summary}")?,
            Format::Json => {
                serde_json::to_writer_pretty(&mut *out, &summary)?;
                writeln!(out)?;
            }
        }
        Ok(())
    }

    /// Loads, validates and fits without writing anything.
    pub fn summarize(&self) -> Result<RegressionSummary, LinRegrError> {
        let dataset = Dataset::load(&self.input)?;
        info!(
            "loaded {} rows from {}",
            dataset.height(),
            self.input.display()
        );

        dataset.validate_columns(self.variables())?;
        let observations = dataset.observations(&self.y, &self.x)?;

        debug!("fitting {} on {:?}", self.y, self.x);
        let fit = observations.iter().fit(&OlsEstimator)?;
        info!(
            "fitted {} params on {} observations",
            fit.df_model() + 1,
            fit.n_observations()
        );

        let summary = RegressionSummary::new(&fit, &self.y, &self.x, self.alpha)?;
        Ok(summary)
    }

    /// The dependent variable first, then the independent variables.
    fn variables(&self) -> impl Iterator<Item = &str> {
        core::iter::once(self.y.as_str()).chain(self.x.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

fn parse_alpha(s: &str) -> Result<f64, String> {
    let alpha: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if !(0. < alpha && alpha < 1.) {
        return Err(format!("{alpha} is not in (0, 1)"));
    }
    Ok(alpha)
}

#[derive(Debug, Error)]
pub enum LinRegrError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    MissingColumn(#[from] MissingColumnError),
    #[error(transparent)]
    Column(#[from] ColumnError),
    #[error("regression failed: {0}")]
    Fit(#[from] OlsError),
    #[error(transparent)]
    Summary(#[from] SummaryError),
    #[error("failed to write the summary: {0}")]
    Io(#[from] io::Error),
    #[error("failed to write the summary: {0}")]
    Json(#[from] serde_json::Error),
}
