use std::path::{Path, PathBuf};

use log::debug;
use ols::statistics::lin_regr::Sample;
use polars::prelude::*;
use strict_num::FiniteF64;
use thiserror::Error;

/// A CSV file held in memory, header row as column names.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
}
impl Dataset {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|source| LoadError {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(
            "read {} rows x {} columns from {}",
            frame.height(),
            frame.width(),
            path.display()
        );
        Ok(Self { frame })
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.get_column_index(name).is_some()
    }

    /// Stops at the first name that is not a column.
    pub fn validate_columns<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), MissingColumnError> {
        for name in names {
            if !self.has_column(name) {
                return Err(MissingColumnError {
                    column: name.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn numeric_column(&self, name: &str) -> Result<Vec<FiniteF64>, ColumnError> {
        let series = self.frame.column(name).map_err(|_| MissingColumnError {
            column: name.to_string(),
        })?;
        let values = series
            .strict_cast(&DataType::Float64)
            .map_err(|source| ColumnError::NotNumeric {
                column: name.to_string(),
                source,
            })?;
        let values = values.f64().map_err(|source| ColumnError::NotNumeric {
            column: name.to_string(),
            source,
        })?;

        let mut column = Vec::with_capacity(values.len());
        for (row, value) in values.into_iter().enumerate() {
            let value = value.ok_or_else(|| ColumnError::Null {
                column: name.to_string(),
                row,
            })?;
            let value = FiniteF64::new(value).ok_or_else(|| ColumnError::NonFinite {
                column: name.to_string(),
                row,
            })?;
            column.push(value);
        }
        Ok(column)
    }

    /// Projects every row onto the response and the predictors, in the given order.
    pub fn observations(
        &self,
        dependent: &str,
        independents: &[impl AsRef<str>],
    ) -> Result<Vec<Observation>, ColumnError> {
        let responses = self.numeric_column(dependent)?;
        let predictors = independents
            .iter()
            .map(|name| self.numeric_column(name.as_ref()))
            .collect::<Result<Vec<Vec<FiniteF64>>, ColumnError>>()?;

        let observations = responses
            .into_iter()
            .enumerate()
            .map(|(row, response)| Observation {
                predictors: predictors.iter().map(|column| column[row]).collect(),
                response,
            })
            .collect::<Vec<Observation>>();
        Ok(observations)
    }
}

#[derive(Debug, Error)]
#[error("failed to load `{}`: {source}", .path.display())]
pub struct LoadError {
    pub path: PathBuf,
    pub source: PolarsError,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("column '{column}' not found in the data")]
pub struct MissingColumnError {
    pub column: String,
}

#[derive(Debug, Error)]
pub enum ColumnError {
    #[error("{0}")]
    Missing(#[from] MissingColumnError),
    #[error("column '{column}' is not numeric: {source}")]
    NotNumeric { column: String, source: PolarsError },
    #[error("column '{column}' has a missing value at row {row}")]
    Null { column: String, row: usize },
    #[error("column '{column}' has a non-finite value at row {row}")]
    NonFinite { column: String, row: usize },
}

/// One row restricted to the requested variables.
#[derive(Debug, Clone)]
pub struct Observation {
    predictors: Vec<FiniteF64>,
    response: FiniteF64,
}
impl Sample for &Observation {
    fn predictors(&self) -> impl Iterator<Item = FiniteF64> + Clone {
        self.predictors.iter().copied()
    }

    fn response(&self) -> FiniteF64 {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load() {
        let file = csv("y,x1,x2\n1,1,2\n2,2,3\n3,3,5\n");
        let dataset = Dataset::load(file.path()).unwrap();
        assert_eq!(dataset.height(), 3);
        assert!(dataset.has_column("x1"));
        assert!(!dataset.has_column("X1"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        let err = Dataset::load(&path).unwrap_err();
        assert_eq!(err.path, path);
        assert!(err.to_string().contains("absent.csv"));
    }

    #[test]
    fn test_validate_columns_first_missing_wins() {
        let file = csv("y,x1,x2\n1,1,2\n2,2,3\n3,3,5\n");
        let dataset = Dataset::load(file.path()).unwrap();
        assert!(dataset.validate_columns(["y", "x1", "x2"]).is_ok());

        let err = dataset.validate_columns(["y", "x3", "x4"]).unwrap_err();
        assert_eq!(err.column, "x3");
        assert_eq!(err.to_string(), "column 'x3' not found in the data");
    }

    #[test]
    fn test_observations() {
        let file = csv("y,x1,x2\n1,1,2\n2,2,3\n3,3,5\n");
        let dataset = Dataset::load(file.path()).unwrap();
        let observations = dataset.observations("y", &["x2", "x1"]).unwrap();
        assert_eq!(observations.len(), 3);
        let last = &observations[2];
        let predictors = last.predictors().map(|x| x.get()).collect::<Vec<f64>>();
        assert_eq!(predictors, [5., 3.]);
        assert_eq!(last.response().get(), 3.);
    }

    #[test]
    fn test_column_errors() {
        let file = csv("y,x,label\n1,1,a\n2,,b\n3,3,c\n");
        let dataset = Dataset::load(file.path()).unwrap();

        let err = dataset.numeric_column("label").unwrap_err();
        assert!(matches!(err, ColumnError::NotNumeric { ref column, .. } if column == "label"));

        let err = dataset.numeric_column("x").unwrap_err();
        assert!(matches!(err, ColumnError::Null { ref column, row: 1 } if column == "x"));

        let err = dataset.numeric_column("z").unwrap_err();
        assert!(matches!(err, ColumnError::Missing(_)));
    }
}
