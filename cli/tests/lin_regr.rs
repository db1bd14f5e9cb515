use std::{io::Write, path::PathBuf};

use ols::statistics::lin_regr::OlsError;
use ols_cli::{
    dataset::ColumnError,
    lin_regr::{Format, LinRegrArgs, LinRegrError},
};

const SCENARIO: &str = "y,x1,x2\n1,1,2\n2,2,3\n3,3,5\n";

fn csv(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn args(input: PathBuf, y: &str, x: &[&str]) -> LinRegrArgs {
    LinRegrArgs {
        input,
        y: y.to_string(),
        x: x.iter().map(|x| x.to_string()).collect(),
        alpha: 0.05,
        format: Format::Text,
    }
}

fn run(args: LinRegrArgs) -> Result<String, LinRegrError> {
    let mut out = vec![];
    args.run(&mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn scenario_prints_all_coefficients() {
    let file = csv(SCENARIO);
    let out = run(args(file.path().to_path_buf(), "y", &["x1", "x2"])).unwrap();
    for name in ["const", "x1", "x2"] {
        assert!(
            out.lines().any(|line| line.starts_with(&format!("{name} "))),
            "no row for {name} in\n{out}"
        );
    }
    assert!(out.contains("Dep. Variable:"));
    assert!(out.contains("R-squared:"));
    assert!(out.contains("F-statistic:"));
    let observations = out
        .lines()
        .find(|line| line.starts_with("No. Observations:"))
        .unwrap();
    assert_eq!(observations.split_whitespace().nth(2), Some("3"));
}

#[test]
fn observations_match_row_count() {
    let file = csv("y,x\n1.5,1\n2.1,2\n2.9,3\n4.2,4\n5.1,5\n5.8,6\n");
    let summary = args(file.path().to_path_buf(), "y", &["x"])
        .summarize()
        .unwrap();
    assert_eq!(summary.n_observations, 6);
    assert_eq!(summary.coefficients.len(), 2);
    assert_eq!(summary.coefficients[0].name, "const");
    assert!(summary.r_squared > 0.9);
}

#[test]
fn missing_independent_column() {
    let file = csv(SCENARIO);
    let err = run(args(file.path().to_path_buf(), "y", &["x3"])).unwrap_err();
    let LinRegrError::MissingColumn(missing) = &err else {
        panic!("unexpected error {err:?}");
    };
    assert_eq!(missing.column, "x3");
    assert!(err.to_string().contains("x3"));
}

#[test]
fn missing_dependent_column_reported_first() {
    let file = csv(SCENARIO);
    let err = run(args(file.path().to_path_buf(), "z", &["w", "x1"])).unwrap_err();
    let LinRegrError::MissingColumn(missing) = &err else {
        panic!("unexpected error {err:?}");
    };
    assert_eq!(missing.column, "z");
}

#[test]
fn column_names_are_case_sensitive() {
    let file = csv(SCENARIO);
    let err = run(args(file.path().to_path_buf(), "Y", &["x1"])).unwrap_err();
    assert!(matches!(err, LinRegrError::MissingColumn(_)));
}

#[test]
fn missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(args(dir.path().join("nope.csv"), "y", &["x3"])).unwrap_err();
    assert!(matches!(err, LinRegrError::Load(_)));
}

#[test]
fn collinear_predictors_fail_to_fit() {
    let file = csv("y,a,b\n1,1,2\n3,2,4\n2,3,6\n5,4,8\n");
    let err = run(args(file.path().to_path_buf(), "y", &["a", "b"])).unwrap_err();
    assert!(matches!(err, LinRegrError::Fit(OlsError::SingularDesign)));
    assert!(err.to_string().starts_with("regression failed"));
}

#[test]
fn too_few_rows_fail_to_fit() {
    let file = csv("y,a,b\n1,1,2\n3,2,5\n");
    let err = run(args(file.path().to_path_buf(), "y", &["a", "b"])).unwrap_err();
    assert!(matches!(
        err,
        LinRegrError::Fit(OlsError::TooFewExamples { rows: 2, cols: 3 })
    ));
}

#[test]
fn text_column_is_rejected() {
    let file = csv("y,x,label\n1,1,a\n2,2,b\n3,4,c\n");
    let err = run(args(file.path().to_path_buf(), "y", &["label"])).unwrap_err();
    assert!(matches!(
        err,
        LinRegrError::Column(ColumnError::NotNumeric { .. })
    ));
}

#[test]
fn json_format() {
    let file = csv(SCENARIO);
    let mut args = args(file.path().to_path_buf(), "y", &["x1", "x2"]);
    args.format = Format::Json;
    let out = run(args).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["n_observations"], 3);
    assert_eq!(value["dependent"], "y");
    let names = value["coefficients"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["name"].as_str().unwrap().to_string())
        .collect::<Vec<String>>();
    assert_eq!(names, ["const", "x1", "x2"]);
}

#[test]
fn repeated_runs_are_identical() {
    let file = csv("y,x1,x2\n1.3,0.2,7\n2.9,1.1,3\n3.2,2.5,5\n4.8,2.9,1\n5.5,4.4,2\n");
    let first = run(args(file.path().to_path_buf(), "y", &["x1", "x2"])).unwrap();
    let second = run(args(file.path().to_path_buf(), "y", &["x1", "x2"])).unwrap();
    assert_eq!(first, second);
}

#[test]
fn decimals_after_the_first_hundred_rows_are_read() {
    let mut content = "y,x\n".to_string();
    for i in 0..150 {
        let noise = (i % 3) as f64 - 1.;
        if i < 120 {
            content.push_str(&format!("{},{}\n", 2 * i + 1 + (i % 3) - 1, i));
        } else {
            let x = i as f64 + 0.5;
            content.push_str(&format!("{},{x:.1}\n", 2. * x + 1. + noise));
        }
    }
    let file = csv(&content);
    let summary = args(file.path().to_path_buf(), "y", &["x"])
        .summarize()
        .unwrap();
    assert_eq!(summary.n_observations, 150);
    assert!((summary.coefficients[1].coef - 2.).abs() < 0.01);
    assert!(summary.r_squared > 0.99);
}
