use std::io;

use clap::Parser;
use lin_regr::{LinRegrArgs, LinRegrError};

pub mod dataset;
pub mod lin_regr;

/// Perform linear regression on a dataset.
#[derive(Debug, Clone, Parser)]
#[command(name = "ols")]
pub struct Cli {
    #[clap(flatten)]
    pub lin_regr: LinRegrArgs,
}
impl Cli {
    pub fn run(self) -> Result<(), LinRegrError> {
        let mut stdout = io::stdout().lock();
        self.lin_regr.run(&mut stdout)
    }
}
