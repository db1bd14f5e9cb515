use thiserror::Error;

pub mod lin_regr;
pub mod mean;
pub mod normality;
pub mod summary;
pub mod variance;

#[derive(Debug, Error, Clone, Copy)]
#[error("Empty sequence")]
pub struct EmptySequenceError;
