pub mod estimate;
pub mod matrix;
pub mod statistics;
