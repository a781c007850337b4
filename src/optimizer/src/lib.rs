pub mod optimizer;

pub use crate::optimizer::Optimizer;
