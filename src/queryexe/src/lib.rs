pub use crate::query::{Executor, TranslateAndValidate};

pub mod opiterator;
pub mod query;
