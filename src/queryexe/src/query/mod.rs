pub use executor::Executor;
pub use translate_and_validate::TranslateAndValidate;
mod executor;
pub mod explain;
mod mapper;
mod translate_and_validate;
