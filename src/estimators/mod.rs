#[cfg(test)]
mod tests;

#[allow(clippy::module_inception)]
pub mod estimators;
pub mod error;
pub mod hyperparams;
pub mod param_guard;
pub mod traits;
