pub mod traits;

pub use traits::{OnActivate, OnDeactivate, Service};
