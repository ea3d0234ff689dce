//! Data models for the canvass backend.
//!
//! Field names follow the table columns so the JSON matches what the web client reads.

mod campaign;
mod contact;
mod report;
mod settings;
mod user;
pub mod validation;

pub use campaign::*;
pub use contact::*;
pub use report::*;
pub use settings::*;
pub use user::*;
pub use validation::Validate;
