//! Auth-domain models: the requested scope and the bearer tokens issued for it.

pub mod scope;
pub mod token;

pub use scope::*;
pub use token::{secret::*, *};
