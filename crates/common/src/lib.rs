//! Common types shared by the Graph mail relay crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
