//! Session token models.

pub mod secret;
pub mod tokens;

pub use secret::*;
pub use tokens::*;
