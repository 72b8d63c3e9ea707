//! Bearer credential building blocks.

pub mod claims;
pub mod pair;
pub mod secret;
