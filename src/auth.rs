//! Credential models: redacted secrets, the access/refresh pair, and local expiry decoding.

pub mod token;

pub use token::{claims::*, pair::*, secret::*};
