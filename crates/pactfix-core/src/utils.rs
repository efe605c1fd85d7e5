//! Utility functions shared by matchers.

pub mod allowance;

#[doc(inline)]
pub use allowance::{check_allow_with_reason, AllowCheck};
