//! Prepared-statement parameters and the bound statement handle
//! (SPEC_FULL.md §4.5, §6).

pub mod datetime;
pub mod param;
pub mod statement;

pub use datetime::{Date, DateTime, Time};
pub use param::ParamValue;
pub use statement::Statement;
