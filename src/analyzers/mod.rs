//! Reports over the cleaned ride dataset.
//!
//! This module counts and averages the cleaned columns, builds one chart and
//! one insight per report, and assembles the end-of-run digest.

pub mod aggregate;
pub mod analyzer;
pub mod grade;
pub mod types;
pub mod utility;
