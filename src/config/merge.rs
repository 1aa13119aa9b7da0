//! Merge rules: defaults, override order, conflict handling.

pub mod merge_policy;
