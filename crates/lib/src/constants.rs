//! # Shared Constants
//!
//! This module provides a centralized location for the tunable values of the
//! chart generation pipeline. Using these constants helps to avoid "magic
//! numbers" and keeps the inference and polling behavior in one place.

use std::time::Duration;

/// Fraction of sampled values that must parse as numbers for a column to be
/// classified as numeric.
pub const NUMERIC_RATIO_THRESHOLD: f64 = 0.8;

/// Maximum unique-to-total ratio for a string column to be classified as a
/// category rather than free text.
pub const CATEGORY_UNIQUE_RATIO: f64 = 0.3;

/// Maximum number of chart candidates kept per user prompt.
pub const MAX_CHARTS_PER_PROMPT: usize = 4;

/// Number of sampled rows inspected when profiling a column.
pub const PROFILE_SAMPLE_ROWS: usize = 5;

/// Number of sample values retained per column in the finished profile.
pub const PROFILE_SAMPLES_PER_COLUMN: usize = 3;

/// Row limit for the sampling query issued before profiling.
pub const SAMPLE_QUERY_LIMIT: u64 = 100;

/// Maximum number of columns selected by the sampling query.
pub const SAMPLE_QUERY_MAX_COLUMNS: usize = 20;

/// Number of column names listed per type group in the profile summary
/// before the remainder is elided.
pub const SUMMARY_NAME_LIMIT: usize = 3;

/// Delay between successive polls of an asynchronous backend job.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Maximum number of polls for a query job before giving up.
pub const MAX_POLL_ATTEMPTS: u32 = 60;

/// Maximum number of polls for a schema job before giving up.
pub const SCHEMA_POLL_ATTEMPTS: u32 = 30;

/// Row limit applied to every rule-built fallback query.
pub const FALLBACK_QUERY_LIMIT: u64 = 20;

/// Colors cycled across datasets when reshaping results for rendering.
pub const CHART_PALETTE: [&str; 8] = [
    "#BCFF3C", "#3CBCFF", "#FF3CBC", "#FFBC3C", "#3CFFBC", "#BC3CFF", "#FF6B6B", "#6BFFB8",
];
