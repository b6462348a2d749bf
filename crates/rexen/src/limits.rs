//! Centralized engine limits and tuning constants.
//!
//! All magic numbers that bound compilation and evaluation live here
//! so they can be tuned in one place.

// ===== Backtracking budget =====

/// Continuation attempts granted per quantified node under the `s` flag.
pub const TIGHT_STEPS: usize = 1;

/// Continuation attempts granted per quantified node when neither `s`
/// nor `S` is given.
pub const DEFAULT_STEPS: usize = 6;

/// Budget handed to the outermost evaluation and used under the `S` flag.
pub const UNBOUNDED_STEPS: usize = usize::MAX;

// ===== Compiler =====

/// Maximum nesting of groups, captures and negations in one pattern.
pub const MAX_NESTING: usize = 200;

/// Capture name holding the whole match. Patterns may not declare it.
pub const RESERVED_CAPTURE: &str = "complete";

// ===== Evaluator =====

/// Maximum recursion depth of one evaluation. Depth follows the pattern
/// structure, never the number of repetitions. Deeper attempts fail locally.
pub const MAX_MATCH_DEPTH: usize = 400;
