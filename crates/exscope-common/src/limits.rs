//! Centralized limits and thresholds for the scope engine.
//!
//! These bound the recursive walks over statement/expression trees and the
//! iterative walks over the region tree, so a malformed or hostile input
//! fails with an internal error instead of overflowing the stack or
//! spinning forever.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum statement nesting depth accepted by lowering and by the scope
/// tree builder.
///
/// Each nested statement adds a frame to the recursive walks. Lowering
/// rejects deeper bodies with `TreeError::StatementsTooDeep`; the builder's
/// configurable limit defaults to this value and fails with
/// `ScopeError::NestingTooDeep`.
///
/// ```text
/// if (a) if (b) if (c) /* ... 1000 levels ... */ f(out var x);
/// ```
pub const MAX_STATEMENT_NESTING_DEPTH: u32 = 1_000;

/// Maximum expression nesting depth, sub-patterns included.
///
/// Lowering rejects deeper expressions with `TreeError::ExpressionsTooDeep`.
/// The declaration collector stops descending at the same depth when it is
/// handed an arena built by other means.
pub const MAX_EXPRESSION_DEPTH: u32 = 2_000;

// =============================================================================
// Operation Count Limits
// =============================================================================

/// Maximum number of parent hops when walking up the region tree.
///
/// Region trees are acyclic by construction; the cap only protects queries
/// against a corrupted tree.
pub const MAX_SCOPE_WALK_ITERATIONS: usize = 10_000;

/// Maximum number of parent hops when walking up the statement tree.
pub const MAX_TREE_WALK_ITERATIONS: usize = 10_000;

// =============================================================================
// Diagnostic Policy Defaults
// =============================================================================

/// Default bleed depth at which the opt-in nested-bleed lint fires when it is
/// enabled without an explicit threshold.
///
/// A depth of two means the declaring statement sits at least two unbraced
/// nested bodies below the boundary that owns the declaration:
///
/// ```text
/// if (a) if (b) if (x is int i) { }   // `i` has bleed depth 2
/// ```
pub const DEFAULT_NESTED_BLEED_THRESHOLD: u32 = 2;
