//! End-to-end tests against the public tree API.
//!
//! Each test file covers a specific scenario, using deterministic inputs
//! and checking the structural invariants after every mutation phase.

#![cfg(test)]

mod helpers;

mod test_boundary_queries;
mod test_bulk_build;
mod test_fail_fast;
mod test_idempotent_put;
mod test_ordering;
mod test_page_splits;
mod test_partial_match;
mod test_randomized;
mod test_snapshot;
mod test_views;
