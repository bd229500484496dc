//! Property-based tests for the message filters.
