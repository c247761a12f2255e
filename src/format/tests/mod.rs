//! Unit tests for result records.
//!
//! These tests verify that records survive a save/load cycle unchanged and
//! that malformed or foreign files are rejected.
