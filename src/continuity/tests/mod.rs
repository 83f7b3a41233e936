//! Unit tests for the continuity context.

mod tracker_tests;
