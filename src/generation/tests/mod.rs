//! Unit tests for the generation context.

mod domain_tests;
mod normalizer_tests;
