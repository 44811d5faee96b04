//! Unit tests for notification classification, reassembly and framing.
//!
//! Tests are split into focused submodules to keep each file short and easy
//! to navigate.

mod classifier_tests;
