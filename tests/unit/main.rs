//! Unit test harness for tripteron-motion.
//!
//! This module organizes unit tests for each component of the library.

mod config_parsing;
mod config_validation;
mod priority_policy;
mod pulse_source;
