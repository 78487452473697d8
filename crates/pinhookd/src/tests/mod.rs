//! Test suites for the pinhook engines.

pub(crate) mod support;
