//! Test suites for the input poller.

mod support;
