//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a subsystem against the
//! simulated 1-Wire bus in `mock_bus`.  All tests run on the host with no
//! real hardware required.

mod mock_bus;
mod publisher_tests;
mod service_tests;
