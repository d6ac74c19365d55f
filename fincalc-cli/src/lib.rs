//! Command-line front end for the fincalc engines.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod utils;
