//! Command-line front end for the `gizmo` agent editor automation.

pub mod cli;
pub mod error;
pub mod logging;
pub mod output;
pub mod prompt;
pub mod run;
pub mod settings;
