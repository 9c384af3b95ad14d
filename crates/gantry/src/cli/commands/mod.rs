//! CLI commands

mod calculate;
mod version;

pub use calculate::CalculateCommand;
pub use version::VersionCommand;
