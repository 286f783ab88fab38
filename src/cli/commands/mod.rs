//! CLI command implementations

pub mod ci;
pub mod clean;
pub mod rebuild;
pub mod run;
pub mod shell;
pub mod volumes;

pub use ci::execute as ci;
pub use clean::execute as clean;
pub use rebuild::execute as rebuild;
pub use run::execute as run;
pub use shell::execute as shell;
pub use volumes::execute as volumes;
