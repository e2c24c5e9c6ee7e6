pub mod config;
pub mod findings;
pub mod intake;

pub use config::Config;
pub use findings::*;
pub use intake::*;
