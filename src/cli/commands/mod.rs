//! CLI command implementations

pub mod config;
pub mod key;
pub mod pack;
pub mod restore;
pub mod unpack;

pub use config::execute as config;
pub use key::execute as key;
pub use pack::execute as pack;
pub use restore::execute as restore;
pub use unpack::execute as unpack;
