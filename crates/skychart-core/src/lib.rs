pub mod analysis;
pub mod birth_data;
pub mod config_manager;
pub mod error;

pub use analysis::*;
pub use birth_data::*;
pub use config_manager::*;
pub use error::*;
