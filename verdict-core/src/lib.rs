pub mod config;
pub mod error;
pub mod error_utils;
pub mod filter;
pub mod harvest;
pub mod phrases;
pub mod types;
pub mod verdict;

pub use config::*;
pub use error::*;
pub use error_utils::*;
pub use filter::*;
pub use harvest::*;
pub use phrases::*;
pub use types::*;
pub use verdict::*;
