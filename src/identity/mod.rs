// Identity module - ethr addresses, DIDs and seed phrases

mod address;
mod did;
mod seed;

pub use address::*;
pub use did::*;
pub use seed::*;
