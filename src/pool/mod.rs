pub mod address_pool;
pub mod address_set;

pub use address_pool::{AddressEntry, AddressPool};
pub use address_set::AddressSet;
