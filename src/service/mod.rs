// Service module - the identity facade

mod identity;

pub use identity::{IdentityError, IdentityList, IdentityService};
