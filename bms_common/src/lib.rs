mod email;
mod helpers;
mod secret;

pub use email::{EmailAddress, EmailAddressError};
pub use helpers::parse_boolean_flag;
pub use secret::Secret;
