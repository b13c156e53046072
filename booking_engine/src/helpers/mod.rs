mod passwords;

pub use passwords::{hash_password, verify_password, PasswordHashError};
