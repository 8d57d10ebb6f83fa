pub mod jwt;
pub mod password;

pub use jwt::{Claims, TokenService};
pub use password::PasswordHasher;
