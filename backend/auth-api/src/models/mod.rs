pub mod failed_attempt;
pub mod session;
pub mod user;

pub use failed_attempt::FailedAttempt;
pub use session::Session;
pub use user::{Credentials, NewUser, RegisterUser, User, UserProfile};
