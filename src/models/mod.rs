pub mod user;
pub mod user_input;

pub use user::{NewUser, UserRecord};
pub use user_input::{ProfileUpdateResponse, UpdateProfileInput};
