mod donation;
mod donation_event;
mod user;

pub use donation::*;
pub use donation_event::*;
pub use user::*;
