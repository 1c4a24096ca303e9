//! Domain entities - the core business objects.

mod user;

mod post;

pub use post::{MAX_LIKES, Post, PostUpdate};
pub use user::{MIN_PASSWORD_LEN, User};
