mod health;
mod link;

pub use health::health_handler;
pub use link::{create_short_link_handler, redirect_handler, short_link_info_handler};
