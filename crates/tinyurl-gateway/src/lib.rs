//! HTTP gateway for the tinyurl shortener.
//!
//! Exposes the three shortener operations over REST:
//!
//! | Route | Operation |
//! |---|---|
//! | `POST /api/shorten` | shorten |
//! | `GET /api/info?shortLink=<code>` | short link info |
//! | `GET /{code}` | redirect to the original URL |

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;
pub mod telemetry;

pub use app::App;
pub use state::AppState;
