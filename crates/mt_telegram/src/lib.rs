pub mod api;
pub mod client;
pub mod poller;
pub mod session;

pub use client::TelegramClient;
pub use poller::Poller;
pub use session::{Session, SessionStore};
