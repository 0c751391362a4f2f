pub mod api;
pub mod discord;
pub mod events;
