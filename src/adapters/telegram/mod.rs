pub mod bot_api;
pub mod keyboards;
pub mod mapper;
pub mod types;

pub use bot_api::BotApiClient;
