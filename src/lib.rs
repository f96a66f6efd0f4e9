//! assignbot: Telegram bot for university sections (registration, assignments, deadline
//! notifications) with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
