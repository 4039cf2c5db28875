pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod listing;
pub mod message_broker;
pub mod notify;
pub mod payment;
pub mod profile;
pub mod query;
pub mod service;
pub mod store;
