pub mod catalog;
pub mod classify;
pub mod config;
pub mod crawler;
pub mod domain;
pub mod error;
pub mod layout;
pub mod listing;
pub mod output;
pub mod store;
