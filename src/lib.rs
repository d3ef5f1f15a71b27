pub mod account;
pub mod cache;
pub mod effects;
pub mod filters;
pub mod image_processing;
pub mod keys;
pub mod mcp_server;
pub mod pdf_ops;
pub mod providers;
pub mod tools;
pub mod web_pages;
