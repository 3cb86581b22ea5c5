pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod pipeline;
pub mod render;
pub mod translate;
