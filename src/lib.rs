//! Discography normalization library - shared modules for the loader binary.

pub mod dimensions;
pub mod facts;
pub mod list_decoder;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod safety;
pub mod schema;
pub mod source;
