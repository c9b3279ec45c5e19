pub mod config;
pub mod logging;

// Pipeline stages, leaf-first.
pub mod url_model;
pub mod redirect;
pub mod enrich;
pub mod store;
pub mod collect;
pub mod pipeline;
