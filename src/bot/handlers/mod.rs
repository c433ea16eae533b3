//! Discord interaction handlers (autocomplete, cancel buttons).

/// Autocomplete suggestions for command parameters
pub mod autocomplete;
/// Cancel-button handling on posted records
pub mod component;

pub use component::handle_event;
