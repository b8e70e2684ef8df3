//! Result presenter
//!
//! Pure rendering of the current query, loading flag and result sequence
//! into a `Screen`. Clients receive the screen as JSON; the `Display`
//! impl gives a plain-text rendering for terminals and logs.

mod view;

pub use view::{render, Screen};

#[cfg(test)]
pub use view::View;
