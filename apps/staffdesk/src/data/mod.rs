//! Data access: the facade every screen goes through, dashboard aggregates,
//! and the HTTP handlers exposing both.

pub mod dashboard;
pub mod facade;
pub mod handlers;

pub use facade::{DataError, DataFacade, Routing};
