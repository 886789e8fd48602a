/// Middleware for the API server
///
/// Authentication is a `from_fn_with_state` layer in [`crate::app`]; this
/// module holds the tower layers.

pub mod security;
