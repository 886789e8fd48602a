/// API route handlers, organized by resource
///
/// - `health`: Health check
/// - `auth`: Sign up, sign in, refresh, sign out, session, auth events
/// - `items`: Inventory CRUD and search
/// - `loans`: Borrow, return, recent and active loans
/// - `dashboard`: Combined dashboard data
/// - `users`: Role assignment

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod items;
pub mod loans;
pub mod users;
