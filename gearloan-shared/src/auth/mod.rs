/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: Session-bound JWT access and refresh tokens
/// - [`middleware`]: Resolving a bearer token into an [`middleware::AuthContext`]
/// - [`authorization`]: Role checks (student / staff / admin)
/// - [`events`]: Auth-state change bus (signed in, signed out, token refreshed)
///
/// # Example
///
/// ```
/// use gearloan_shared::auth::password::{hash_password, verify_password};
/// use gearloan_shared::auth::jwt::{create_token, validate_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// let hash = hash_password("Borrow2day").unwrap();
/// assert!(verify_password("Borrow2day", &hash).unwrap());
///
/// let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), TokenType::Access);
/// let token = create_token(&claims, "a-secret-key-that-is-at-least-32-bytes").unwrap();
/// assert!(validate_token(&token, "a-secret-key-that-is-at-least-32-bytes").is_ok());
/// ```

pub mod authorization;
pub mod events;
pub mod jwt;
pub mod middleware;
pub mod password;
