/// Role checks
///
/// The caller's role is resolved once by the auth middleware and carried in
/// [`AuthContext`], so these checks are synchronous.
///
/// | Check | Allowed roles |
/// |---|---|
/// | [`require_borrower`] | student |
/// | [`require_staff`] | staff, admin |
/// | [`require_admin`] | admin |

use super::middleware::AuthContext;

/// Authorization errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("Only students can borrow equipment")]
    NotBorrower,

    #[error("Staff role required")]
    NotStaff,

    #[error("Admin role required")]
    NotAdmin,
}

pub fn require_borrower(auth: &AuthContext) -> Result<(), AuthzError> {
    if !auth.role.can_borrow() {
        return Err(AuthzError::NotBorrower);
    }
    Ok(())
}

pub fn require_staff(auth: &AuthContext) -> Result<(), AuthzError> {
    if !auth.role.is_staff() {
        return Err(AuthzError::NotStaff);
    }
    Ok(())
}

pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if !auth.role.is_admin() {
        return Err(AuthzError::NotAdmin);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user_role::Role;
    use uuid::Uuid;

    fn ctx(role: Role) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn test_student_permissions() {
        let student = ctx(Role::Student);
        assert!(require_borrower(&student).is_ok());
        assert_eq!(require_staff(&student), Err(AuthzError::NotStaff));
        assert_eq!(require_admin(&student), Err(AuthzError::NotAdmin));
    }

    #[test]
    fn test_staff_permissions() {
        let staff = ctx(Role::Staff);
        assert_eq!(require_borrower(&staff), Err(AuthzError::NotBorrower));
        assert!(require_staff(&staff).is_ok());
        assert_eq!(require_admin(&staff), Err(AuthzError::NotAdmin));
    }

    #[test]
    fn test_admin_permissions() {
        let admin = ctx(Role::Admin);
        assert_eq!(require_borrower(&admin), Err(AuthzError::NotBorrower));
        assert!(require_staff(&admin).is_ok());
        assert!(require_admin(&admin).is_ok());
    }
}
