use crate::{error::ApiError, model::role::Role};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

/// Caller identity placed in request extensions by the bearer middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<AuthUser>().cloned();

        ready(user.ok_or_else(|| {
            actix_web::Error::from(ApiError::Unauthorized(
                "Missing Authorization header".to_string(),
            ))
        }))
    }
}

pub const HR_ROLES: &[Role] = &[Role::Admin, Role::Hr];
pub const ACCOUNTS_ROLES: &[Role] = &[Role::Admin, Role::Accounts];
pub const PAYROLL_VIEW_ROLES: &[Role] = &[Role::Admin, Role::Hr, Role::Accounts];

impl AuthUser {
    pub fn has_any(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }

    pub fn require_any(&self, roles: &[Role]) -> Result<(), ApiError> {
        if self.has_any(roles) {
            Ok(())
        } else {
            let names: Vec<&str> = roles.iter().map(|r| r.as_ref()).collect();
            Err(ApiError::forbidden(format!("Allowed roles: {}", names.join(", "))))
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin only"))
        }
    }

    pub fn require_hr_or_admin(&self) -> Result<(), ApiError> {
        if self.has_any(HR_ROLES) {
            Ok(())
        } else {
            Err(ApiError::forbidden("HR/Admin only"))
        }
    }

    pub fn require_accounts_or_admin(&self) -> Result<(), ApiError> {
        if self.has_any(ACCOUNTS_ROLES) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Accounts/Admin only"))
        }
    }

    /// Returns the caller's employee id or 403 when the user has no profile.
    pub fn employee(&self) -> Result<u64, ApiError> {
        self.employee_id
            .ok_or_else(|| ApiError::forbidden("No employee profile"))
    }

    /// Resolves which employee a list query may cover.
    ///
    /// Privileged roles get whatever they asked for (`None` means everyone);
    /// anyone else is pinned to their own employee id.
    pub fn scoped_employee(
        &self,
        privileged: &[Role],
        requested: Option<u64>,
    ) -> Result<Option<u64>, ApiError> {
        if self.has_any(privileged) {
            return Ok(requested);
        }

        let own = self.employee()?;
        match requested {
            Some(other) if other != own => {
                Err(ApiError::forbidden("You can only access your own records"))
            }
            _ => Ok(Some(own)),
        }
    }

    /// Allows the record owner or any of the privileged roles.
    pub fn require_owner_or(&self, privileged: &[Role], owner: u64) -> Result<(), ApiError> {
        if self.has_any(privileged) || self.employee_id == Some(owner) {
            Ok(())
        } else {
            Err(ApiError::forbidden("You can only access your own records"))
        }
    }

    /// Picks the employee a new record is filed for: privileged roles may
    /// file on behalf of someone else.
    pub fn filing_for(&self, privileged: &[Role], requested: Option<u64>) -> Result<u64, ApiError> {
        match requested {
            Some(id) if self.has_any(privileged) => Ok(id),
            Some(id) if self.employee_id == Some(id) => Ok(id),
            Some(_) => Err(ApiError::forbidden(
                "You can only file records for yourself",
            )),
            None => self.employee(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "tester".to_string(),
            role,
            employee_id,
        }
    }

    #[test]
    fn employees_are_pinned_to_themselves() {
        let emp = user(Role::Employee, Some(10));
        assert_eq!(emp.scoped_employee(HR_ROLES, None).unwrap(), Some(10));
        assert_eq!(emp.scoped_employee(HR_ROLES, Some(10)).unwrap(), Some(10));
        assert!(emp.scoped_employee(HR_ROLES, Some(11)).is_err());

        let hr = user(Role::Hr, None);
        assert_eq!(hr.scoped_employee(HR_ROLES, None).unwrap(), None);
        assert_eq!(hr.scoped_employee(HR_ROLES, Some(11)).unwrap(), Some(11));
    }

    #[test]
    fn user_without_profile_is_forbidden() {
        let accounts = user(Role::Accounts, None);
        assert!(accounts.scoped_employee(HR_ROLES, None).is_err());
        assert!(accounts.employee().is_err());
    }

    #[test]
    fn filing_on_behalf_needs_privilege() {
        let emp = user(Role::Employee, Some(10));
        assert_eq!(emp.filing_for(HR_ROLES, None).unwrap(), 10);
        assert!(emp.filing_for(HR_ROLES, Some(12)).is_err());

        let admin = user(Role::Admin, None);
        assert_eq!(admin.filing_for(HR_ROLES, Some(12)).unwrap(), 12);
        assert!(admin.filing_for(HR_ROLES, None).is_err());
    }

    #[test]
    fn role_guards() {
        assert!(user(Role::Admin, None).require_accounts_or_admin().is_ok());
        assert!(user(Role::Hr, None).require_accounts_or_admin().is_err());
        assert!(user(Role::Lead, None).require_hr_or_admin().is_err());
        assert!(user(Role::Hr, None).require_admin().is_err());
        assert!(
            user(Role::Employee, Some(3))
                .require_owner_or(HR_ROLES, 3)
                .is_ok()
        );
        assert!(
            user(Role::Employee, Some(3))
                .require_owner_or(HR_ROLES, 4)
                .is_err()
        );
    }
}
