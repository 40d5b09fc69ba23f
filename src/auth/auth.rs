use crate::{error::ApiError, model::leave_request::LeaveStatus, model::role::Role, models::Claims};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::decode;
use jsonwebtoken::{DecodingKey, Validation};
use crate::config::Config;

pub struct AuthUser {
    pub user_id: u64,
    pub tenant_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ApiError::Unauthorized("Missing token".into()).into())),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    actix_web::error::ErrorInternalServerError("Config missing"),
                ))
            }
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ApiError::Unauthorized("Invalid token".into()).into())),
        };

        let role = match Role::from_id(data.claims.role) {
            Some(r) => r,
            None => return ready(Err(ApiError::Unauthorized("Invalid role".into()).into())),
        };

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            tenant_id: data.claims.tenant_id,
            username: data.claims.sub,
            role,
            employee_id: data.claims.employee_id,
        }))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin only"))
        }
    }

    pub fn require_manager_or_admin(&self) -> Result<(), ApiError> {
        if self.can_approve() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Manager/Admin only"))
        }
    }

    /// Approving or rejecting leave requests is a management capability.
    pub fn can_approve(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Manager)
    }

    /// A pending request may be cancelled by the employee who owns it (or an
    /// Admin); an approved request only by an Admin, which triggers a refund.
    pub fn can_cancel(&self, owner_employee_id: u64, status: LeaveStatus) -> bool {
        match status {
            LeaveStatus::Pending => {
                self.role == Role::Admin || self.employee_id == Some(owner_employee_id)
            }
            LeaveStatus::Approved => self.role == Role::Admin,
            _ => false,
        }
    }

    /// Returns true if the user is an employee
    pub fn is_employee(&self) -> bool {
        self.role == Role::Employee
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            tenant_id: 1,
            username: "t".into(),
            role,
            employee_id,
        }
    }

    #[test]
    fn managers_and_admins_approve() {
        assert!(user(Role::Admin, None).can_approve());
        assert!(user(Role::Manager, None).can_approve());
        assert!(!user(Role::Employee, Some(5)).can_approve());
    }

    #[test]
    fn owner_cancels_own_pending_request_only() {
        let owner = user(Role::Employee, Some(5));
        assert!(owner.can_cancel(5, LeaveStatus::Pending));
        assert!(!owner.can_cancel(6, LeaveStatus::Pending));
        assert!(!owner.can_cancel(5, LeaveStatus::Approved));
    }

    #[test]
    fn admin_cancels_approved_requests() {
        let admin = user(Role::Admin, None);
        assert!(admin.can_cancel(5, LeaveStatus::Pending));
        assert!(admin.can_cancel(5, LeaveStatus::Approved));
        assert!(!admin.can_cancel(5, LeaveStatus::Rejected));
    }

    #[test]
    fn managers_do_not_cancel_approved_requests() {
        let manager = user(Role::Manager, None);
        assert!(!manager.can_cancel(5, LeaveStatus::Approved));
    }
}
