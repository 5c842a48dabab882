use crate::config::Config;
use crate::{model::role::Role, models::Claims};
use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::decode;
use jsonwebtoken::{DecodingKey, Validation};

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
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        let role = match Role::from_id(data.claims.role) {
            Some(r) => r,
            None => return ready(Err(ErrorUnauthorized("Invalid role"))),
        };

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            username: data.claims.sub,
            role,
            employee_id: data.claims.employee_id,
        }))
    }
}

impl AuthUser {
    pub fn require_superadmin(&self) -> actix_web::Result<()> {
        if self.role == Role::Superadmin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Superadmin only"))
        }
    }

    pub fn require_admin(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Superadmin | Role::Admin) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    pub fn require_manager(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Superadmin | Role::Admin | Role::Manager) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Manager or above only"))
        }
    }

    /// Returns true if the user is a plain employee
    pub fn is_employee(&self) -> bool {
        self.role == Role::Employee
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "tester".into(),
            role,
            employee_id: Some(10),
        }
    }

    #[test]
    fn superadmin_passes_every_guard() {
        let u = user(Role::Superadmin);
        assert!(u.require_superadmin().is_ok());
        assert!(u.require_admin().is_ok());
        assert!(u.require_manager().is_ok());
    }

    #[test]
    fn manager_is_not_admin() {
        let u = user(Role::Manager);
        assert!(u.require_manager().is_ok());
        assert!(u.require_admin().is_err());
        assert!(u.require_superadmin().is_err());
    }

    #[test]
    fn employee_fails_all_privilege_guards() {
        let u = user(Role::Employee);
        assert!(u.is_employee());
        assert!(u.require_manager().is_err());
        assert!(u.require_admin().is_err());
        assert!(u.require_superadmin().is_err());
    }
}
