//! Identity & Access Guard.
//!
//! Resolves the authenticated caller into a [`CallerContext`] and answers
//! "is this caller allowed to do X, and on which store?". Every service
//! consumes the capability predicates here instead of re-deriving role
//! logic per operation. Login, refresh and password flows live outside this
//! crate; the extractor only turns an already-issued token into a context.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Caller role. Vendors are permanently bound to one store; admins are
/// store-unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    Vendor,
}

/// JWT claims carried by the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    pub sub: Uuid,
    pub role: Role,
    /// Home store; required for vendors, absent for admins.
    pub store_id: Option<Uuid>,
    pub iat: i64,
    pub exp: i64,
}

/// Resolved caller identity, injected into every service call.
#[derive(Debug, Clone, Copy)]
pub struct CallerContext {
    pub user_id: Uuid,
    pub role: Role,
    /// `Some` for vendors (their home store), `None` for admins.
    pub store_id: Option<Uuid>,
}

impl CallerContext {
    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Admin,
            store_id: None,
        }
    }

    pub fn vendor(user_id: Uuid, home_store: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Vendor,
            store_id: Some(home_store),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn can_list_all_stores(&self) -> bool {
        self.is_admin()
    }

    pub fn can_register_device(&self, store_id: Uuid) -> bool {
        self.is_admin() || self.store_id == Some(store_id)
    }

    /// Device edit is a privileged full-field rewrite, distinct from sale.
    pub fn can_edit_device(&self) -> bool {
        self.is_admin()
    }

    pub fn can_move_device(&self) -> bool {
        self.is_admin()
    }

    /// Product catalog writes; products themselves are not store-bound.
    pub fn can_manage_products(&self) -> bool {
        self.is_admin()
    }

    pub fn can_adjust_stock(&self, store_id: Uuid) -> bool {
        self.is_admin() || self.store_id == Some(store_id)
    }

    /// Fails with `Forbidden` when a vendor targets a store other than
    /// their home store. Services call this inside the same transaction as
    /// the mutation so the check cannot race the act.
    pub fn authorize_store(&self, target_store: Uuid) -> Result<(), ServiceError> {
        if self.is_admin() || self.store_id == Some(target_store) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "operation targets a store outside your scope".to_string(),
            ))
        }
    }

    /// Resolves the store filter for reads and writes alike, so the query
    /// layer's scoping matches the mutation paths exactly.
    ///
    /// Admins get whatever they requested (`None` meaning all stores);
    /// vendors always get their home store, and asking for a foreign store
    /// is `Forbidden`.
    pub fn scope_store(&self, requested: Option<Uuid>) -> Result<Option<Uuid>, ServiceError> {
        match (self.role, self.store_id) {
            (Role::Admin, _) => Ok(requested),
            (Role::Vendor, Some(home)) => match requested {
                Some(store) if store != home => Err(ServiceError::Forbidden(
                    "operation targets a store outside your scope".to_string(),
                )),
                _ => Ok(Some(home)),
            },
            // A vendor context without a home store is a malformed principal.
            (Role::Vendor, None) => Err(ServiceError::Unauthorized(
                "vendor account has no store assigned".to_string(),
            )),
        }
    }

    /// The store a vendor write lands in when the request names none.
    pub fn require_store(&self, requested: Option<Uuid>) -> Result<Uuid, ServiceError> {
        self.scope_store(requested)?.ok_or_else(|| {
            ServiceError::Validation("store_id is required for this operation".to_string())
        })
    }
}

/// Token signing/verification configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, token_ttl_secs: i64) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl_secs,
        }
    }

    /// Issues an HS256 token for the given principal. Used by operational
    /// tooling and tests; interactive login is handled outside this crate.
    pub fn issue_token(
        &self,
        user_id: Uuid,
        role: Role,
        store_id: Option<Uuid>,
    ) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            role,
            store_id,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.token_ttl_secs)).timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Internal(format!("failed to sign token: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<CallerContext, ServiceError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ServiceError::Unauthorized(format!("invalid token: {}", e)))?;

        let claims = data.claims;
        if claims.role == Role::Vendor && claims.store_id.is_none() {
            return Err(ServiceError::Unauthorized(
                "vendor account has no store assigned".to_string(),
            ));
        }

        Ok(CallerContext {
            user_id: claims.sub,
            role: claims.role,
            store_id: claims.store_id,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerContext
where
    S: Send + Sync,
    AuthConfig: FromRef<S>,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AuthConfig::from_ref(state);

        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ServiceError::Unauthorized("missing Authorization header".to_string())
            })?;

        let token = header_value.strip_prefix("Bearer ").ok_or_else(|| {
            ServiceError::Unauthorized("expected Bearer authorization".to_string())
        })?;

        config.verify_token(token.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn vendor_ctx(store: Uuid) -> CallerContext {
        CallerContext::vendor(Uuid::new_v4(), store)
    }

    #[test]
    fn admin_is_unscoped() {
        let ctx = CallerContext::admin(Uuid::new_v4());
        let store = Uuid::new_v4();
        assert!(ctx.can_list_all_stores());
        assert!(ctx.can_adjust_stock(store));
        assert!(ctx.can_register_device(store));
        assert_eq!(ctx.scope_store(None).unwrap(), None);
        assert_eq!(ctx.scope_store(Some(store)).unwrap(), Some(store));
    }

    #[test]
    fn vendor_is_bound_to_home_store() {
        let home = Uuid::new_v4();
        let foreign = Uuid::new_v4();
        let ctx = vendor_ctx(home);

        assert!(!ctx.can_list_all_stores());
        assert!(ctx.can_adjust_stock(home));
        assert!(!ctx.can_adjust_stock(foreign));
        assert!(!ctx.can_edit_device());

        assert_eq!(ctx.scope_store(None).unwrap(), Some(home));
        assert_eq!(ctx.scope_store(Some(home)).unwrap(), Some(home));
        assert_matches!(
            ctx.scope_store(Some(foreign)),
            Err(ServiceError::Forbidden(_))
        );
        assert_matches!(
            ctx.authorize_store(foreign),
            Err(ServiceError::Forbidden(_))
        );
    }

    #[test]
    fn token_round_trip_preserves_principal() {
        let cfg = AuthConfig::new("test-secret-key-for-unit-tests-only", 3600);
        let user = Uuid::new_v4();
        let store = Uuid::new_v4();

        let token = cfg.issue_token(user, Role::Vendor, Some(store)).unwrap();
        let ctx = cfg.verify_token(&token).unwrap();

        assert_eq!(ctx.user_id, user);
        assert_eq!(ctx.role, Role::Vendor);
        assert_eq!(ctx.store_id, Some(store));
    }

    #[test]
    fn vendor_token_without_store_is_rejected() {
        let cfg = AuthConfig::new("test-secret-key-for-unit-tests-only", 3600);
        let token = cfg
            .issue_token(Uuid::new_v4(), Role::Vendor, None)
            .unwrap();
        assert_matches!(
            cfg.verify_token(&token),
            Err(ServiceError::Unauthorized(_))
        );
    }
}
