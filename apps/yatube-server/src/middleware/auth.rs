//! Session identity extractors.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use std::future::{Ready, ready};

use yatube_core::ports::{AuthError, TokenClaims};

use crate::state::AppState;

/// Cookie holding the session token.
pub const SESSION_COOKIE: &str = "yatube_session";

pub const ADMIN_ROLE: &str = "admin";

/// The user behind a session token.
///
/// The token is read from `Authorization: Bearer <token>`, falling back to
/// the session cookie.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub username: String,
    pub roles: Vec<String>,
}

impl Identity {
    /// Check if the user has a specific role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
            roles: claims.roles,
        }
    }
}

/// Error type for authentication failures.
#[derive(Debug)]
pub struct AuthenticationError(pub AuthError);

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match &self.0 {
            AuthError::TokenExpired | AuthError::InvalidToken(_) | AuthError::MissingAuth => {
                actix_web::http::StatusCode::UNAUTHORIZED
            }
            AuthError::InsufficientPermissions => actix_web::http::StatusCode::FORBIDDEN,
            _ => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        use yatube_shared::ErrorResponse;

        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your session has expired. Please login again."),
            AuthError::InvalidToken(msg) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())
            }
            AuthError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Login first, or send a Bearer token in the Authorization header."),
            AuthError::InsufficientPermissions => ErrorResponse::forbidden(),
            _ => ErrorResponse::internal_error(),
        };

        actix_web::HttpResponse::build(self.status_code()).json(error)
    }
}

/// Pull the raw token out of the request, if any.
fn session_token(req: &HttpRequest) -> Result<Option<String>, AuthError> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        let auth_str = value
            .to_str()
            .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;
        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))?;
        return Ok(Some(token.to_string()));
    }

    Ok(req
        .cookie(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty()))
}

fn identify(req: &HttpRequest) -> Result<Identity, AuthError> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err(AuthError::InvalidToken(
            "Server configuration error".to_string(),
        ));
    };

    let token = session_token(req)?.ok_or(AuthError::MissingAuth)?;
    state.tokens.validate_token(&token).map(Identity::from)
}

/// Optional identity extractor - doesn't fail if not authenticated.
///
/// The post views use this so they can redirect anonymous users to the login
/// page instead of answering 401.
pub struct OptionalIdentity(pub Option<Identity>);

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match identify(req) {
            Ok(identity) => ready(Ok(OptionalIdentity(Some(identity)))),
            Err(e) => {
                if !matches!(e, AuthError::MissingAuth) {
                    tracing::debug!(error = %e, "Ignoring invalid session token");
                }
                ready(Ok(OptionalIdentity(None)))
            }
        }
    }
}

/// Identity that carries the admin role. 401 without a valid token, 403
/// without the role.
pub struct AdminIdentity(pub Identity);

impl FromRequest for AdminIdentity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = identify(req).and_then(|identity| {
            if identity.has_role(ADMIN_ROLE) {
                Ok(AdminIdentity(identity))
            } else {
                Err(AuthError::InsufficientPermissions)
            }
        });
        ready(result.map_err(AuthenticationError))
    }
}
