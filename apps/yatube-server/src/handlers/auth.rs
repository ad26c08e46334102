//! Signup, login and logout.

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{HttpResponse, web};

use yatube_core::domain::User;
use yatube_core::ports::{AuthError, UserRepository};
use yatube_shared::dto::{CredentialsForm, LoginFormResponse, NextQuery};

use super::posts::redirect;
use super::render;
use crate::middleware::auth::{ADMIN_ROLE, SESSION_COOKIE};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Only same-site paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

/// POST /auth/signup/
pub async fn signup(
    state: web::Data<AppState>,
    form: web::Form<CredentialsForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let username = form.username.trim().to_string();

    User::validate_username(&username)?;
    state.passwords.check_policy(&form.password, &username)?;

    if state.users.find_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "username '{username}' is already taken"
        )));
    }

    let password_hash = state.passwords.hash(&form.password)?;
    let user = state.users.insert(User::new(username, password_hash)).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User signed up");
    Ok(HttpResponse::Created().json(render::user(&user.author())))
}

/// GET /auth/login/
pub async fn login_form(query: web::Query<NextQuery>) -> HttpResponse {
    HttpResponse::Ok().json(LoginFormResponse {
        next: query.into_inner().next,
    })
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    form: web::Form<CredentialsForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();

    let user = state
        .users
        .find_by_username(form.username.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !state.passwords.verify(&form.password, &user.password_hash)? {
        tracing::debug!(username = %user.username, "Rejected login");
        return Err(AuthError::InvalidCredentials.into());
    }

    let mut roles = vec!["user".to_string()];
    if state.config.is_admin(&user.username) {
        roles.push(ADMIN_ROLE.to_string());
    }

    let token = state.tokens.generate_token(user.id, &user.username, roles)?;
    let cookie = Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(state.tokens.expiration_seconds()))
        .finish();

    tracing::info!(user_id = %user.id, "User logged in");

    let mut response = redirect(safe_next(form.next.as_deref()));
    response
        .add_cookie(&cookie)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}

/// POST /auth/logout/
pub async fn logout() -> AppResult<HttpResponse> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();

    let mut response = redirect("/");
    response
        .add_cookie(&cookie)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::safe_next;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/create/")), "/create/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
