//! Group management for admins.

use actix_web::{HttpResponse, web};

use yatube_core::DomainError;
use yatube_shared::dto::GroupForm;

use super::render;
use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /admin/groups/
pub async fn create_group(
    admin: AdminIdentity,
    state: web::Data<AppState>,
    form: web::Form<GroupForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();

    let group = state
        .blog
        .create_group(form.title, form.slug, form.description)
        .await
        .map_err(|e| match e {
            DomainError::InvalidInput(msg) => AppError::Validation(msg),
            other => other.into(),
        })?;

    tracing::info!(admin = %admin.0.username, slug = %group.slug, "Group created by admin");
    Ok(HttpResponse::Created().json(render::group(&group)))
}

/// DELETE /admin/groups/{slug}/
pub async fn delete_group(
    admin: AdminIdentity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    state.blog.delete_group(&path).await?;

    tracing::info!(admin = %admin.0.username, slug = %path.as_str(), "Group deleted by admin");
    Ok(HttpResponse::NoContent().finish())
}
