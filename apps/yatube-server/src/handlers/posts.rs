//! Feed, detail and post form views.

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use uuid::Uuid;

use yatube_core::{DomainError, EditAccess, PostForm};
use yatube_shared::dto::{GroupFeedResponse, PageQuery, PostDetailResponse, ProfileResponse};

use super::render;
use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// 302 to `location`.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// 302 to the login page, coming back to `path` afterwards.
fn login_redirect(state: &AppState, path: &str) -> HttpResponse {
    redirect(&format!("{}?next={}", state.config.login_url, path))
}

fn post_url(id: Uuid) -> String {
    format!("/posts/{id}/")
}

/// A missing or unreadable body counts as an empty form, so the login and
/// ownership checks still decide the response.
fn submitted(form: Option<web::Form<PostForm>>) -> PostForm {
    form.map(web::Form::into_inner).unwrap_or_default()
}

/// Ids that do not parse can't name a post.
fn parse_post_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("post '{raw}' not found")))
}

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state.blog.home_feed(query.number()).await?;
    Ok(HttpResponse::Ok().json(render::feed(&page)))
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let (group, page) = state.blog.group_feed(&path, query.number()).await?;

    Ok(HttpResponse::Ok().json(GroupFeedResponse {
        group: render::group(&group),
        feed: render::feed(&page),
    }))
}

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let (author, page) = state.blog.profile_feed(&path, query.number()).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        author: render::user(&author),
        posts_count: page.total_items,
        feed: render::feed(&page),
    }))
}

/// GET /posts/{id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_post_id(&path)?;
    let detail = state.blog.post_detail(id).await?;

    Ok(HttpResponse::Ok().json(PostDetailResponse {
        post: render::post(&detail.card),
        author_posts_count: detail.author_posts,
    }))
}

/// GET /create/
pub async fn create_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    if identity.0.is_none() {
        return Ok(login_redirect(&state, req.path()));
    }

    let groups = state.blog.groups().await?;
    Ok(HttpResponse::Ok().json(render::post_form(
        None,
        &PostForm::default(),
        &groups,
        None,
    )))
}

/// POST /create/
pub async fn create_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    form: Option<web::Form<PostForm>>,
) -> AppResult<HttpResponse> {
    let Some(identity) = identity.0 else {
        return Ok(login_redirect(&state, req.path()));
    };
    let form = submitted(form);

    match state.blog.create_post(identity.user_id, &form).await {
        Ok(_) => Ok(redirect(&format!("/profile/{}/", identity.username))),
        // The session outlived its user.
        Err(DomainError::Unauthorized) => Ok(login_redirect(&state, req.path())),
        Err(DomainError::Validation(errors)) => {
            let groups = state.blog.groups().await?;
            Ok(HttpResponse::UnprocessableEntity().json(render::post_form(
                None,
                &form,
                &groups,
                Some(&errors),
            )))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /posts/{id}/edit/
pub async fn edit_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let Some(identity) = identity.0 else {
        return Ok(login_redirect(&state, req.path()));
    };
    let id = parse_post_id(&path)?;

    match state.blog.edit_access(identity.user_id, id).await? {
        EditAccess::Owner(post) => {
            let groups = state.blog.groups().await?;
            Ok(HttpResponse::Ok().json(render::post_form(
                Some(post.id),
                &PostForm::from_post(&post),
                &groups,
                None,
            )))
        }
        EditAccess::NotOwner(post) => Ok(redirect(&post_url(post.id))),
    }
}

/// POST /posts/{id}/edit/
pub async fn edit_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
    form: Option<web::Form<PostForm>>,
) -> AppResult<HttpResponse> {
    let Some(identity) = identity.0 else {
        return Ok(login_redirect(&state, req.path()));
    };
    let id = parse_post_id(&path)?;
    let form = submitted(form);

    match state.blog.edit_post(identity.user_id, id, &form).await {
        Ok(outcome) => Ok(redirect(&post_url(outcome.post().id))),
        Err(DomainError::Validation(errors)) => {
            let groups = state.blog.groups().await?;
            Ok(HttpResponse::UnprocessableEntity().json(render::post_form(
                Some(id),
                &form,
                &groups,
                Some(&errors),
            )))
        }
        Err(e) => Err(e.into()),
    }
}
