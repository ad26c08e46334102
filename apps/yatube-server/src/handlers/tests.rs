use actix_web::http::{StatusCode, header};
use actix_web::middleware::{NormalizePath, TrailingSlash};
use actix_web::{App, test, web};
use serde_json::Value;
use uuid::Uuid;

use yatube_core::PostForm;
use yatube_core::domain::{Group, Post, User};
use yatube_core::ports::{BaseRepository, GroupRepository};
use yatube_infra::InMemoryDatabase;
use yatube_shared::dto::{CredentialsForm, GroupForm};

use super::{configure_routes, not_found};
use crate::config::AppConfig;
use crate::middleware::auth::{ADMIN_ROLE, SESSION_COOKIE};
use crate::state::AppState;

macro_rules! init_app {
    ($site:expr) => {
        test::init_service(
            App::new()
                .wrap(NormalizePath::new(TrailingSlash::Always))
                .app_data(web::Data::new($site.state.clone()))
                .configure(configure_routes)
                .default_service(web::to(not_found)),
        )
        .await
    };
}

struct Site {
    db: InMemoryDatabase,
    state: AppState,
}

impl Site {
    fn new() -> Self {
        let db = InMemoryDatabase::new();
        let config = AppConfig {
            admin_usernames: vec!["root".to_string()],
            ..AppConfig::default()
        };
        let state = AppState::in_memory(config, &db);
        Self { db, state }
    }

    async fn user(&self, username: &str) -> User {
        self.db
            .users()
            .insert(User::new(username.to_string(), "hash".to_string()))
            .await
            .unwrap()
    }

    async fn group(&self, slug: &str) -> Group {
        self.state
            .blog
            .create_group(format!("Group {slug}"), slug.to_string(), "about".to_string())
            .await
            .unwrap()
    }

    async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        let form = PostForm {
            text: text.to_string(),
            group: group.map(|g| g.id.to_string()),
            image: None,
        };
        self.state.blog.create_post(author.id, &form).await.unwrap()
    }

    fn bearer(&self, user: &User, roles: &[&str]) -> (header::HeaderName, String) {
        let token = self
            .state
            .tokens
            .generate_token(
                user.id,
                &user.username,
                roles.iter().map(|r| r.to_string()).collect(),
            )
            .unwrap();
        (header::AUTHORIZATION, format!("Bearer {token}"))
    }

    async fn stored(&self, id: Uuid) -> Post {
        self.db.posts().find_by_id(id).await.unwrap().unwrap()
    }
}

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn post_form(text: &str, group: Option<&Group>) -> PostForm {
    PostForm {
        text: text.to_string(),
        group: group.map(|g| g.id.to_string()),
        image: None,
    }
}

#[actix_rt::test]
async fn test_home_feed_pages() {
    let site = Site::new();
    let author = site.user("NoName").await;
    for i in 0..13 {
        site.post(&author, &format!("post {i}"), None).await;
    }
    let app = init_app!(site);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 10);
    assert_eq!(body["posts"][0]["text"], "post 12");
    assert_eq!(body["page"]["total_pages"], 2);
    assert_eq!(body["page"]["has_next"], true);

    let req = test::TestRequest::get().uri("/?page=2").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 3);
    assert_eq!(body["page"]["has_previous"], true);

    let req = test::TestRequest::get().uri("/?page=9").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["posts"].as_array().unwrap().is_empty());

    let req = test::TestRequest::get().uri("/?page=abc").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page"]["number"], 1);
}

#[actix_rt::test]
async fn test_group_feed() {
    let site = Site::new();
    let alice = site.user("alice").await;
    let python = site.group("python").await;
    site.post(&alice, "hello", Some(&python)).await;
    site.post(&alice, "ungrouped", None).await;
    let app = init_app!(site);

    // No trailing slash reaches the same view.
    let req = test::TestRequest::get().uri("/group/python").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["group"]["slug"], "python");
    assert_eq!(body["feed"]["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["feed"]["posts"][0]["text"], "hello");

    let req = test::TestRequest::get().uri("/group/nope/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 404);
}

#[actix_rt::test]
async fn test_profile_and_detail() {
    let site = Site::new();
    let alice = site.user("alice").await;
    let bob = site.user("bob").await;
    let first = site.post(&alice, "one", None).await;
    site.post(&alice, "two", None).await;
    site.post(&bob, "bob's", None).await;
    let app = init_app!(site);

    let req = test::TestRequest::get().uri("/profile/alice/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["author"]["username"], "alice");
    assert_eq!(body["posts_count"], 2);
    assert_eq!(body["feed"]["posts"].as_array().unwrap().len(), 2);

    let uri = format!("/posts/{}/", first.id);
    let req = test::TestRequest::get().uri(&uri).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["post"]["text"], "one");
    assert_eq!(body["post"]["author"]["username"], "alice");
    assert_eq!(body["post"]["group"], Value::Null);
    assert_eq!(body["author_posts_count"], 2);

    for uri in [
        "/profile/nobody/".to_string(),
        format!("/posts/{}/", Uuid::new_v4()),
        "/posts/not-a-uuid/".to_string(),
    ] {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_rt::test]
async fn test_anonymous_create_redirects_to_login() {
    let site = Site::new();
    let app = init_app!(site);

    for uri in ["/create/", "/create"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/auth/login/?next=/create/");
    }

    let req = test::TestRequest::post()
        .uri("/create/")
        .set_form(post_form("sneaky", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");
    assert_eq!(site.state.blog.home_feed(None).await.unwrap().total_items, 0);
}

#[actix_rt::test]
async fn test_create_post() {
    let site = Site::new();
    let alice = site.user("alice").await;
    let python = site.group("python").await;
    let auth = site.bearer(&alice, &["user"]);
    let app = init_app!(site);

    let req = test::TestRequest::get()
        .uri("/create/")
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["is_edit"], false);
    assert_eq!(body["values"]["text"], "");
    assert_eq!(body["groups"][0]["slug"], "python");

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(auth)
        .set_form(post_form("hello", Some(&python)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/alice/");

    let (_, feed) = site.state.blog.group_feed("python", None).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed.items[0].post.text, "hello");
    assert_eq!(feed.items[0].author.username, "alice");
}

#[actix_rt::test]
async fn test_invalid_create_rerenders_form() {
    let site = Site::new();
    let alice = site.user("alice").await;
    let auth = site.bearer(&alice, &["user"]);
    let app = init_app!(site);

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(auth)
        .set_form(PostForm {
            text: "   ".to_string(),
            group: Some(Uuid::new_v4().to_string()),
            image: None,
        })
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["text"][0], "text required");
    assert_eq!(body["errors"]["group"][0], "invalid group");
    assert_eq!(body["values"]["text"], "   ");

    assert_eq!(site.state.blog.home_feed(None).await.unwrap().total_items, 0);
}

#[actix_rt::test]
async fn test_owner_edits_post() {
    let site = Site::new();
    let alice = site.user("alice").await;
    let python = site.group("python").await;
    let post = site.post(&alice, "draft", Some(&python)).await;
    let auth = site.bearer(&alice, &["user"]);
    let app = init_app!(site);
    let uri = format!("/posts/{}/edit/", post.id);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["is_edit"], true);
    assert_eq!(body["post_id"], post.id.to_string());
    assert_eq!(body["values"]["text"], "draft");
    assert_eq!(body["values"]["group"], python.id.to_string());

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(auth.clone())
        .set_form(post_form("", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(site.stored(post.id).await.text, "draft");

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(auth)
        .set_form(post_form("final", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let stored = site.stored(post.id).await;
    assert_eq!(stored.text, "final");
    assert_eq!(stored.group_id, None);
    assert_eq!(stored.author_id, alice.id);
    assert_eq!(stored.pub_date, post.pub_date);
}

#[actix_rt::test]
async fn test_non_owner_is_sent_back_to_post() {
    let site = Site::new();
    let alice = site.user("alice").await;
    let bob = site.user("bob").await;
    let post = site.post(&alice, "alice wrote this", None).await;
    let auth = site.bearer(&bob, &["user"]);
    let app = init_app!(site);
    let uri = format!("/posts/{}/edit/", post.id);
    let detail = format!("/posts/{}/", post.id);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(auth)
        .set_form(post_form("bob was here", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail);
    assert_eq!(site.stored(post.id).await, post);
}

#[actix_rt::test]
async fn test_edit_checks_login_before_existence() {
    let site = Site::new();
    let alice = site.user("alice").await;
    let auth = site.bearer(&alice, &["user"]);
    let app = init_app!(site);
    let uri = format!("/posts/{}/edit/", Uuid::new_v4());

    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/auth/login/?next={uri}"));

    let req = test::TestRequest::get().uri(&uri).insert_header(auth).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_signup_login_and_logout() {
    let site = Site::new();
    let app = init_app!(site);
    let credentials = |password: &str, next: Option<&str>| CredentialsForm {
        username: "alice".to_string(),
        password: password.to_string(),
        next: next.map(String::from),
    };

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form(credentials("12345678", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form(credentials("correct horse", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "alice");

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form(credentials("another one", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form(credentials("wrong password", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form(credentials("correct horse", Some("/create/")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/create/");
    let session = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.into_owned())
        .unwrap();
    assert!(session.http_only().unwrap_or(false));

    let req = test::TestRequest::get()
        .uri("/create/")
        .cookie(session)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post().uri("/auth/logout/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    let cleared = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap();
    assert_eq!(cleared.value(), "");
}

#[actix_rt::test]
async fn test_login_ignores_offsite_next() {
    let site = Site::new();
    let app = init_app!(site);

    let signup = CredentialsForm {
        username: "alice".to_string(),
        password: "correct horse".to_string(),
        next: Some("https://evil.example/".to_string()),
    };
    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form(&signup)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form(&signup)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/");

    let req = test::TestRequest::get()
        .uri("/auth/login/?next=/create/")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["next"], "/create/");
}

#[actix_rt::test]
async fn test_admin_manages_groups() {
    let site = Site::new();
    let root = site.user("root").await;
    let alice = site.user("alice").await;
    let admin = site.bearer(&root, &["user", ADMIN_ROLE]);
    let user = site.bearer(&alice, &["user"]);
    let app = init_app!(site);
    let form = GroupForm {
        title: "Python".to_string(),
        slug: "python".to_string(),
        description: "Snakes".to_string(),
    };

    let req = test::TestRequest::post()
        .uri("/admin/groups/")
        .set_form(&form)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/admin/groups/")
        .insert_header(user)
        .set_form(&form)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/admin/groups/")
        .insert_header(admin.clone())
        .set_form(&form)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["slug"], "python");

    let req = test::TestRequest::post()
        .uri("/admin/groups/")
        .insert_header(admin.clone())
        .set_form(&form)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/admin/groups/")
        .insert_header(admin.clone())
        .set_form(GroupForm {
            slug: "not a slug".to_string(),
            ..form.clone()
        })
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    let python = site.db.groups().find_by_slug("python").await.unwrap().unwrap();
    let post = site.post(&alice, "survivor", Some(&python)).await;

    let req = test::TestRequest::delete()
        .uri("/admin/groups/python/")
        .insert_header(admin.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(site.stored(post.id).await.group_id, None);

    let req = test::TestRequest::delete()
        .uri("/admin/groups/python/")
        .insert_header(admin)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_unknown_path_and_health() {
    let site = Site::new();
    let app = init_app!(site);

    let req = test::TestRequest::get().uri("/no/such/page/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Not Found");

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[actix_rt::test]
async fn test_request_id_is_echoed() {
    use crate::observability::RequestIdMiddleware;

    let site = Site::new();
    let app = test::init_service(
        App::new()
            .wrap(RequestIdMiddleware)
            .app_data(web::Data::new(site.state.clone()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/")
        .insert_header(("X-Request-ID", "abc-123"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "abc-123");

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    let generated = resp.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert!(Uuid::parse_str(generated).is_ok());
}

#[actix_rt::test]
async fn test_bodyless_posts_still_redirect() {
    let site = Site::new();
    let alice = site.user("alice").await;
    let bob = site.user("bob").await;
    let post = site.post(&alice, "alice wrote this", None).await;
    let edit_uri = format!("/posts/{}/edit/", post.id);
    let app = init_app!(site);

    let req = test::TestRequest::post().uri("/create/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");

    let req = test::TestRequest::post()
        .uri("/create/")
        .set_json(serde_json::json!({ "text": "json" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");

    let req = test::TestRequest::post()
        .uri(&edit_uri)
        .insert_header(site.bearer(&bob, &["user"]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let req = test::TestRequest::post().uri(&edit_uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/auth/login/?next={edit_uri}"));

    assert_eq!(site.stored(post.id).await, post);
    assert_eq!(site.state.blog.home_feed(None).await.unwrap().total_items, 1);
}

#[actix_rt::test]
async fn test_owner_bodyless_post_gets_form_errors() {
    let site = Site::new();
    let alice = site.user("alice").await;
    let post = site.post(&alice, "draft", None).await;
    let auth = site.bearer(&alice, &["user"]);
    let app = init_app!(site);

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["text"][0], "text required");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header(auth)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(site.stored(post.id).await.text, "draft");
}

#[actix_rt::test]
async fn test_session_of_deleted_user_goes_to_login() {
    let site = Site::new();
    let alice = site.user("alice").await;
    let auth = site.bearer(&alice, &["user"]);
    site.db.users().delete(alice.id).await.unwrap();
    let app = init_app!(site);

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(auth)
        .set_form(post_form("ghost", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");
    assert_eq!(site.state.blog.home_feed(None).await.unwrap().total_items, 0);
}
