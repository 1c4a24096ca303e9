use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::{Value, json};

use bloglist_core::domain::{MAX_LIKES, Post, User};
use bloglist_core::ports::{PasswordService, TokenService};
use bloglist_infra::{Argon2PasswordService, JwtConfig, JwtTokenService};

use super::{configure_routes, json_config};
use crate::state::AppState;

struct Fixture {
    state: AppState,
    tokens: Arc<dyn TokenService>,
    passwords: Arc<dyn PasswordService>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            state: AppState::in_memory(),
            tokens: Arc::new(JwtTokenService::new(JwtConfig {
                secret: "handler-test-secret".to_string(),
                ..Default::default()
            })),
            passwords: Arc::new(Argon2PasswordService::new()),
        }
    }

    /// Store a user directly and return it with a valid bearer header value.
    async fn user(&self, username: &str) -> (User, String) {
        let user = User::new(username.to_string(), "Someone".to_string(), "unused".to_string());
        let user = self.state.users.insert(user).await.unwrap();
        let token = self.tokens.generate_token(user.id, &user.username).unwrap();
        (user, format!("Bearer {}", token))
    }

    async fn post(&self, owner: &User, title: &str, author: &str, likes: u64) -> Post {
        let post = Post::new(
            owner.id,
            title.to_string(),
            author.to_string(),
            format!("{}.com", title.to_lowercase()),
            Some(likes),
        );
        self.state.posts.insert(post).await.unwrap()
    }

    async fn post_count(&self) -> usize {
        self.state.posts.find_all().await.unwrap().len()
    }

    async fn user_count(&self) -> usize {
        self.state.users.find_all().await.unwrap().len()
    }
}

macro_rules! app {
    ($fx:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($fx.state.clone()))
                .app_data(web::Data::new($fx.tokens.clone()))
                .app_data(web::Data::new($fx.passwords.clone()))
                .app_data(json_config())
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health() {
    let fx = Fixture::new();
    let app = app!(fx);

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/health").to_request())
            .await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "in-memory");
}

#[actix_web::test]
async fn test_blogs_are_returned_as_json_with_owner() {
    let fx = Fixture::new();
    let (root, _) = fx.user("root").await;
    fx.post(&root, "MyBlog", "Jane Doe", 3).await;
    fx.post(&root, "MyAnotherBlog", "Edgar Allan Poe", 5).await;
    let app = app!(fx);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/blogs").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );

    let body: Value = test::read_body_json(resp).await;
    let blogs = body.as_array().unwrap();
    assert_eq!(blogs.len(), 2);
    assert_eq!(blogs[0]["title"], "MyBlog");
    assert_eq!(blogs[1]["title"], "MyAnotherBlog");
    assert_eq!(blogs[0]["user"]["username"], "root");
    assert_eq!(blogs[0]["user"]["id"], root.id.to_string());
}

#[actix_web::test]
async fn test_valid_blog_can_be_added() {
    let fx = Fixture::new();
    let (root, auth) = fx.user("root").await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/blogs")
        .insert_header((header::AUTHORIZATION, auth))
        .set_json(json!({
            "title": "NewBlog",
            "author": "John Smith",
            "url": "newblog.com",
            "likes": 2
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "NewBlog");
    assert_eq!(body["likes"], 2);
    assert_eq!(body["user"], root.id.to_string());

    assert_eq!(fx.post_count().await, 1);
    let owned = fx.state.posts.find_by_user_id(root.id).await.unwrap();
    assert_eq!(owned[0].title, "NewBlog");
}

#[actix_web::test]
async fn test_blog_without_likes_defaults_to_zero() {
    let fx = Fixture::new();
    let (_, auth) = fx.user("root").await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/blogs")
        .insert_header((header::AUTHORIZATION, auth))
        .set_json(json!({
            "title": "NewBlogWithoutLikes",
            "author": "Jaska Jokunen",
            "url": "newbloglikes.com"
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["likes"], 0);
    assert_eq!(fx.post_count().await, 1);
}

#[actix_web::test]
async fn test_blog_without_title_and_url_is_rejected() {
    let fx = Fixture::new();
    let (_, auth) = fx.user("root").await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/blogs")
        .insert_header((header::AUTHORIZATION, auth))
        .set_json(json!({ "author": "Stupid blogger", "likes": 2 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "title missing");
    assert_eq!(fx.post_count().await, 0);
}

#[actix_web::test]
async fn test_writes_require_token() {
    let fx = Fixture::new();
    let (root, _) = fx.user("root").await;
    let post = fx.post(&root, "MyBlog", "Jane Doe", 3).await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/blogs")
        .set_json(json!({ "title": "NoToken", "url": "notoken.com" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::delete()
        .uri(&format!("/api/blogs/{}", post.id))
        .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    assert_eq!(fx.post_count().await, 1);
}

#[actix_web::test]
async fn test_owner_can_delete_blog() {
    let fx = Fixture::new();
    let (root, auth) = fx.user("root").await;
    let keep = fx.post(&root, "MyBlog", "Jane Doe", 3).await;
    let doomed = fx.post(&root, "A blog to be deleted", "Nobody", 1).await;
    let app = app!(fx);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/blogs/{}", doomed.id))
        .insert_header((header::AUTHORIZATION, auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let remaining = fx.state.posts.find_all().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep.id);
}

#[actix_web::test]
async fn test_other_user_cannot_delete_blog() {
    let fx = Fixture::new();
    let (root, _) = fx.user("root").await;
    let (_, intruder) = fx.user("mallory").await;
    let post = fx.post(&root, "MyBlog", "Jane Doe", 3).await;
    let app = app!(fx);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/blogs/{}", post.id))
        .insert_header((header::AUTHORIZATION, intruder))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "delete operation forbidden");
    assert_eq!(fx.post_count().await, 1);
}

#[actix_web::test]
async fn test_malformed_and_unknown_ids() {
    let fx = Fixture::new();
    let (_, auth) = fx.user("root").await;
    let app = app!(fx);

    let req = test::TestRequest::delete()
        .uri("/api/blogs/not-an-id")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "malformatted id");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/blogs/{}", uuid::Uuid::new_v4()))
        .insert_header((header::AUTHORIZATION, auth))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/blogs/{}", uuid::Uuid::new_v4()))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_update_increments_likes() {
    let fx = Fixture::new();
    let (root, auth) = fx.user("root").await;
    let post = fx.post(&root, "MyBlog", "Jane Doe", 3).await;
    let app = app!(fx);

    let req = test::TestRequest::put()
        .uri(&format!("/api/blogs/{}", post.id))
        .insert_header((header::AUTHORIZATION, auth))
        .set_json(json!({
            "title": post.title,
            "author": post.author,
            "url": post.url,
            "likes": post.likes + 1
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["likes"], 4);
    assert_eq!(body["title"], "MyBlog");

    let stored = fx.state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.likes, 4);
}

#[actix_web::test]
async fn test_malformed_json_body_is_bad_request() {
    let fx = Fixture::new();
    let (root, auth) = fx.user("root").await;
    let post = fx.post(&root, "MyBlog", "Jane Doe", 3).await;
    let app = app!(fx);

    let req = test::TestRequest::put()
        .uri(&format!("/api/blogs/{}", post.id))
        .insert_header((header::AUTHORIZATION, auth))
        .set_json(json!({ "likes": -1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let stored = fx.state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.likes, 3);
}

#[actix_web::test]
async fn test_likes_beyond_storage_range_are_rejected() {
    let fx = Fixture::new();
    let (root, auth) = fx.user("root").await;
    let post = fx.post(&root, "MyBlog", "Jane Doe", 3).await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/blogs")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(json!({ "title": "Viral", "url": "viral.com", "likes": u64::MAX }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(fx.post_count().await, 1);

    let req = test::TestRequest::put()
        .uri(&format!("/api/blogs/{}", post.id))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(json!({ "likes": MAX_LIKES + 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let stored = fx.state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.likes, 3);

    let req = test::TestRequest::post()
        .uri("/api/blogs")
        .insert_header((header::AUTHORIZATION, auth))
        .set_json(json!({ "title": "Capped", "url": "capped.com", "likes": MAX_LIKES }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_stats_with_largest_like_counts() {
    let fx = Fixture::new();
    let (root, _) = fx.user("root").await;
    fx.post(&root, "First", "Jane Doe", MAX_LIKES).await;
    fx.post(&root, "Second", "Jane Doe", MAX_LIKES).await;
    fx.post(&root, "Third", "Jane Doe", MAX_LIKES).await;
    let app = app!(fx);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/blogs/stats").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total_likes"], u64::MAX);
    assert_eq!(body["favorite_blog"]["title"], "First");
    assert_eq!(
        body["most_likes"],
        json!({ "author": "Jane Doe", "likes": u64::MAX })
    );
}

#[actix_web::test]
async fn test_stats() {
    let fx = Fixture::new();
    let (root, _) = fx.user("root").await;
    fx.post(&root, "React patterns", "Michael Chan", 7).await;
    fx.post(&root, "Canonical string reduction", "Edsger W. Dijkstra", 12).await;
    fx.post(&root, "First class tests", "Robert C. Martin", 10).await;
    fx.post(&root, "Type wars", "Robert C. Martin", 2).await;
    let app = app!(fx);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/blogs/stats").to_request(),
    )
    .await;

    assert_eq!(body["total_likes"], 31);
    assert_eq!(body["favorite_blog"]["title"], "Canonical string reduction");
    assert_eq!(
        body["most_blogs"],
        json!({ "author": "Robert C. Martin", "blogs": 2 })
    );
    assert_eq!(
        body["most_likes"],
        json!({ "author": "Edsger W. Dijkstra", "likes": 12 })
    );
}

#[actix_web::test]
async fn test_stats_without_posts() {
    let fx = Fixture::new();
    let app = app!(fx);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/blogs/stats").to_request(),
    )
    .await;

    assert_eq!(body["total_likes"], 0);
    assert!(body["favorite_blog"].is_null());
    assert!(body["most_blogs"].is_null());
    assert!(body["most_likes"].is_null());
}

#[actix_web::test]
async fn test_valid_user_can_be_added_and_log_in() {
    let fx = Fixture::new();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({
            "username": "ankka",
            "name": "Aku Ankka",
            "password": "secretPassword"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "ankka");
    assert_eq!(body["name"], "Aku Ankka");
    assert!(body.get("password_hash").is_none());
    assert_eq!(fx.user_count().await, 1);

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "username": "ankka", "password": "secretPassword" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["name"], "Aku Ankka");
    let claims = fx
        .tokens
        .validate_token(body["access_token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.username, "ankka");

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "username": "ankka", "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "invalid username or password");
}

#[actix_web::test]
async fn test_user_with_short_password_is_rejected() {
    let fx = Fixture::new();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({ "username": "hopo", "name": "Hessu Hopo", "password": "se" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["detail"],
        "password must be at least three characters long"
    );
    assert_eq!(fx.user_count().await, 0);
}

#[actix_web::test]
async fn test_user_with_blank_username_is_rejected() {
    let fx = Fixture::new();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({ "username": "   ", "name": "Nobody", "password": "secretP" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "username missing");
    assert_eq!(fx.user_count().await, 0);
}

#[actix_web::test]
async fn test_user_with_taken_username_is_rejected() {
    let fx = Fixture::new();
    fx.user("root").await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({ "username": "root", "name": "Hessu H", "password": "secretP" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "username must be unique");
    assert_eq!(fx.user_count().await, 1);
}

#[actix_web::test]
async fn test_users_list_their_blogs() {
    let fx = Fixture::new();
    let (root, _) = fx.user("root").await;
    let (other, _) = fx.user("other").await;
    fx.post(&root, "MyBlog", "Jane Doe", 3).await;
    fx.post(&root, "MyAnotherBlog", "Edgar Allan Poe", 5).await;
    let app = app!(fx);

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/users").to_request())
            .await;
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["blogs"].as_array().unwrap().len(), 2);
    assert_eq!(users[0]["blogs"][1]["title"], "MyAnotherBlog");
    assert!(users[1]["blogs"].as_array().unwrap().is_empty());

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/users/{}", other.id))
            .to_request(),
    )
    .await;
    assert_eq!(body["username"], "other");
}
