use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use skget_core::remote::list_skills;
use skget_core::{ContentSource, RemoteClient, RepoRef, SkGetError};
use std::collections::HashMap;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind free port");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

fn github_app(base: String) -> Router {
    Router::new()
        .route(
            "/repos/acme/skills/contents/skills",
            get(|| async {
                Json(json!([
                    {"name": "git-commit", "path": "skills/git-commit", "type": "dir", "download_url": null},
                    {"name": "hello-world", "path": "skills/hello-world", "type": "dir", "download_url": null},
                    {"name": "README.md", "path": "skills/README.md", "type": "file", "download_url": null}
                ]))
            }),
        )
        .route(
            "/repos/acme/skills/contents/skills/git-commit",
            get(move || {
                let base = base.clone();
                async move {
                    Json(json!([{
                        "name": "SKILL.md",
                        "path": "skills/git-commit/SKILL.md",
                        "type": "file",
                        "download_url": format!("{}/raw/git-commit/SKILL.md", base)
                    }]))
                }
            }),
        )
        .route("/raw/git-commit/SKILL.md", get(|| async { "# Git Commit\n" }))
        .route(
            "/repos/acme/limited/contents/skills",
            get(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({"message": "API rate limit exceeded"})),
                )
            }),
        )
}

async fn gitlab_tree(
    Path(project): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let branch = query.get("ref").map(String::as_str);
    let page = query.get("page").map(String::as_str).unwrap_or("1");

    if project == "team/flaky" {
        if branch == Some("main") {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"message": "500 Internal Server Error"})),
            )
                .into_response();
        }
        return Json(json!([
            {"id": "1", "name": "SKILL.md", "type": "blob", "path": "skills/x/SKILL.md", "mode": "100644"}
        ]))
        .into_response();
    }
    if project != "team/skills" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "wrong project").into_response();
    }
    if branch != Some("master") {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "404 Tree Not Found"})),
        )
            .into_response();
    }
    match (query.get("path").map(String::as_str), page) {
        (Some("skills/hello"), _) => Json(json!([
            {"id": "1", "name": "SKILL.md", "type": "blob", "path": "skills/hello/SKILL.md", "mode": "100644"},
            {"id": "2", "name": "docs", "type": "tree", "path": "skills/hello/docs", "mode": "040000"}
        ]))
        .into_response(),
        (Some("skills/big"), "1") => (
            [("x-next-page", "2")],
            Json(json!([
                {"id": "1", "name": "a.md", "type": "blob", "path": "skills/big/a.md", "mode": "100644"}
            ])),
        )
            .into_response(),
        (Some("skills/big"), "2") => (
            [("x-next-page", "")],
            Json(json!([
                {"id": "2", "name": "b.md", "type": "blob", "path": "skills/big/b.md", "mode": "100644"}
            ])),
        )
            .into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({"message": "404 Tree Not Found"}))).into_response(),
    }
}

async fn gitlab_raw(
    Path((project, file)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> axum::response::Response {
    if project == "team/skills"
        && file == "skills/hello/SKILL.md"
        && query.get("ref").map(String::as_str) == Some("master")
    {
        "Say hello.".into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

fn gitlab_app() -> Router {
    Router::new()
        .route("/api/v4/projects/:project/repository/tree", get(gitlab_tree))
        .route(
            "/api/v4/projects/:project/repository/files/:file/raw",
            get(gitlab_raw),
        )
}

#[tokio::test]
async fn github_lists_skill_directories() {
    let base = serve(github_app(String::new())).await;
    let client = RemoteClient::new().unwrap().with_github_api_base(&base);
    let repo = RepoRef::parse("https://github.com/acme/skills.git").unwrap();

    let skills = list_skills(&client, &repo).await.unwrap();
    assert_eq!(skills, ["git-commit", "hello-world"]);
}

#[tokio::test]
async fn github_downloads_returned_urls() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let app = github_app(base.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let client = RemoteClient::new().unwrap().with_github_api_base(&base);
    let repo = RepoRef::parse("https://github.com/acme/skills").unwrap();

    let entries = client
        .list_contents(&repo, "skills/git-commit")
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    let url = entries[0].download_url.as_deref().unwrap();
    assert_eq!(client.download_text(url).await.unwrap(), "# Git Commit\n");
}

#[tokio::test]
async fn github_missing_path_is_not_found() {
    let base = serve(github_app(String::new())).await;
    let client = RemoteClient::new().unwrap().with_github_api_base(&base);
    let repo = RepoRef::parse("https://github.com/acme/skills").unwrap();

    let err = client
        .list_contents(&repo, "skills/missing")
        .await
        .unwrap_err();
    assert!(matches!(err, SkGetError::NotFound(path) if path == "skills/missing"));
}

#[tokio::test]
async fn github_error_status_carries_message() {
    let base = serve(github_app(String::new())).await;
    let client = RemoteClient::new().unwrap().with_github_api_base(&base);
    let repo = RepoRef::parse("https://github.com/acme/limited").unwrap();

    let err = list_skills(&client, &repo).await.unwrap_err();
    match err {
        SkGetError::RemoteApi { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "API rate limit exceeded");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn gitlab_falls_back_to_master_and_builds_raw_urls() {
    let base = serve(gitlab_app()).await;
    let client = RemoteClient::new().unwrap().with_gitlab_api_base(&base);
    let repo = RepoRef::parse("https://gitlab.com/team/skills.git").unwrap();

    let entries = client.list_contents(&repo, "skills/hello").await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[1].is_dir());
    assert_eq!(entries[1].path, "skills/hello/docs");

    let url = entries[0].download_url.as_deref().unwrap();
    assert!(url.contains("ref=master"));
    assert_eq!(client.download_text(url).await.unwrap(), "Say hello.");
}

#[tokio::test]
async fn gitlab_missing_on_both_branches_is_not_found() {
    let base = serve(gitlab_app()).await;
    let client = RemoteClient::new().unwrap().with_gitlab_api_base(&base);
    let repo = RepoRef::parse("https://gitlab.com/team/skills").unwrap();

    let err = client.list_contents(&repo, "skills/nope").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn gitlab_follows_next_page_header() {
    let base = serve(gitlab_app()).await;
    let client = RemoteClient::new().unwrap().with_gitlab_api_base(&base);
    let repo = RepoRef::parse("https://gitlab.com/team/skills").unwrap();

    let entries = client.list_contents(&repo, "skills/big").await.unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["a.md", "b.md"]);
}

#[tokio::test]
async fn gitlab_server_error_is_not_retried_on_master() {
    let base = serve(gitlab_app()).await;
    let client = RemoteClient::new().unwrap().with_gitlab_api_base(&base);
    let repo = RepoRef::parse("https://gitlab.com/team/flaky").unwrap();

    let err = client.list_contents(&repo, "skills/x").await.unwrap_err();
    match err {
        SkGetError::RemoteApi { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "500 Internal Server Error");
        }
        other => panic!("unexpected error: {other}"),
    }
}
