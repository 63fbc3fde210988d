//! Integration tests for CommentClient using wiremock.

use podsee_core::api::{ApiError, CommentClient, CommentError, COMMENTS_PAGE_SIZE};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_comment(id: &str, parent: Option<&str>, text: &str) -> serde_json::Value {
    serde_json::json!({
        "comment_id": id,
        "centre_id": "449269",
        "username": "parent88",
        "text": text,
        "parent_comment_id": parent,
        "hidden": false,
        "created_at": "2026-03-01T09:30:00Z"
    })
}

fn client(server: &MockServer) -> CommentClient {
    CommentClient::new(&server.uri(), "anon-key").unwrap()
}

#[tokio::test]
async fn test_fetch_comments_calls_rpc() {
    let mock_server = MockServer::start().await;

    let mut first = test_comment("c1", None, "Patient tutors");
    first["reply_count"] = serde_json::json!(2);

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/get_comments_with_reply_count"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .and(body_json(serde_json::json!({
            "p_centre_id": "449269",
            "p_limit": 20,
            "p_offset": 0
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([first, test_comment("c2", None, "Good notes")])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let comments = client(&mock_server)
        .fetch_comments("449269", COMMENTS_PAGE_SIZE, 0)
        .await
        .unwrap();

    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].reply_count(), 2);
    assert_eq!(comments[1].reply_count(), 0);
}

#[tokio::test]
async fn test_fetch_replies_filters_and_orders() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/comments"))
        .and(query_param("parent_comment_id", "eq.c1"))
        .and(query_param("hidden", "eq.false"))
        .and(query_param("order", "created_at.asc"))
        .and(query_param("limit", "2"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            test_comment("r1", Some("c1"), "Agreed"),
            test_comment("r2", Some("c1"), "Same here"),
        ])))
        .mount(&mock_server)
        .await;

    let replies = client(&mock_server).fetch_replies("c1", 2, 0).await.unwrap();
    assert_eq!(replies.len(), 2);
    assert!(replies.iter().all(|r| r.is_reply()));
}

#[tokio::test]
async fn test_reply_count_reads_content_range() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/rest/v1/comments"))
        .and(header("prefer", "count=exact"))
        .and(query_param("parent_comment_id", "eq.c1"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-range", "0-1/5"))
        .mount(&mock_server)
        .await;

    let count = client(&mock_server).reply_count("c1").await.unwrap();
    assert_eq!(count, 5);
}

#[tokio::test]
async fn test_create_comment_sanitizes_and_returns_row() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/comments"))
        .and(header("prefer", "return=representation"))
        .and(body_json(serde_json::json!({
            "centre_id": "449269",
            "username": "parent88",
            "text": "Great tutors",
            "parent_comment_id": null,
            "hidden": false
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(serde_json::json!([test_comment("c9", None, "Great tutors")])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let created = client(&mock_server)
        .create_comment("449269", " parent88 ", "  <b>Great</b> tutors ", None)
        .await
        .unwrap();

    assert_eq!(created.comment_id, "c9");
    assert_eq!(created.text, "Great tutors");
}

#[tokio::test]
async fn test_reply_to_reply_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/comments"))
        .and(query_param("comment_id", "eq.r1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{ "parent_comment_id": "c1" }])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/comments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .create_comment("449269", "parent88", "Me too", Some("r1"))
        .await
        .unwrap_err();

    assert!(matches!(err, CommentError::ReplyToReply));
    assert_eq!(
        err.to_string(),
        "Cannot reply to a reply. Only top-level comments can be replied to."
    );
}

#[tokio::test]
async fn test_reply_to_missing_parent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/comments"))
        .and(query_param("comment_id", "eq.gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .create_comment("449269", "parent88", "Hello", Some("gone"))
        .await
        .unwrap_err();

    assert!(matches!(err, CommentError::ParentNotFound));
}

#[tokio::test]
async fn test_reply_to_top_level_comment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/comments"))
        .and(query_param("comment_id", "eq.c1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{ "parent_comment_id": null }])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/comments"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(serde_json::json!([test_comment("r3", Some("c1"), "Thanks")])),
        )
        .mount(&mock_server)
        .await;

    let reply = client(&mock_server)
        .create_comment("449269", "parent88", "Thanks", Some("c1"))
        .await
        .unwrap();

    assert_eq!(reply.parent_comment_id.as_deref(), Some("c1"));
}

#[tokio::test]
async fn test_reply_previews_skip_comments_without_replies() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/comments"))
        .and(query_param("parent_comment_id", "eq.c1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([test_comment("r1", Some("c1"), "Agreed")])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut with_replies: podsee_core::Comment =
        serde_json::from_value(test_comment("c1", None, "Top")).unwrap();
    with_replies.reply_count = Some(1);
    let without_replies: podsee_core::Comment =
        serde_json::from_value(test_comment("c2", None, "Quiet")).unwrap();

    let previews = client(&mock_server)
        .fetch_reply_previews(&[with_replies, without_replies])
        .await;

    assert_eq!(previews.len(), 1);
    assert_eq!(previews["c1"].len(), 1);
}

#[tokio::test]
async fn test_admin_calls_use_service_key() {
    let mock_server = MockServer::start().await;

    let mut hidden = test_comment("c1", None, "Spam");
    hidden["hidden"] = serde_json::json!(true);

    Mock::given(method("GET"))
        .and(path("/rest/v1/comments"))
        .and(header("apikey", "service-key"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([hidden.clone()])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/comments"))
        .and(header("apikey", "service-key"))
        .and(query_param("comment_id", "eq.c1"))
        .and(body_json(serde_json::json!({ "hidden": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([hidden])))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/comments"))
        .and(header("apikey", "service-key"))
        .and(query_param("comment_id", "eq.c1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let admin = client(&mock_server).with_service_key(Some("service-key".to_string()));

    let all = admin.admin_fetch_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].hidden);

    let updated = admin.admin_set_hidden("c1", true).await.unwrap();
    assert!(updated.hidden);

    admin.admin_delete("c1").await.unwrap();
}

#[tokio::test]
async fn test_admin_without_service_key() {
    let mock_server = MockServer::start().await;
    let err = client(&mock_server).admin_fetch_all().await.unwrap_err();
    assert!(matches!(err, CommentError::AdminUnavailable));
}

#[tokio::test]
async fn test_server_error_maps_to_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/get_comments_with_reply_count"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .fetch_comments("449269", COMMENTS_PAGE_SIZE, 0)
        .await
        .unwrap_err();

    assert!(matches!(err, CommentError::Api(ApiError::ServerError(_))));
}
