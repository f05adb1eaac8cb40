use notioncover::{
    notion::{
        client::{Notion, NotionApi, NotionConfig},
        types::{ApiResponse, DatabaseQuery, UpdatePageRequest},
    },
    sync_covers, PropertyNames, SyncError, ThemeMap,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DATABASE_ID: &str = "2131b10c-ebf6-4938-a127-7089ff02dbe4";

fn client(server: &MockServer) -> Notion {
    let mut config = NotionConfig::new("secret_token".to_string());
    config.base_url = server.uri();
    Notion::new(config).expect("Failed to build client")
}

fn blog_page(id: &str, theme: &str) -> serde_json::Value {
    json!({
        "object": "page",
        "id": id,
        "cover": null,
        "properties": {
            "Tema Principal": {
                "id": "%3AbcD",
                "type": "select",
                "select": { "id": "opt", "name": theme, "color": "green" }
            },
            "Tipo de contenido": {
                "id": "%3Ftyp",
                "type": "select",
                "select": { "id": "blog", "name": "Blog", "color": "red" }
            },
            "Name": { "id": "title", "type": "title", "title": [] }
        }
    })
}

fn notion_error(status: u16) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "object": "error",
        "status": status,
        "code": "validation_error",
        "message": "body failed validation"
    }))
}

#[tokio::test]
async fn query_sends_filter_and_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/databases/{DATABASE_ID}/query")))
        .and(header("authorization", "Bearer secret_token"))
        .and(header("notion-version", "2022-06-28"))
        .and(body_json(json!({
            "filter": { "property": "Tipo de contenido", "select": { "equals": "Blog" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "results": [blog_page("p1", "Tech")],
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let res = client(&server)
        .query_database(
            DATABASE_ID,
            &DatabaseQuery::select_equals("Tipo de contenido", "Blog"),
        )
        .await
        .expect("Failed to query");

    match res {
        ApiResponse::Ok(res) => {
            assert_eq!(res.results.len(), 1);
            assert_eq!(res.results[0].id, "p1");
        }
        ApiResponse::Error(e) => panic!("unexpected error envelope {e}"),
    }
}

#[tokio::test]
async fn error_status_decodes_as_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/pages/p1"))
        .respond_with(notion_error(400))
        .mount(&server)
        .await;

    let res = client(&server)
        .update_page("p1", &UpdatePageRequest::external_cover("http://a"))
        .await
        .expect("Failed to update");

    match res {
        ApiResponse::Error(e) => {
            assert_eq!(e.status, 400);
            assert_eq!(e.code.as_deref(), Some("validation_error"));
        }
        ApiResponse::Ok(page) => panic!("unexpected page {page:?}"),
    }
}

#[tokio::test]
async fn status_field_is_an_error_even_on_success() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/pages/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": 429 })))
        .mount(&server)
        .await;

    let res = client(&server)
        .update_page("p1", &UpdatePageRequest::external_cover("http://a"))
        .await
        .expect("Failed to update");
    assert!(res.is_error());
}

#[tokio::test]
async fn non_json_failure_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/pages/p1"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let res = client(&server)
        .update_page("p1", &UpdatePageRequest::external_cover("http://a"))
        .await;
    assert!(res.is_err());
}

#[tokio::test]
async fn sync_updates_mapped_pages_and_keeps_going() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/databases/{DATABASE_ID}/query")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "results": [
                blog_page("p1", "Tech"),
                blog_page("p2", "Cooking"),
                blog_page("p3", "AI"),
                blog_page("p4", "ai")
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/pages/p1"))
        .and(body_json(json!({
            "cover": { "type": "external", "external": { "url": "http://a" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(blog_page("p1", "Tech")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/pages/p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(blog_page("p2", "Cooking")))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/pages/p3"))
        .respond_with(notion_error(409))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/pages/p4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(blog_page("p4", "ai")))
        .expect(1)
        .mount(&server)
        .await;

    let images = ThemeMap::from_reader("theme,url\nTech,http://a\nai,http://b\n".as_bytes())
        .expect("Failed to load mapping");
    let summary = sync_covers(
        &client(&server),
        DATABASE_ID,
        &images,
        &PropertyNames::default(),
    )
    .await
    .expect("Failed to sync");

    assert_eq!(summary.total, 4);
    assert_eq!(summary.updated, 2);
    assert_eq!(summary.unmapped, 1);
    assert_eq!(summary.failed, 1);
}

#[tokio::test]
async fn sync_stops_when_query_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/databases/{DATABASE_ID}/query")))
        .respond_with(notion_error(404))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let images = ThemeMap::from_reader("theme,url\nTech,http://a\n".as_bytes())
        .expect("Failed to load mapping");
    let err = sync_covers(
        &client(&server),
        DATABASE_ID,
        &images,
        &PropertyNames::default(),
    )
    .await
    .expect_err("query should be rejected");

    assert!(matches!(err, SyncError::QueryRejected { code: 400, .. }));
}
