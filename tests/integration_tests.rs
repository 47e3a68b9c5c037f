use everyplay::{json, Config, FileUpload, ParamTree, RestClient, RestError, USER_AGENT};
use mockito::{Matcher, Server, ServerGuard};
use std::io::Write;

fn client_for(server: &ServerGuard) -> RestClient {
    let config = Config::new("foo")
        .with_site(server.host_with_port())
        .with_ssl(false);
    RestClient::new(config).expect("failed to create client")
}

#[test]
fn test_get_sends_namespaced_query() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/videos.json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("order".into(), "popularity".into()),
            Matcher::UrlEncoded("filter[game][id]".into(), "12".into()),
            Matcher::UrlEncoded("client_id".into(), "foo".into()),
        ]))
        .match_header("user-agent", USER_AGENT)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id": 1, "title": "first"}, {"id": 2, "title": "second"}]"#)
        .create();

    let params = ParamTree::from_serialize(json!({
        "order": "popularity",
        "filter": {"game": {"id": 12}, "platform": null},
    }))
    .unwrap();
    let wrapped = client_for(&server).get("videos", params).expect("request failed");

    mock.assert();
    let list = wrapped.into_list().expect("expected a list");
    assert_eq!(list.len(), 2);
    assert_eq!(list[1].get_str("title"), Some("second"));
    assert_eq!(list.status_code, Some(200));
    assert!(list.url.as_deref().unwrap().contains("/videos.json"));
}

#[test]
fn test_post_sends_form_body() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/videos/1/comments.json")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("comment[body]".into(), "nice run".into()),
            Matcher::UrlEncoded("client_id".into(), "foo".into()),
        ]))
        .with_status(201)
        .with_body(r#"{"id": 77, "body": "nice run"}"#)
        .create();

    let params = ParamTree::new().with(
        "comment",
        ParamTree::new().with("body", "nice run"),
    );
    let resource = client_for(&server)
        .post("/videos/1/comments/", params)
        .expect("request failed")
        .into_resource()
        .expect("expected a resource");

    mock.assert();
    assert_eq!(resource.get_i64("id"), Some(77));
    assert_eq!(resource.status_code, Some(201));
}

#[test]
fn test_multipart_upload_has_bare_text_parts() {
    let mut file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("failed to create temp file");
    file.write_all(b"PNGDATA").unwrap();
    let filename = file
        .path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();

    let mut server = Server::new();
    let text_part = r#"--[0-9a-f]+\r\nContent-Disposition: form-data; name="video\[title\]"\r\n\r\nx\r\n--"#;
    let file_part = format!(
        r#"Content-Disposition: form-data; name="video\[thumbnail\]"; filename="{}"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n"#,
        filename.replace('.', r"\.")
    );
    let mock = server
        .mock("PUT", "/videos/1.json")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=[0-9a-f]+$".to_string()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(text_part.to_string()),
            Matcher::Regex(file_part),
        ]))
        .with_status(200)
        .with_body(r#"{"id": 1}"#)
        .create();

    let params = ParamTree::new().with(
        "video",
        ParamTree::new()
            .with("title", "x")
            .with("thumbnail", FileUpload::open(file.path()).unwrap()),
    );
    client_for(&server).put("videos/1", params).expect("request failed");

    mock.assert();
}

#[test]
fn test_error_string_body_surfaces_as_http_error() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/videos/0.json")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#""Video not found""#)
        .create();

    let err = client_for(&server)
        .get("videos/0", ParamTree::new())
        .unwrap_err();

    mock.assert();
    match err {
        RestError::HttpStatus { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, r#""Video not found""#);
        }
        other => panic!("expected RestError::HttpStatus, got {:?}", other),
    }
}

#[test]
fn test_invalid_json_is_parse_error() {
    let mut server = Server::new();
    server
        .mock("GET", "/me.json")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create();

    let err = client_for(&server).get("me", ParamTree::new()).unwrap_err();
    assert!(matches!(err, RestError::ResponseParse { .. }), "got {:?}", err);
}

#[test]
fn test_redirect_not_followed_when_disabled() {
    let mut server = Server::new();
    let redirect = server
        .mock("GET", "/resolve.json")
        .match_query(Matcher::Any)
        .with_status(302)
        .with_header("location", "/videos/1.json")
        .with_body(r#"{"status": "302 - Found"}"#)
        .create();
    let target = server
        .mock("GET", "/videos/1.json")
        .with_status(200)
        .with_body(r#"{"id": 1}"#)
        .expect(0)
        .create();

    let params = ParamTree::new().with("allow_redirects", false);
    let resource = client_for(&server)
        .get("resolve", params)
        .expect("redirect should not be an error")
        .into_resource()
        .unwrap();

    redirect.assert();
    target.assert();
    assert_eq!(resource.status_code, Some(302));
    assert_eq!(resource.get_str("status"), Some("302 - Found"));
}

#[test]
fn test_redirect_followed_by_default() {
    let mut server = Server::new();
    server
        .mock("GET", "/resolve.json")
        .match_query(Matcher::Any)
        .with_status(302)
        .with_header("location", "/videos/1.json")
        .create();
    let target = server
        .mock("GET", "/videos/1.json")
        .with_status(200)
        .with_body(r#"{"id": 1}"#)
        .create();

    let wrapped = client_for(&server)
        .get("resolve", ParamTree::new())
        .expect("request failed");

    target.assert();
    assert_eq!(wrapped.status_code(), Some(200));
    assert!(wrapped.url().unwrap().ends_with("/videos/1.json"));
}

#[test]
fn test_head_returns_empty_resource() {
    let mut server = Server::new();
    let mock = server
        .mock("HEAD", "/videos.json")
        .match_query(Matcher::UrlEncoded("client_id".into(), "foo".into()))
        .with_status(200)
        .create();

    let resource = client_for(&server)
        .head("videos", ParamTree::new())
        .expect("request failed")
        .into_resource()
        .unwrap();

    mock.assert();
    assert!(resource.fields().is_empty());
    assert_eq!(resource.status_code, Some(200));
}

#[test]
fn test_transport_error_passes_through() {
    let config = Config::new("foo").with_site("127.0.0.1:1").with_ssl(false);
    let client = RestClient::new(config).unwrap();

    let err = client.get("videos", ParamTree::new()).unwrap_err();
    assert!(matches!(err, RestError::Transport(_)), "got {:?}", err);
}
