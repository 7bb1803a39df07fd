//! Integration tests for the Cadence HTTP client

use cadence_core::{EndReason, MemorySessionStore, Role, Session, SessionEvent, SessionManager, User};
use cadence_http::client::{ApiClient, error::ClientError};
use cadence_http::types::{
    LoginRequest, NewPlaylist, NewTrack, NewUser, PageRequest, PlaylistUpdate, TrackMode,
    UploadFile, UserUpdate,
};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn timestamp() -> DateTime<Utc> {
    "2024-03-01T10:00:00Z".parse().unwrap()
}

fn user_json(role: &str) -> Value {
    json!({
        "id": "u1",
        "name": "Ada",
        "email": "ada@example.com",
        "role": role,
        "created_at": "2024-03-01T10:00:00Z",
        "updated_at": "2024-03-01T10:00:00Z"
    })
}

fn track_json(id: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Track {id}"),
        "artist": "Nina",
        "album": "",
        "genre": "jazz",
        "release_year": 1965,
        "duration": 180,
        "file_id": "f1",
        "playlist_ids": null,
        "created_at": "2024-03-01T10:00:00Z",
        "updated_at": "2024-03-01T10:00:00Z"
    })
}

fn playlist_json(track_ids: &[&str]) -> Value {
    json!({
        "id": "p1",
        "title": "Road trip",
        "album_cover": "",
        "track_ids": track_ids,
        "created_at": "2024-03-01T10:00:00Z",
        "updated_at": "2024-03-01T10:00:00Z"
    })
}

fn signed_in(token: &str) -> SessionManager {
    let user = User {
        id: "u1".to_string(),
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        role: Role::Artist,
        created_at: timestamp(),
        updated_at: timestamp(),
    };
    let store = MemorySessionStore::with_session(Session::new(token, user));
    SessionManager::new(Arc::new(store))
}

fn client(server: &MockServer, session: SessionManager) -> ApiClient {
    ApiClient::builder()
        .base_url(format!("{}/api", server.uri()))
        .session(session)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_client_builder() {
    let client = ApiClient::builder()
        .base_url("http://localhost:8080/api/")
        .build();

    assert!(client.is_ok());
    let client = client.unwrap();
    assert_eq!(client.base_url(), "http://localhost:8080/api");
    assert_eq!(
        client.track_stream_url("t1").unwrap(),
        "http://localhost:8080/api/tracks/stream/t1"
    );
    assert_eq!(
        client.playlist_stream_url("p 1").unwrap(),
        "http://localhost:8080/api/playlists/stream/p%201"
    );
}

#[tokio::test]
async fn test_client_builder_requires_base_url() {
    let result = ApiClient::builder().build();
    assert!(matches!(result, Err(ClientError::Configuration(_))));

    let result = ApiClient::new("not a url");
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[tokio::test]
async fn test_token_attached_when_signed_in() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tracks/t1"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(track_json("t1")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, signed_in("t1"));
    let track = client.get_track("t1").await.unwrap();
    assert_eq!(track.title, "Track t1");
    assert!(track.playlist_ids.is_empty());
}

#[tokio::test]
async fn test_no_authorization_header_when_signed_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [track_json("t1")],
            "page": 1,
            "limit": 12,
            "total_count": 1
        })))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, SessionManager::in_memory());
    let page = client.list_tracks(PageRequest::default()).await.unwrap();
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.total_count, Some(1));

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_pagination_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tracks/search"))
        .and(query_param("q", "blue"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "page": 2,
            "limit": 100
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, signed_in("t1"));
    let page = client
        .search_tracks("blue", PageRequest::new(2, 1000))
        .await
        .unwrap();
    assert!(page.data.is_empty());
    assert_eq!(page.limit, 100);
}

#[tokio::test]
async fn test_my_playlists_filter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/playlists"))
        .and(query_param("myPlaylists", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [playlist_json(&[])],
            "page": 1,
            "limit": 12
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, signed_in("t1"));
    let page = client
        .list_playlists(PageRequest::default(), true)
        .await
        .unwrap();
    assert_eq!(page.data[0].title, "Road trip");
}

#[tokio::test]
async fn test_playlist_tracks_keep_order() {
    let mock_server = MockServer::start().await;

    for id in ["t1", "t2", "t3"] {
        Mock::given(method("GET"))
            .and(path(format!("/api/tracks/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(track_json(id)))
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/api/playlists/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(playlist_json(&["t3", "t1", "t2"])))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, signed_in("t1"));
    let playlist = client.get_playlist("p1").await.unwrap();
    let tracks = client.playlist_tracks(&playlist).await.unwrap();
    let ids: Vec<_> = tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["t3", "t1", "t2"]);
}

fn profile_json(role: &str) -> Value {
    json!({
        "id": "u2",
        "username": "grace",
        "email": "grace@example.com",
        "avatar": "",
        "role": role,
        "favorite_track_ids": null,
        "playlist_ids": null,
        "created_at": "2024-03-01T10:00:00Z",
        "updated_at": "2024-03-01T10:00:00Z"
    })
}

#[tokio::test]
async fn test_ids_cannot_escape_their_route() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "page": 1,
            "limit": 12
        })))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "track not found"})))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, signed_in("t1"));
    let result = client.get_track("../users").await;
    assert!(matches!(result, Err(ClientError::NotFound(_))));

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.path(), "/api/tracks/..%2Fusers");
}

#[tokio::test]
async fn test_playlist_with_server_timestamps() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/playlists/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p1",
            "title": "Road trip",
            "album_cover": "",
            "track_ids": ["t1"],
            "created_at": "2024-03-01 10:00:00.123 +0000 UTC",
            "updated_at": "2024-03-01 10:00:00.123 +0000 UTC"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, signed_in("t1"));
    let playlist = client.get_playlist("p1").await.unwrap();
    let expected: DateTime<Utc> = "2024-03-01T10:00:00.123Z".parse().unwrap();
    assert_eq!(playlist.created_at, expected);
    assert_eq!(playlist.updated_at, expected);
}

#[tokio::test]
async fn test_create_user_sends_only_set_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/users"))
        .and(header("authorization", "Bearer t1"))
        .and(body_json(json!({
            "username": "grace",
            "email": "grace@example.com",
            "password": "pw"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(profile_json("user")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, signed_in("t1"));
    let user = client
        .create_user(&NewUser {
            username: "grace".into(),
            email: "grace@example.com".into(),
            password: "pw".into(),
            avatar: None,
        })
        .await
        .unwrap();
    assert_eq!(user.id, "u2");
    assert_eq!(user.role, Role::User);
    assert!(user.favorite_track_ids.is_empty());
}

#[tokio::test]
async fn test_update_user_role_is_lowercase() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/users/u2"))
        .and(body_json(json!({"role": "artist"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json("artist")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, signed_in("t1"));
    let user = client
        .update_user(
            "u2",
            &UserUpdate {
                role: Some(Role::Artist),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(user.role, Role::Artist);
}

#[tokio::test]
async fn test_upload_track_is_multipart() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/tracks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(track_json("t9")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, signed_in("t1"));
    let track = client
        .upload_track(NewTrack {
            title: Some("Sinnerman".into()),
            artist: "Nina".into(),
            album: None,
            genre: Some("jazz".into()),
            release_year: Some(1965),
            file: UploadFile::new("sinnerman.mp3", b"ID3".to_vec()),
            playlist_ids: vec![],
        })
        .await
        .unwrap();
    assert_eq!(track.id, "t9");

    let requests = mock_server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"artist\""));
    assert!(body.contains("filename=\"sinnerman.mp3\""));
}

#[tokio::test]
async fn test_create_and_update_playlist() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/playlists"))
        .respond_with(ResponseTemplate::new(201).set_body_json(playlist_json(&["t1"])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/playlists/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(playlist_json(&["t2"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, signed_in("t1"));
    let created = client
        .create_playlist(NewPlaylist {
            title: "Road trip".into(),
            album_cover: None,
            track_ids: vec!["t1".into()],
        })
        .await
        .unwrap();
    assert_eq!(created.track_ids, ["t1"]);

    let updated = client
        .update_playlist(
            "p1",
            PlaylistUpdate {
                track_ids: vec!["t2".into()],
                mode: TrackMode::Overwrite,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.track_ids, ["t2"]);

    let requests = mock_server.received_requests().await.unwrap();
    let patch_body = String::from_utf8_lossy(&requests[1].body);
    assert!(patch_body.contains("overwrite"));
}

#[tokio::test]
async fn test_favorites_and_delete() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/users/u1/favorites/t1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/users/u1/favorites/t1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/tracks/t1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, signed_in("t1"));
    client.add_favorite("u1", "t1").await.unwrap();
    client.remove_favorite("u1", "t1").await.unwrap();
    client.delete_track("t1").await.unwrap();
}

#[tokio::test]
async fn test_error_handling() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tracks/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "track not found"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/users/u2"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "admin only"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/u2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, signed_in("t1"));

    match client.get_track("missing").await {
        Err(ClientError::NotFound(message)) => assert_eq!(message, "track not found"),
        other => panic!("unexpected result: {other:?}"),
    }
    match client.delete_user("u2").await {
        Err(ClientError::Forbidden(message)) => assert_eq!(message, "admin only"),
        other => panic!("unexpected result: {other:?}"),
    }
    match client.get_user("u2").await {
        Err(ClientError::ServerError { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_login_stores_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "ada@example.com", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "t1",
            "user": user_json("admin")
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = SessionManager::in_memory();
    let mut events = session.subscribe();
    let client = client(&mock_server, session.clone());

    let response = client
        .login(&LoginRequest {
            email: "ada@example.com".into(),
            password: "pw".into(),
        })
        .await
        .unwrap();
    assert_eq!(response.user.role, Role::Admin);
    assert_eq!(session.access_token().await.unwrap().as_deref(), Some("t1"));
    assert!(session.has_role(&[Role::Admin]).await.unwrap());
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::SignedIn {
            user_id: "u1".into()
        }
    );

    // Login itself went out without a bearer token
    let requests = mock_server.received_requests().await.unwrap();
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_logout_is_best_effort() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = signed_in("t1");
    let mut events = session.subscribe();
    let client = client(&mock_server, session.clone());

    client.logout().await.unwrap();
    assert_eq!(session.current().await.unwrap(), None);
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::Ended {
            reason: EndReason::LoggedOut
        }
    );
}
