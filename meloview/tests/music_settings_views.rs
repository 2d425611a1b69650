//! Music and settings pages against a mock backend

use meloapi::{IdentityKey, MeloApi, MeloClient, Music, UserSettings};
use meloplayer::{DetachedElement, MediaCommand, PlaybackPhase, Player};
use melosession::{Identity, MemorySessionStore, SessionContext};
use meloview::{MusicView, SettingsView};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client(server: &MockServer) -> (MeloClient, Arc<SessionContext>) {
    let session = Arc::new(SessionContext::new(Arc::new(MemorySessionStore::new())));
    session.restore().await;
    let client = MeloClient::new(
        MeloApi::new(server.uri()).unwrap(),
        session.clone(),
        IdentityKey::Subject,
    );
    (client, session)
}

fn alice() -> Identity {
    Identity::new("sub-alice")
        .with_username("alice")
        .with_id_token("alice-token")
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
}

fn track(id: &str, url: Option<&str>) -> Music {
    Music {
        id: id.into(),
        title: format!("Track {}", id),
        storage_key: format!("{}.mp3", id),
        presigned_url: url.map(str::to_string),
    }
}

#[tokio::test]
async fn test_upload_file_reloads_the_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/music/list"))
        .respond_with(ok(json!({
            "music_list": [{"music_id": "1", "title": "riff", "s3_key": "1.wav"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/music"))
        .and(header("Authorization", "Bearer alice-token"))
        .and(body_json(json!({"music": "UklGRg==", "title": "riff", "extension": "wav"})))
        .respond_with(ok(json!({"music_id": "1", "title": "riff", "s3_key": "1.wav"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, session) = client(&server).await;
    session.login(alice()).await;
    let view = MusicView::new(client, Player::with_default_volume(DetachedElement::new()).unwrap());

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("riff.wav");
    std::fs::write(&file, b"RIFF").unwrap();

    let uploaded = view.upload_file(&file).await.unwrap();
    assert!(uploaded.is_fresh());

    let state = view.state();
    assert!(!state.is_loading);
    assert_eq!(state.tracks.len(), 1);
    assert_eq!(state.tracks[0].title, "riff");
}

#[tokio::test]
async fn test_failed_delete_keeps_the_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/music/list"))
        .respond_with(ok(json!({
            "music_list": [{"music_id": "1", "title": "A", "s3_key": "a.mp3"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/music"))
        .and(query_param("music_id", "1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (client, session) = client(&server).await;
    session.login(alice()).await;
    let view = MusicView::new(client, Player::with_default_volume(DetachedElement::new()).unwrap());

    view.load().await;
    assert!(!view.delete("1").await.is_fresh());

    let state = view.state();
    assert!(!state.is_loading);
    assert_eq!(state.tracks.len(), 1);
}

#[tokio::test]
async fn test_preferred_music_follows_published_settings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/settings"))
        .respond_with(ok(json!({"email": "a@x.io", "username": "alice", "music_id": "5"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/user/settings"))
        .respond_with(ok(json!({"email": "a@x.io", "username": "alice", "music_id": "9"})))
        .mount(&server)
        .await;

    let (client, session) = client(&server).await;
    session.login(alice()).await;
    let view = MusicView::new(
        client.clone(),
        Player::with_default_volume(DetachedElement::new()).unwrap(),
    );
    let tracking = view.spawn_preferred_tracking();

    client.users().settings().await;
    let mut updates = view.observe();
    tokio::time::timeout(Duration::from_secs(2), async {
        while updates.next().await.unwrap().preferred_music_id != "5" {}
    })
    .await
    .unwrap();

    view.set_preferred("9").await;
    assert_eq!(view.state().preferred_music_id, "9");

    tracking.abort();
}

#[tokio::test]
async fn test_play_loads_the_presigned_url() {
    let server = MockServer::start().await;
    let (client, _session) = client(&server).await;
    let element = DetachedElement::new();
    let view = MusicView::new(client, Player::with_default_volume(element.clone()).unwrap());

    assert!(!view.play(&track("1", None)).unwrap());
    assert_eq!(view.state().now_playing, None);

    assert!(view.play(&track("2", Some("https://bucket/2.mp3"))).unwrap());
    assert_eq!(view.state().now_playing, Some(track("2", Some("https://bucket/2.mp3"))));
    assert!(element
        .commands()
        .contains(&MediaCommand::SetSource("https://bucket/2.mp3".into())));

    view.with_player(|player| player.on_loaded_metadata(30.0)).unwrap();
    assert_eq!(view.with_player(|player| player.phase()), PlaybackPhase::Playing);
}

#[tokio::test]
async fn test_settings_reload_on_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/settings"))
        .and(query_param("user_id", "sub-alice"))
        .respond_with(ok(json!({"email": "a@x.io", "username": "alice", "music_id": "5"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/image"))
        .and(query_param("user_id", "sub-alice"))
        .respond_with(ok(json!({"image_url": "https://img/alice.png"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, session) = client(&server).await;
    let view = SettingsView::new(client);
    let reload = view.spawn_auto_reload();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(server.received_requests().await.unwrap().is_empty());

    session.login(alice()).await;

    let mut updates = view.observe();
    let state = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let state = updates.next().await.unwrap();
            if !state.is_loading() && state.headshot_url.is_some() && !state.settings.username.is_empty() {
                break state;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(state.settings.username, "alice");
    assert_eq!(state.settings.preferred_music_id, "5");
    assert_eq!(state.headshot_url.as_deref(), Some("https://img/alice.png"));

    reload.abort();
}

#[tokio::test]
async fn test_failed_submit_keeps_previous_settings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/settings"))
        .respond_with(ok(json!({"email": "a@x.io", "username": "alice", "music_id": ""})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/user/settings"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (client, session) = client(&server).await;
    session.login(alice()).await;
    let view = SettingsView::new(client);

    let loaded = view.load_settings().await.fresh().unwrap();
    let attempt = UserSettings {
        username: "mallory".into(),
        ..loaded.clone()
    };
    let fetched = view.submit_settings(&attempt).await;

    assert!(!fetched.is_fresh());
    let state = view.state();
    assert_eq!(state.settings, loaded);
    assert!(!state.is_loading());
}

#[tokio::test]
async fn test_submit_headshot_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/image"))
        .and(body_json(json!({"image": "iVBORw=="})))
        .respond_with(ok(json!({"image_url": "https://img/new.png"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, session) = client(&server).await;
    session.login(alice()).await;
    let view = SettingsView::new(client);

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("me.png");
    std::fs::write(&file, [0x89, b'P', b'N', b'G']).unwrap();

    let fetched = view.submit_headshot_file(&file).await.unwrap();
    assert!(fetched.is_fresh());
    assert_eq!(view.state().headshot_url.as_deref(), Some("https://img/new.png"));
}
