//! Liveness probe over a real socket.

use tasknag::channels::health;
use tokio::net::TcpListener;

#[tokio::test]
async fn probe_answers_on_all_routes() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(health::serve_on(listener));

    let client = reqwest::Client::new();
    for (route, expected) in [
        ("/", "🤖 Bot is up and running!"),
        ("/health", "OK"),
        ("/ping", "pong"),
    ] {
        let response = client
            .get(format!("http://{addr}{route}"))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success(), "{route}");
        assert_eq!(response.text().await.unwrap(), expected);
    }

    let missing = client
        .get(format!("http://{addr}/nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    server.abort();
}
