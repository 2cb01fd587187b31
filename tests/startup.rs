//! Startup behaviour against a real listener.

use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

use cloudevents_gateway::config::{ConfigError, GatewayConfig, ModeSettings};
use cloudevents_gateway::handler::builtin::builtin_catalog;
use cloudevents_gateway::lifecycle::{launch, prepare, Shutdown, StartupError, StopReason};

mod common;

#[tokio::test]
async fn test_missing_expression_never_binds() {
    let addr = common::unused_addr().await;
    let routes = common::temp_file(
        "missing-expression.json",
        r#"{"good.local": "{\"expression\": \"true\"}", "bad.local": "{\"cases\": []}"}"#,
    );

    let mut config = GatewayConfig::default();
    config.listener.bind_address = addr.to_string();
    let settings = ModeSettings::FilterDispatcher { routes: routes.clone() };
    let shutdown = Shutdown::new();

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        launch(&config, &settings, &builtin_catalog(), shutdown.listener()),
    )
    .await
    .expect("launch must fail fast");

    match result {
        Err(StartupError::Config(ConfigError::Validation(errors))) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].to_string().contains("bad.local"));
        }
        other => panic!("expected a validation error, got {:?}", other),
    }

    assert!(TcpStream::connect(addr).await.is_err());

    let client = reqwest::Client::new();
    assert!(client
        .post(format!("http://{}/", addr))
        .body("{}")
        .send()
        .await
        .is_err());

    std::fs::remove_file(routes).ok();
}

#[tokio::test]
async fn test_missing_routes_file_never_binds() {
    let addr = common::unused_addr().await;
    let mut config = GatewayConfig::default();
    config.listener.bind_address = addr.to_string();
    let settings = ModeSettings::SwitchDispatcher {
        routes: "/definitely/not/here.json".into(),
    };

    let result = launch(&config, &settings, &builtin_catalog(), Shutdown::new().listener()).await;
    assert!(matches!(result, Err(StartupError::Config(ConfigError::Io { .. }))));
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_serves_and_shuts_down() {
    let config = GatewayConfig::default();
    let settings = ModeSettings::Function {
        handlers: vec!["echo".to_string()],
        dispatch: false,
    };
    let server = prepare(&config, &settings, &builtin_catalog()).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let task = tokio::spawn(server.run(listener, shutdown.listener()));

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{}/", addr))
        .header("ce-id", "abc")
        .header("ce-type", "demo")
        .body(r#"{"n": 5}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.headers()["ce-id"], "abc");
    assert!(response.headers().contains_key("x-request-id"));
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"n": 5}));

    let response = client
        .post(format!("http://{}/", addr))
        .body("{oops")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    drop(response);
    drop(client);

    assert!(shutdown.trigger(StopReason::Requested));
    let result = tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_launch_serves_configured_address() {
    let addr = common::unused_addr().await;
    let mut config = GatewayConfig::default();
    config.listener.bind_address = addr.to_string();
    let settings = ModeSettings::Filter {
        expression: "event.type === 'keep'".to_string(),
    };

    let shutdown = Shutdown::new();
    let listener = shutdown.listener();
    let task = tokio::spawn(async move { launch(&config, &settings, &builtin_catalog(), listener).await });

    let client = reqwest::Client::new();
    let mut kept = None;
    for _ in 0..50 {
        match client
            .post(format!("http://{}/", addr))
            .header("ce-type", "keep")
            .body("kept")
            .send()
            .await
        {
            Ok(response) => {
                kept = Some(response);
                break;
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
    let kept = kept.expect("gateway never came up");
    assert_eq!(kept.status(), reqwest::StatusCode::OK);
    assert_eq!(kept.text().await.unwrap(), "kept");

    let dropped = client
        .post(format!("http://{}/", addr))
        .header("ce-type", "other")
        .body("dropped")
        .send()
        .await
        .unwrap();
    assert_eq!(dropped.status(), reqwest::StatusCode::OK);
    assert_eq!(dropped.text().await.unwrap(), "");
    drop(client);

    assert!(shutdown.trigger(StopReason::Requested));
    let result = tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    assert!(result.is_ok());
}
