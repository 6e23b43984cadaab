mod common;

use std::time::Duration;
use gymlens::classify::{classify_response, UpstreamFailure};
use gymlens::dispatch::RequestDispatcher;
use gymlens::failover::RetryPolicy;
use gymlens::providers::Transport;
use gymlens::request::InferenceRequest;
use gymlens::ErrorKind;
use common::{ok, status, ScriptedTransport};

fn request() -> InferenceRequest
{   InferenceRequest::builder("gpt-3.5-turbo")
      .user("Hi")
      .build()
}

#[tokio::test(start_paused = true)]
async fn test_billing_is_not_retried()
{   common::init_logging();
    let transport = ScriptedTransport::always(
      status(429, "You exceeded your current quota, please check your plan and billing details")
    );
    let dispatcher = RequestDispatcher::new(transport.clone(), RetryPolicy::default());

    let err = dispatcher.dispatch(&request()).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Billing));
    assert!(err.is_billing());
    assert_eq!(transport.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_402_and_403_are_billing()
{   for code in [402, 403]
    {   let transport = ScriptedTransport::always(status(code, "nope"));
        let dispatcher = RequestDispatcher::new(transport.clone(), RetryPolicy::default());
        let err = dispatcher.dispatch(&request()).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Billing));
        assert_eq!(transport.attempts(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_retries_with_linear_backoff()
{   common::init_logging();
    let transport = ScriptedTransport::always(status(429, "Rate limit reached"));
    let dispatcher = RequestDispatcher::new(transport.clone(), RetryPolicy::new(3, 1000));

    let started = tokio::time::Instant::now();
    let err = dispatcher.dispatch(&request()).await.unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(transport.attempts(), 3);
    assert_eq!(err.kind(), Some(ErrorKind::RateLimited));
    // 1s after the first attempt, 2s after the second, none after the last
    assert!(elapsed >= Duration::from_secs(3));
    assert!(elapsed < Duration::from_secs(6));
    match err
    {   gymlens::Error::Fatal { attempts, .. } => assert_eq!(attempts, 3)
      , other => panic!("unexpected error: {}", other)
    }
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_transient_failures()
{   let transport = ScriptedTransport::new(vec![
      Err(UpstreamFailure::new(ErrorKind::Timeout, "timed out"))
    , Err(UpstreamFailure::new(ErrorKind::NetworkError, "connection reset"))
    , ok("pong")
    ]);
    let dispatcher = RequestDispatcher::new(transport.clone(), RetryPolicy::default());

    assert_eq!(dispatcher.dispatch(&request()).await.unwrap(), "pong");
    assert_eq!(transport.attempts(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_empty_choices_are_retried_as_parse_errors()
{   let transport = ScriptedTransport::new(vec![
      Ok(gymlens::providers::RawResponse::new(200, r#"{"choices":[]}"#))
    , ok("second time lucky")
    ]);
    let dispatcher = RequestDispatcher::new(transport.clone(), RetryPolicy::default());

    assert_eq!(dispatcher.dispatch(&request()).await.unwrap(), "second time lucky");
    assert_eq!(transport.attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fatal_kinds_stop_immediately()
{   let cases = [
      (401, "Incorrect API key provided", ErrorKind::InvalidCredential)
    , (404, "The model `gpt-9` does not exist", ErrorKind::ModelNotFound)
    , (500, "Internal server error", ErrorKind::UnexpectedFormat)
    ];
    for (code, message, kind) in cases
    {   let transport = ScriptedTransport::always(status(code, message));
        let dispatcher = RequestDispatcher::new(transport.clone(), RetryPolicy::default());
        let err = dispatcher.dispatch(&request()).await.unwrap_err();
        assert_eq!(err.kind(), Some(kind));
        assert_eq!(transport.attempts(), 1);
        assert!(err.to_string().contains(message));
    }
}

#[tokio::test]
async fn test_missing_key_fails_without_network()
{   let config = gymlens::config::ProviderConfig
    {   api_key: None
      , ..Default::default()
    };
    let transport = gymlens::providers::OpenAiTransport::new(&config).unwrap();
    let dispatcher = RequestDispatcher::new(
      std::sync::Arc::new(transport)
    , RetryPolicy::default()
    );
    let err = dispatcher.dispatch(&request()).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InvalidCredential));
}

#[test]
fn test_classification_is_idempotent()
{   let bodies = [
      (429, r#"{"error":{"message":"Rate limit reached"}}"#)
    , (400, r#"{"error":{"message":"bad","code":"insufficient_quota"}}"#)
    , (404, "not json at all")
    , (503, "")
    ];
    for (code, body) in bodies
    {   assert_eq!(classify_response(code, body), classify_response(code, body));
    }
}

#[test]
fn test_payment_message_alone_is_billing()
{   for code in [400, 429, 500]
    {   let failure = classify_response(
          code
        , r#"{"error":{"message":"Payment method declined"}}"#
        );
        assert_eq!(failure.kind, ErrorKind::Billing);
    }
    assert_eq!(classify_response(429, "payment").kind, ErrorKind::Billing);
}

fn provider_at(api_base: String, timeout_secs: u64) -> gymlens::providers::OpenAiTransport
{   let config = gymlens::config::ProviderConfig
    {   api_base
      , api_key: Some("sk-test".to_string())
      , timeout_secs
    };
    gymlens::providers::OpenAiTransport::new(&config).unwrap()
}

#[tokio::test]
async fn test_refused_connection_is_network_error()
{   common::init_logging();
    // Bind then release a port so nothing is listening on it
    let port = std::net::TcpListener::bind("127.0.0.1:0")
      .unwrap()
      .local_addr()
      .unwrap()
      .port();
    let transport = provider_at(format!("http://127.0.0.1:{}", port), 5);

    let failure = transport.send(&request()).await.unwrap_err();
    assert_eq!(failure.kind, ErrorKind::NetworkError);
}

#[tokio::test]
async fn test_silent_server_is_timeout()
{   common::init_logging();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept connections and never answer
    let server = tokio::spawn(async move {
      let mut held = Vec::new();
      while let Ok((socket, _)) = listener.accept().await
      {   held.push(socket);
      }
    });
    let transport = provider_at(format!("http://{}", addr), 1);

    let failure = transport.send(&request()).await.unwrap_err();
    assert_eq!(failure.kind, ErrorKind::Timeout);

    let dispatcher = RequestDispatcher::new(
      std::sync::Arc::new(transport)
    , RetryPolicy::new(2, 10)
    );
    let err = dispatcher.dispatch(&request()).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Timeout));
    server.abort();
}
