//! Conversation client integration tests.

mod common;

use std::time::Duration;

use calmly::client::{ClientError, ConversationClient, DeliveryState, TokenStore};
use calmly::edge::{EdgeState, create_edge_router};
use common::{spawn_server, test_app};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn spawn_stack() -> String {
    let backend_url = spawn_server(test_app().await).await;
    let state = EdgeState::new(&backend_url, TIMEOUT).unwrap();
    spawn_server(create_edge_router(state, &[])).await
}

fn client_at(base_url: &str, tokens: TokenStore) -> ConversationClient {
    ConversationClient::new(base_url, tokens, TIMEOUT).unwrap()
}

#[tokio::test]
async fn test_list_sessions_without_token_is_empty_and_offline() {
    // An address nothing listens on: any network attempt would error,
    // so Ok proves no request was made.
    let client = client_at("http://127.0.0.1:1", TokenStore::new());
    let sessions = client.list_sessions().await.unwrap();
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn test_operations_without_token_fail_before_network() {
    let client = client_at("http://127.0.0.1:1", TokenStore::new());

    assert!(matches!(
        client.create_session().await,
        Err(ClientError::AuthenticationRequired)
    ));
    assert!(matches!(
        client.send_message("s1", "hello").await,
        Err(ClientError::AuthenticationRequired)
    ));
    assert!(matches!(
        client.get_history("s1").await,
        Err(ClientError::AuthenticationRequired)
    ));
}

#[tokio::test]
async fn test_full_conversation_flow() {
    let edge = spawn_stack().await;
    let client = client_at(&edge, TokenStore::with_token("alice"));

    let session_id = client.create_session().await.unwrap();
    assert!(!session_id.is_empty());

    let reply = client.send_message(&session_id, "I feel anxious").await.unwrap();
    assert!(!reply.response.is_empty());

    // Local view: user message committed, assistant reply appended.
    let view = client.session_view(&session_id).unwrap();
    assert_eq!(view.messages.len(), 2);
    assert!(view
        .messages
        .iter()
        .all(|m| m.state == DeliveryState::Committed));
    assert_eq!(view.messages[0].content, "I feel anxious");

    // Cached summary bumped in place, no refetch needed.
    let summaries = client.cached_summaries();
    assert_eq!(summaries[0].session_id, session_id);
    assert_eq!(summaries[0].message_count, 2);

    let history = client.get_history(&session_id).await.unwrap();
    assert_eq!(history.len(), 2);

    let sessions = client.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].message_count, 2);
}

#[tokio::test]
async fn test_empty_message_rejected_client_side() {
    let client = client_at("http://127.0.0.1:1", TokenStore::with_token("alice"));

    let result = client.send_message("s1", "   ").await;
    assert!(matches!(result, Err(ClientError::Validation(_))));
    // Rejected before being tracked.
    assert!(client.session_view("s1").is_none());
}

#[tokio::test]
async fn test_failed_send_marked_in_view() {
    let client = client_at("http://127.0.0.1:1", TokenStore::with_token("alice"));

    let result = client.send_message("s1", "hello").await;
    assert!(matches!(result, Err(ClientError::UpstreamUnavailable(_))));

    let view = client.session_view("s1").unwrap();
    assert_eq!(view.messages.len(), 1);
    assert_eq!(view.messages[0].state, DeliveryState::Failed);
}

#[tokio::test]
async fn test_server_error_envelope_surfaces_as_api_error() {
    let edge = spawn_stack().await;
    let client = client_at(&edge, TokenStore::with_token("alice"));

    match client.get_history("no-such-session").await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, 404);
            assert!(message.contains("no-such-session"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_token_cleared_mid_flight() {
    let edge = spawn_stack().await;
    let tokens = TokenStore::with_token("alice");
    let client = client_at(&edge, tokens.clone());

    client.create_session().await.unwrap();
    tokens.clear();

    assert!(client.list_sessions().await.unwrap().is_empty());
    assert!(matches!(
        client.create_session().await,
        Err(ClientError::AuthenticationRequired)
    ));
}
