//! Contract tests for the game service client's error mapping.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spymaster_bot::api::{GameApi, HttpGameClient};
use spymaster_bot::errors::BotError;
use spymaster_bot::game::Team;
use spymaster_bot::models::Solver;

fn game_state_json() -> serde_json::Value {
    json!({
        "current_team": "blue",
        "current_player_role": "operative",
        "is_game_over": false,
        "board": {
            "language": "english",
            "cards": [
                { "word": "apple" },
                { "word": "boat", "color": "red", "revealed": true }
            ]
        },
        "score": {
            "blue": { "unrevealed": 4 },
            "red": { "unrevealed": 3 }
        },
        "left_guesses": 2
    })
}

/// A successful start deserializes the censored board as sent.
#[tokio::test]
async fn test_start_game_happy_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/start-game"))
        .and(body_partial_json(json!({
            "language": "english",
            "first_team": "blue"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "game_id": "game-1",
            "game_state": game_state_json()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpGameClient::new(&server.uri()).unwrap();
    let response = client.start_game("english", Team::Blue).await.unwrap();

    assert_eq!(response.game_id, "game-1");
    assert_eq!(response.game_state.board.cards.len(), 2);
    assert_eq!(response.game_state.board.cards[0].color, None);
    assert!(response.game_state.is_human_turn());
}

/// A 409 is a game rule violation carrying the server's message.
#[tokio::test]
async fn test_conflict_maps_to_rule_violation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/guess"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Invalid move",
            "details": "card already revealed"
        })))
        .mount(&server)
        .await;

    let client = HttpGameClient::new(&server.uri()).unwrap();
    let error = client.guess("game-1", 3).await.unwrap_err();

    match error {
        BotError::RuleViolation(message) => assert_eq!(message, "Invalid move"),
        other => panic!("expected RuleViolation, got {other:?}"),
    }
}

/// Any other 4xx is an upstream client error rendered "message: details".
#[tokio::test]
async fn test_bad_request_maps_to_upstream_client_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/next-move"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Unknown solver",
            "details": "expected naive or gpt"
        })))
        .mount(&server)
        .await;

    let client = HttpGameClient::new(&server.uri()).unwrap();
    let error = client.next_move("game-1", Solver::Naive).await.unwrap_err();

    assert_eq!(error.to_string(), "Unknown solver: expected naive or gpt");
    assert!(matches!(error, BotError::UpstreamClient { .. }));
}

/// A 4xx without the structured body cannot be shown to the user.
#[tokio::test]
async fn test_unreadable_client_error_body_is_unexpected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/guess"))
        .respond_with(ResponseTemplate::new(422).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = HttpGameClient::new(&server.uri()).unwrap();
    let error = client.guess("game-1", 0).await.unwrap_err();

    assert!(matches!(error, BotError::Unexpected(_)));
}

/// Server faults are never shown to the user as their own doing.
#[tokio::test]
async fn test_server_error_is_unexpected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/get-game-state"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = HttpGameClient::new(&server.uri()).unwrap();
    let error = client.get_game_state("game-1").await.unwrap_err();

    assert!(matches!(error, BotError::Unexpected(_)));
}
