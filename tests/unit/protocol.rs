//! Request handling tests, driven without sockets.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use proptest::prelude::*;
use serde_json::{json, Value};
use stepper_server::config::{ListenerConfig, Method, Route, SystemConfig};
use stepper_server::server::{CommandServer, MoveRequest, MoveResponse, ReplyStatus, Response};
use stepper_server::{FnReference, MotionControl, SharedEngine};

use super::support::{drain_ticks, engine, RecordingSink, TestEngine};

/// Potentiometer the test sets directly; `None` means unavailable.
type TestPot = FnReference<Box<dyn FnMut() -> Option<u16>>>;

type TestServer<'a> = CommandServer<&'a SharedEngine<TestEngine>, TestPot, RecordingSink>;

struct Fixture {
    engine: SharedEngine<TestEngine>,
    sample: Rc<Cell<Option<u16>>>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            engine: SharedEngine::new(engine().0),
            sample: Rc::new(Cell::new(Some(0))),
        }
    }

    fn server(&self, config: &SystemConfig) -> TestServer<'_> {
        let sample = Rc::clone(&self.sample);
        let read: Box<dyn FnMut() -> Option<u16>> = Box::new(move || sample.get());
        CommandServer::new(&self.engine, FnReference::new(read), RecordingSink::default(), config)
    }
}

fn all_routes() -> ListenerConfig {
    ListenerConfig::new(80, &Route::ALL)
}

fn get(path: &str) -> Vec<u8> {
    format!("GET {} HTTP/1.1\r\nHost: pico\r\n\r\n", path).into_bytes()
}

fn post(path: &str, body: &str) -> Vec<u8> {
    format!(
        "POST {} HTTP/1.1\r\nHost: pico\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        path,
        body.len(),
        body
    )
    .into_bytes()
}

fn json_of(response: &Response) -> Value {
    assert_eq!(response.content_type(), "application/json");
    serde_json::from_str(response.body()).expect("response body is JSON")
}

fn assert_error(response: &Response, needle: &str) {
    let body = json_of(response);
    assert_eq!(body["status"], "error", "{}", body);
    let message = body["message"].as_str().expect("message is a string");
    assert!(message.contains(needle), "{:?} does not mention {:?}", message, needle);
}

#[test]
fn test_move_then_status() {
    let fixture = Fixture::new();
    let config = SystemConfig::default();
    let mut server = fixture.server(&config);
    let listener = all_routes();

    let response = server.handle(
        &listener,
        &post("/move", r#"{"steps": 200, "direction": 1, "speed": 500}"#),
    );
    assert_eq!(
        json_of(&response),
        json!({"status": "ok", "steps": 200, "direction": 1, "speed": 500})
    );
    assert_eq!(server.sink().last(), Some("Moving: 200\nDir: CW"));

    let status = json_of(&server.handle(&listener, &get("/status")));
    assert_eq!(status, json!({"steps_remaining": 200, "direction": 1}));

    assert_eq!(drain_ticks(&fixture.engine), 200);

    let status = json_of(&server.handle(&listener, &get("/status")));
    assert_eq!(status, json!({"steps_remaining": 0, "direction": 1}));
    assert_eq!(server.sink().last(), Some("Steps: 0\nDir: CW"));
    assert_eq!(fixture.engine.status().position, 200);

    server.service_display(Instant::now());
    assert_eq!(server.sink().last(), Some("Status: Idle\nPos: 200"));
}

#[test]
fn test_home_at_reference() {
    let fixture = Fixture::new();
    let mut server = fixture.server(&SystemConfig::default());

    let response = server.handle(&all_routes(), &get("/home"));
    assert_eq!(json_of(&response), json!({"status": "ok", "position": 0}));
    assert_eq!(server.sink().last(), Some("Status: Homed\nPos: 0"));
}

#[test]
fn test_home_runs_correction_then_confirms() {
    let fixture = Fixture::new();
    let mut server = fixture.server(&SystemConfig::default());
    let listener = all_routes();

    server.handle(
        &listener,
        &post("/move", r#"{"steps": 30, "direction": 0, "speed": 500}"#),
    );
    drain_ticks(&fixture.engine);
    fixture.sample.set(Some(30 << 4));

    let response = server.handle(&listener, &post("/home", "{}"));
    assert_eq!(json_of(&response), json!({"status": "moving", "position": -30}));
    assert_eq!(server.sink().last(), Some("Status: Homing\nPos: -30"));

    drain_ticks(&fixture.engine);
    fixture.sample.set(Some(0));
    server.service_display(Instant::now());
    assert_eq!(server.sink().last(), Some("Status: Homing\nPos: 0 (re-poll)"));

    let response = server.handle(&listener, &post("/home", ""));
    assert_eq!(json_of(&response), json!({"status": "ok", "position": 0}));
}

#[test]
fn test_finished_move_does_not_overwrite_newer_command() {
    let fixture = Fixture::new();
    let mut config = SystemConfig::default();
    config.display.refresh_ms = 0;
    let mut server = fixture.server(&config);
    let listener = all_routes();

    server.handle(
        &listener,
        &post("/move", r#"{"steps": 3, "direction": 1, "speed": 500}"#),
    );
    drain_ticks(&fixture.engine);
    server.handle(
        &listener,
        &post("/move", r#"{"steps": 50, "direction": 1, "speed": 500}"#),
    );
    server.service_display(Instant::now());
    assert_eq!(server.sink().last(), Some("Moving: 50\nDir: CW"));
    assert_eq!(fixture.engine.status().steps_remaining, 50);

    // A correction that finished unreported is superseded by the confirming poll.
    drain_ticks(&fixture.engine);
    fixture.sample.set(Some(53 << 4));
    let response = server.handle(&listener, &get("/home"));
    assert_eq!(json_of(&response)["status"], "moving");
    drain_ticks(&fixture.engine);
    fixture.sample.set(Some(0));
    let response = server.handle(&listener, &get("/home"));
    assert_eq!(json_of(&response), json!({"status": "ok", "position": 0}));
    server.service_display(Instant::now());
    assert_eq!(server.sink().last(), Some("Status: Homed\nPos: 0"));

    server.handle(
        &listener,
        &post("/move", r#"{"steps": 8, "direction": 0, "speed": 500}"#),
    );
    drain_ticks(&fixture.engine);
    server.handle(&listener, &post("/stop", ""));
    server.service_display(Instant::now());
    assert_eq!(server.sink().last(), Some("Status: Stopped\nPos: -8"));
}

#[test]
fn test_oversized_moves_are_rejected_as_too_large() {
    let fixture = Fixture::new();
    let mut server = fixture.server(&SystemConfig::default());
    let listener = all_routes();

    let requests = [
        post("/move_to", r#"{"position": 5000000000, "speed": 100}"#),
        post("/move", r#"{"steps": 5000000000, "direction": 1, "speed": 100}"#),
    ];
    for request in &requests {
        let response = server.handle(&listener, request);
        assert_error(&response, "too large");
        let message = json_of(&response)["message"].to_string();
        assert!(!message.contains("Must be >= 0"), "{}", message);
        assert!(fixture.engine.status().is_idle());
        assert_eq!(fixture.engine.status().position, 0);
    }
}

#[test]
fn test_malformed_move_leaves_state_unchanged() {
    let fixture = Fixture::new();
    let mut server = fixture.server(&SystemConfig::default());
    let listener = all_routes();

    server.handle(
        &listener,
        &post("/move", r#"{"steps": 10, "direction": 1, "speed": 500}"#),
    );
    fixture.engine.tick();
    let before = fixture.engine.status();

    let cases = [
        (r#"{"steps": 10, "direction": 1}"#, "speed"),
        (r#"{"steps": "ten", "direction": 1, "speed": 5}"#, "invalid type"),
        (r#"{"steps": 10, "direction": 2, "speed": 5}"#, "direction must be 0 or 1"),
        (r#"{"steps": -4, "direction": 1, "speed": 5}"#, "Invalid step count"),
        (r#"{"steps": 4, "direction": 1, "speed": 0}"#, "Invalid step frequency"),
        (r#"{"steps": 4"#, "EOF"),
        ("", "EOF"),
    ];
    for (body, needle) in cases {
        assert_error(&server.handle(&listener, &post("/move", body)), needle);
        assert_eq!(fixture.engine.status(), before, "state changed by {:?}", body);
    }
}

#[test]
fn test_move_by_query_string() {
    let fixture = Fixture::new();
    let mut server = fixture.server(&SystemConfig::default());

    let response = server.handle(&all_routes(), &get("/move?steps=12&direction=0&speed=250"));
    assert_eq!(
        json_of(&response),
        json!({"status": "ok", "steps": 12, "direction": 0, "speed": 250})
    );
    drain_ticks(&fixture.engine);
    assert_eq!(fixture.engine.status().position, -12);

    let response = server.handle(&all_routes(), &get("/move?steps=12&speed=250"));
    assert_error(&response, "missing parameter `direction`");
}

#[test]
fn test_move_to_and_stop() {
    let fixture = Fixture::new();
    let mut server = fixture.server(&SystemConfig::default());
    let listener = all_routes();

    let response = server.handle(&listener, &post("/move_to", r#"{"position": 40, "speed": 100}"#));
    assert_eq!(
        json_of(&response),
        json!({"status": "moving", "position": 0, "target": 40})
    );

    for _ in 0..15 {
        fixture.engine.tick();
    }
    let response = server.handle(&listener, &post("/stop", ""));
    assert_eq!(json_of(&response), json!({"status": "ok", "position": 15}));
    assert_eq!(server.sink().last(), Some("Status: Stopped\nPos: 15"));
    assert!(fixture.engine.status().is_idle());

    let response = server.handle(&listener, &post("/move_to", r#"{"position": 15, "speed": 100}"#));
    assert_eq!(
        json_of(&response),
        json!({"status": "ok", "position": 15, "target": 15})
    );
}

#[test]
fn test_pot_reading() {
    let fixture = Fixture::new();
    let mut server = fixture.server(&SystemConfig::default());

    fixture.sample.set(Some(0xFFFF));
    let response = server.handle(&all_routes(), &get("/pot"));
    assert_eq!(json_of(&response), json!({"potentiometer": 4095}));

    fixture.sample.set(None);
    let response = server.handle(&all_routes(), &get("/pot"));
    assert_error(&response, "homing reference unavailable");
}

#[test]
fn test_routes_follow_listener_config() {
    let fixture = Fixture::new();
    let mut config = SystemConfig::default();
    config.server.home_methods.clear();
    config.server.home_methods.push(Method::Post).expect("capacity");
    let mut server = fixture.server(&config);

    let panel_port = ListenerConfig::new(8080, &[Route::Move, Route::Pot, Route::Panel]);
    assert_error(&server.handle(&panel_port, &get("/status")), "No route for GET /status");
    assert_error(&server.handle(&all_routes(), &get("/nope")), "No route for GET /nope");
    assert_error(&server.handle(&all_routes(), &get("/home")), "No route for GET /home");
    assert_error(&server.handle(&all_routes(), &get("/stop")), "No route for GET /stop");

    let panel = server.handle(&panel_port, &get("/"));
    assert_eq!(panel.content_type(), "text/html");
    assert!(panel.body().contains("/move?steps="));
}

#[test]
fn test_garbage_request() {
    let fixture = Fixture::new();
    let mut server = fixture.server(&SystemConfig::default());

    assert_error(&server.handle(&all_routes(), b"\x00\x01\x02"), "");
    assert_error(&server.handle(&all_routes(), b"BREW /pot HTCPCP/1.0\r\n\r\n"), "");
    assert!(fixture.engine.status().is_idle());
}

#[test]
fn test_display_refresh_while_idle() {
    let fixture = Fixture::new();
    let mut config = SystemConfig::default();
    config.display.refresh_ms = 100;
    let mut server = fixture.server(&config);
    fixture.sample.set(Some(0x0420));

    let start = Instant::now();
    server.service_display(start);
    assert_eq!(server.sink().last(), Some("Pot: 66"));

    fixture.sample.set(Some(0x0100));
    server.service_display(start + Duration::from_millis(50));
    assert_eq!(server.sink().last(), Some("Pot: 66"));

    server.service_display(start + Duration::from_millis(150));
    assert_eq!(server.sink().last(), Some("Pot: 16"));

    // Motion messages are not overwritten while moving.
    server.handle(
        &all_routes(),
        &post("/move", r#"{"steps": 5, "direction": 1, "speed": 500}"#),
    );
    server.service_display(start + Duration::from_millis(300));
    assert_eq!(server.sink().last(), Some("Moving: 5\nDir: CW"));
}

proptest! {
    /// An accepted `/move` echoes its parameters.
    #[test]
    fn prop_move_response_echoes_request(
        steps in 0i64..10_000,
        direction in 0i64..=1,
        speed in 1i64..50_000,
    ) {
        let fixture = Fixture::new();
        let mut server = fixture.server(&SystemConfig::default());
        let request = MoveRequest { steps, direction, speed };
        let body = serde_json::to_string(&request).unwrap();

        let response = server.handle(&all_routes(), &post("/move", &body));
        let reply: MoveResponse = serde_json::from_str(response.body()).unwrap();

        prop_assert_eq!(reply.status, ReplyStatus::Ok);
        prop_assert_eq!(
            MoveRequest { steps: reply.steps, direction: reply.direction, speed: reply.speed },
            request
        );
        prop_assert_eq!(fixture.engine.status().steps_remaining, steps as u32);
    }
}
