//! Integration tests: the session state machine against a scripted
//! engine peer over real loopback round trips.

use chrono::NaiveDate;
use sluice_core::WireValue;
use sluice_session::{Session, SessionError, SessionState, StepOutcome};
use sluice_test_utils::{StubEngine, StubScript};
use sluice_wire::frame::{read_frames, write_frames};
use sluice_wire::Listener;
use std::net::TcpStream;
use std::thread;

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
}

/// Bind, spawn the stub, accept, and complete the handshake.
fn establish(script: StubScript) -> (Session, StubEngine) {
    let listener = Listener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let stub = StubEngine::spawn(addr, script);
    let channel = listener.accept().unwrap();
    let session = Session::establish(channel).unwrap();
    (session, stub)
}

/// Run a hand-rolled peer for tests the scripted stub cannot express.
fn with_raw_peer<F>(peer: F) -> Session
where
    F: FnOnce(&mut TcpStream) + Send + 'static,
{
    let listener = Listener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let mut stream = TcpStream::connect(addr).unwrap();
        peer(&mut stream);
    });
    let channel = listener.accept().unwrap();
    Session::establish(channel).unwrap()
}

// ── Handshake ───────────────────────────────────────────────────

#[test]
fn handshake_reaches_ready() {
    let (session, stub) = establish(StubScript::new(start_date(), 1));
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.steps_completed(), 0);
    drop(session);
    let seen = stub.finish();
    assert_eq!(seen[0].name, "ok");
    assert_eq!(seen[0].step, 0);
}

#[test]
fn wrong_connect_token_is_a_violation() {
    let listener = Listener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let mut stream = TcpStream::connect(addr).unwrap();
        write_frames(&mut stream, &[b"hello".to_vec()]).unwrap();
    });
    let channel = listener.accept().unwrap();
    let err = Session::establish(channel).unwrap_err();
    assert_eq!(
        err,
        SessionError::UnexpectedToken {
            state: SessionState::AwaitingConnect,
            token: "hello".to_string(),
        }
    );
}

#[test]
fn wrong_setup_token_is_a_violation() {
    let listener = Listener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let mut stream = TcpStream::connect(addr).unwrap();
        write_frames(&mut stream, &[b"connect".to_vec()]).unwrap();
        let reply = read_frames(&mut stream).unwrap();
        assert_eq!(reply[0], b"ok".to_vec());
        write_frames(&mut stream, &[b"teardown".to_vec()]).unwrap();
    });
    let channel = listener.accept().unwrap();
    let err = Session::establish(channel).unwrap_err();
    assert_eq!(
        err,
        SessionError::UnexpectedToken {
            state: SessionState::AwaitingSetup,
            token: "teardown".to_string(),
        }
    );
}

// ── State machine exhaustiveness ────────────────────────────────

#[test]
fn get_outside_stepping_fails_without_sending() {
    let (mut session, stub) = establish(StubScript::new(start_date(), 1));
    let err = session.get("[Clock].Today").unwrap_err();
    assert_eq!(
        err,
        SessionError::InvalidState {
            state: SessionState::Ready,
            operation: "get",
        }
    );
    // Nothing went on the wire: the session still energizes and steps
    // cleanly, which would be impossible after a stray frame.
    session.energize().unwrap();
    assert_eq!(session.step().unwrap(), StepOutcome::Finished);
    let seen = stub.finish();
    let names: Vec<&str> = seen.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["ok", "energize", "resume"]);
}

#[test]
fn step_and_do_outside_stepping_fail() {
    let (mut session, _stub) = establish(StubScript::new(start_date(), 1));
    assert!(matches!(
        session.step().unwrap_err(),
        SessionError::InvalidState {
            operation: "step",
            ..
        }
    ));
    assert!(matches!(
        session.do_command("applyIrrigation", &[]).unwrap_err(),
        SessionError::InvalidState { operation: "do", .. }
    ));
}

#[test]
fn finished_is_terminal() {
    let (mut session, stub) = establish(StubScript::new(start_date(), 1));
    session.energize().unwrap();
    assert_eq!(session.step().unwrap(), StepOutcome::Finished);
    assert_eq!(session.state(), SessionState::Finished);
    for err in [
        session.get("[Clock].Today").unwrap_err(),
        session.do_command("applyIrrigation", &[]).unwrap_err(),
        session.step().unwrap_err(),
    ] {
        assert!(matches!(
            err,
            SessionError::InvalidState {
                state: SessionState::Finished,
                ..
            }
        ));
    }
    stub.finish();
}

#[test]
fn register_field_after_energize_fails() {
    let (mut session, stub) = establish(StubScript::new(start_date(), 1));
    session.energize().unwrap();
    let err = session.register_field(&[]).unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidState {
            state: SessionState::Stepping,
            operation: "field",
        }
    ));
    session.step().unwrap();
    stub.finish();
}

// ── Round trips ─────────────────────────────────────────────────

#[test]
fn get_replies_arrive_in_issue_order() {
    let script = StubScript::new(start_date(), 2)
        .with_value(1, "[FieldA].Soil.Runoff", WireValue::Float(1.25))
        .with_value(1, "[FieldB].Soil.Runoff", WireValue::Float(2.5))
        .with_value(1, "[Weather].Rain", WireValue::Float(7.0));
    let (mut session, stub) = establish(script);
    session.energize().unwrap();

    assert_eq!(
        session.get("[FieldA].Soil.Runoff").unwrap(),
        WireValue::Float(1.25)
    );
    assert_eq!(
        session.get("[FieldB].Soil.Runoff").unwrap(),
        WireValue::Float(2.5)
    );
    assert_eq!(session.get("[Weather].Rain").unwrap(), WireValue::Float(7.0));
    let today = session.get("[Clock].Today").unwrap();
    assert_eq!(today.as_date(), Some(start_date()));

    assert_eq!(session.step().unwrap(), StepOutcome::Paused);
    let today = session.get("[Clock].Today").unwrap();
    assert_eq!(
        today.as_date(),
        NaiveDate::from_ymd_opt(2023, 1, 2)
    );
    assert_eq!(session.step().unwrap(), StepOutcome::Finished);
    assert_eq!(session.steps_completed(), 2);

    let seen = stub.finish();
    let gets: Vec<&str> = seen
        .iter()
        .filter(|c| c.name == "get")
        .map(|c| c.args[0].as_str().unwrap())
        .collect();
    assert_eq!(
        gets,
        vec![
            "[FieldA].Soil.Runoff",
            "[FieldB].Soil.Runoff",
            "[Weather].Rain",
            "[Clock].Today",
            "[Clock].Today",
        ]
    );
}

#[test]
fn register_field_returns_sequential_ids() {
    let (mut session, stub) = establish(StubScript::new(start_date(), 1));
    let pairs = |name: &str| {
        vec![
            ("Name".to_string(), name.to_string()),
            ("X".to_string(), "0".to_string()),
            ("Y".to_string(), "0".to_string()),
        ]
    };
    let first = session.register_field(&pairs("north")).unwrap();
    let second = session.register_field(&pairs("south")).unwrap();
    assert_eq!(first.0, 0);
    assert_eq!(second.0, 1);

    session.energize().unwrap();
    session.step().unwrap();
    let seen = stub.finish();
    let field_cmds: Vec<_> = seen.iter().filter(|c| c.name == "field").collect();
    assert_eq!(field_cmds.len(), 2);
    assert_eq!(
        field_cmds[0].args[0],
        WireValue::from("Name,north"),
    );
}

#[test]
fn do_prepends_the_operation_name() {
    let (mut session, stub) = establish(StubScript::new(start_date(), 1));
    session.energize().unwrap();
    session
        .do_command(
            "applyIrrigation",
            &[
                WireValue::from("amount"),
                WireValue::Float(204200.0),
                WireValue::from("field"),
                WireValue::Int(0),
            ],
        )
        .unwrap();
    session.step().unwrap();
    let seen = stub.finish();
    let cmd = seen.iter().find(|c| c.name == "do").unwrap();
    assert_eq!(cmd.args[0], WireValue::from("applyIrrigation"));
    assert_eq!(cmd.args[1], WireValue::from("amount"));
    assert_eq!(cmd.args[2], WireValue::Float(204200.0));
    assert_eq!(cmd.args.len(), 5);
}

#[test]
fn set_discards_the_acknowledgement() {
    let (mut session, stub) = establish(StubScript::new(start_date(), 1));
    session.energize().unwrap();
    session
        .set("[Weather].Rain", WireValue::Float(3.5))
        .unwrap();
    session.step().unwrap();
    let seen = stub.finish();
    let cmd = seen.iter().find(|c| c.name == "set").unwrap();
    assert_eq!(cmd.args[0], WireValue::from("[Weather].Rain"));
    assert_eq!(cmd.args[1], WireValue::Float(3.5));
}

// ── Malformed replies ───────────────────────────────────────────

#[test]
fn multi_frame_get_reply_is_malformed() {
    let mut session = with_raw_peer(|stream| {
        write_frames(stream, &[b"connect".to_vec()]).unwrap();
        read_frames(stream).unwrap(); // ok
        write_frames(stream, &[b"setup".to_vec()]).unwrap();
        read_frames(stream).unwrap(); // energize
        write_frames(stream, &[b"ok".to_vec()]).unwrap();
        read_frames(stream).unwrap(); // get
        write_frames(stream, &[b"two".to_vec(), b"frames".to_vec()]).unwrap();
    });
    session.energize().unwrap();
    let err = session.get("[Clock].Today").unwrap_err();
    assert!(matches!(err, SessionError::MalformedValue { .. }));
}

#[test]
fn undecodable_get_reply_is_malformed() {
    let mut session = with_raw_peer(|stream| {
        write_frames(stream, &[b"connect".to_vec()]).unwrap();
        read_frames(stream).unwrap();
        write_frames(stream, &[b"setup".to_vec()]).unwrap();
        read_frames(stream).unwrap();
        write_frames(stream, &[b"ok".to_vec()]).unwrap();
        read_frames(stream).unwrap();
        // msgpack nil is outside the protocol's value universe.
        write_frames(stream, &[vec![0xc0]]).unwrap();
    });
    session.energize().unwrap();
    let err = session.get("[Clock].Today").unwrap_err();
    assert!(matches!(err, SessionError::MalformedValue { .. }));
}

#[test]
fn unexpected_step_token_is_a_violation() {
    let mut session = with_raw_peer(|stream| {
        write_frames(stream, &[b"connect".to_vec()]).unwrap();
        read_frames(stream).unwrap();
        write_frames(stream, &[b"setup".to_vec()]).unwrap();
        read_frames(stream).unwrap();
        write_frames(stream, &[b"ok".to_vec()]).unwrap();
        read_frames(stream).unwrap(); // resume
        write_frames(stream, &[b"rebooting".to_vec()]).unwrap();
    });
    session.energize().unwrap();
    let err = session.step().unwrap_err();
    assert_eq!(
        err,
        SessionError::UnexpectedToken {
            state: SessionState::Stepping,
            token: "rebooting".to_string(),
        }
    );
}

#[test]
fn oversized_field_id_reply_is_malformed() {
    let mut session = with_raw_peer(|stream| {
        write_frames(stream, &[b"connect".to_vec()]).unwrap();
        read_frames(stream).unwrap();
        write_frames(stream, &[b"setup".to_vec()]).unwrap();
        read_frames(stream).unwrap(); // field
        write_frames(stream, &[vec![0u8; 9]]).unwrap();
    });
    let err = session
        .register_field(&[("Name".to_string(), "x".to_string())])
        .unwrap_err();
    assert!(matches!(err, SessionError::MalformedValue { .. }));
}
