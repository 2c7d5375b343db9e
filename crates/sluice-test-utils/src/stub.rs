//! A scripted engine peer for protocol and driver tests.
//!
//! [`StubEngine::spawn`] starts a thread that connects to a bound
//! [`Listener`](sluice_wire::Listener) address and performs the engine
//! side of the protocol: it opens with `connect`, answers `ok` with
//! `setup`, assigns sequential field identifiers, serves programmed
//! per-step values for `get`, acknowledges `set`/`do`, and answers each
//! `resume` with `paused` until the scripted step count runs out, then
//! `finished`.
//!
//! Every command the stub receives is recorded and handed back through
//! a channel, so tests can assert on the exact wire traffic after the
//! run completes.
//!
//! The stub panics on malformed traffic, but treats a dropped peer as
//! a normal end of test so that error-path tests can abandon a session
//! mid-run.

use chrono::{DateTime, Days, NaiveDate, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use sluice_core::WireValue;
use sluice_wire::codec::{decode_value, encode_value};
use sluice_wire::frame::{read_frames, write_frames};
use std::collections::HashMap;
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;

/// The scripted behavior of a stub engine run.
#[derive(Clone, Debug)]
pub struct StubScript {
    start_date: NaiveDate,
    total_steps: usize,
    default_value: f64,
    overrides: HashMap<(usize, String), WireValue>,
}

impl StubScript {
    /// A script whose clock starts at `start_date` and whose engine
    /// pauses `total_steps - 1` times before reporting `finished` on
    /// resume number `total_steps`.
    pub fn new(start_date: NaiveDate, total_steps: usize) -> Self {
        Self {
            start_date,
            total_steps,
            default_value: 0.0,
            overrides: HashMap::new(),
        }
    }

    /// Override the reply for `path` on 1-based step `step`.
    pub fn with_value(mut self, step: usize, path: &str, value: WireValue) -> Self {
        self.overrides.insert((step, path.to_string()), value);
        self
    }

    /// Set the numeric reply for unscripted reading paths (default
    /// 0.0). Runoff and rainfall paths stay at zero unless explicitly
    /// overridden, so a default water-content level does not make
    /// every cell shed runoff.
    pub fn with_default(mut self, value: f64) -> Self {
        self.default_value = value;
        self
    }

    /// The reply for a `get` of `path` during step `step`.
    fn lookup(&self, step: usize, path: &str) -> WireValue {
        if let Some(value) = self.overrides.get(&(step, path.to_string())) {
            return value.clone();
        }
        if path == "[Clock].Today" {
            return WireValue::Timestamp(self.date_for_step(step));
        }
        if path.ends_with(".Soil.Runoff") || path == "[Weather].Rain" {
            return WireValue::Float(0.0);
        }
        WireValue::Float(self.default_value)
    }

    /// The simulation clock for 1-based step `step`: the start date
    /// advanced one day per completed step, at midnight UTC.
    fn date_for_step(&self, step: usize) -> DateTime<Utc> {
        let date = self
            .start_date
            .checked_add_days(Days::new(step as u64 - 1))
            .expect("scripted date overflows the calendar");
        date.and_hms_opt(0, 0, 0)
            .expect("midnight is always a valid time")
            .and_utc()
    }
}

/// One command observed by the stub, with decoded arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCommand {
    /// 1-based step during which the command arrived; 0 for the setup
    /// phase (`ok`, `field`, `energize`).
    pub step: usize,
    /// The command name from the first frame.
    pub name: String,
    /// The msgpack-decoded argument frames.
    pub args: Vec<WireValue>,
}

/// Handle to a running stub engine thread.
pub struct StubEngine {
    thread: thread::JoinHandle<()>,
    rx: Receiver<RecordedCommand>,
}

impl StubEngine {
    /// Connect to `addr` on a fresh thread and run the script.
    ///
    /// Call before the listener's `accept()`; the stub retries the
    /// connection briefly, so spawn order does not matter.
    pub fn spawn(addr: SocketAddr, script: StubScript) -> Self {
        let (tx, rx) = unbounded();
        let thread = thread::spawn(move || run_stub(addr, script, tx));
        Self { thread, rx }
    }

    /// Wait for the stub to finish and return everything it saw, in
    /// arrival order.
    pub fn finish(self) -> Vec<RecordedCommand> {
        self.thread.join().expect("stub engine thread panicked");
        self.rx.try_iter().collect()
    }
}

fn connect_with_retry(addr: SocketAddr) -> TcpStream {
    for _ in 0..100 {
        if let Ok(stream) = TcpStream::connect(addr) {
            return stream;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("stub engine could not connect to {addr}");
}

fn run_stub(addr: SocketAddr, script: StubScript, tx: Sender<RecordedCommand>) {
    let mut stream = connect_with_retry(addr);
    write_frames(&mut stream, &[b"connect".to_vec()]).expect("stub: send connect");

    let mut next_field_id: u32 = 0;
    let mut resumes_done: usize = 0;
    let mut energized = false;

    loop {
        // A dropped peer is a test ending early (e.g. an error-path
        // test abandoning its session); stop quietly.
        let frames = match read_frames(&mut stream) {
            Ok(frames) => frames,
            Err(_) => return,
        };
        let name = String::from_utf8(frames[0].clone()).expect("stub: command name not UTF-8");
        let args: Vec<WireValue> = frames[1..]
            .iter()
            .map(|f| decode_value(f).expect("stub: undecodable argument frame"))
            .collect();
        let step = if energized { resumes_done + 1 } else { 0 };
        tx.send(RecordedCommand {
            step,
            name: name.clone(),
            args: args.clone(),
        })
        .expect("stub: record channel closed");

        let reply: Vec<u8> = match name.as_str() {
            "ok" => b"setup".to_vec(),
            "field" => {
                let id = next_field_id;
                next_field_id += 1;
                id.to_be_bytes().to_vec()
            }
            "energize" => {
                energized = true;
                b"ok".to_vec()
            }
            "get" => {
                let path = args
                    .first()
                    .and_then(WireValue::as_str)
                    .expect("stub: get without a path argument");
                encode_value(&script.lookup(resumes_done + 1, path))
                    .expect("stub: encodable scripted value")
            }
            "set" | "do" => b"ok".to_vec(),
            "resume" => {
                resumes_done += 1;
                if resumes_done >= script.total_steps {
                    write_frames(&mut stream, &[b"finished".to_vec()])
                        .expect("stub: send finished");
                    return;
                }
                b"paused".to_vec()
            }
            other => panic!("stub engine received unknown command {other:?}"),
        };
        write_frames(&mut stream, &[reply]).expect("stub: send reply");
    }
}
