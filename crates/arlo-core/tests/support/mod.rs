// In-memory Arlo cloud for session and correlation tests.
//
// Records every call, serves canned envelopes, and feeds the push channel
// through an unbounded mpsc so tests control exactly when events arrive.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use arlo_api::{
    ApiRequest, ByteStream, Connector, Credentials, Error, Method, ServiceUrls, Transport,
};
use arlo_core::{CommandDispatcher, SessionManager};
use bytes::Bytes;
use secrecy::SecretString;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use url::Url;

pub const ROOT: &str = "http://arlo.test/hmsweb";
pub const SNAPSHOT_URL: &str = "https://img.test/C1.jpg";

type PushSender = mpsc::UnboundedSender<Result<Bytes, Error>>;

/// Behaviour knobs for the fake service.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub login_ok: bool,
    pub devices: Value,
    pub automation: Value,
    pub stream_url: String,
    /// Push `fullFrameSnapshotAvailable` while the snapshot request is in flight.
    pub emit_snapshot: bool,
    /// Reject device commands with `success: false`.
    pub reject_commands: bool,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            login_ok: true,
            devices: json!([
                {
                    "deviceId": "B1", "deviceName": "Home", "deviceType": "basestation",
                    "parentId": "B1", "xCloudId": "X-B1"
                },
                {
                    "deviceId": "C1", "deviceName": "Porch", "deviceType": "camera",
                    "parentId": "B1", "xCloudId": "X-B1"
                }
            ]),
            automation: json!([
                { "gatewayId": "B2", "activeModes": ["mode0"], "activeSchedules": [] },
                { "gatewayId": "B1", "activeModes": ["armed"], "activeSchedules": [] }
            ]),
            stream_url: "rtsp://stream.test:443/live".into(),
            emit_snapshot: true,
            reject_commands: false,
        }
    }
}

struct CloudState {
    scenario: Scenario,
    calls: Mutex<Vec<(Method, String)>>,
    connects: Mutex<usize>,
    streams: Mutex<Vec<PushSender>>,
}

/// Connector handing out transports that all talk to one fake cloud.
#[derive(Clone)]
pub struct FakeCloud {
    state: Arc<CloudState>,
}

impl FakeCloud {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            state: Arc::new(CloudState {
                scenario,
                calls: Mutex::new(Vec::new()),
                connects: Mutex::new(0),
                streams: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn calls(&self) -> Vec<(Method, String)> {
        self.state.calls.lock().unwrap().clone()
    }

    /// Number of calls whose path ends with `suffix`.
    pub fn count(&self, method: &Method, suffix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(m, p)| m == method && p.ends_with(suffix))
            .count()
    }

    pub fn logins(&self) -> usize {
        self.count(&Method::POST, "/login/v2")
    }

    pub fn unsubscribes(&self) -> usize {
        self.count(&Method::GET, "/client/unsubscribe")
    }

    pub fn logouts(&self) -> usize {
        self.count(&Method::PUT, "/logout")
    }

    pub fn connects(&self) -> usize {
        *self.state.connects.lock().unwrap()
    }

    /// Push one frame into every open stream.
    pub fn push(&self, message: &Value) {
        let frame = Bytes::from(format!("data: {message}\n\n"));
        self.state
            .streams
            .lock()
            .unwrap()
            .retain(|tx| tx.send(Ok(frame.clone())).is_ok());
    }
}

impl Connector for FakeCloud {
    type Transport = FakeTransport;

    fn connect(&self) -> Result<FakeTransport, Error> {
        *self.state.connects.lock().unwrap() += 1;
        Ok(FakeTransport {
            cloud: self.clone(),
        })
    }
}

pub struct FakeTransport {
    cloud: FakeCloud,
}

fn ok(data: Value) -> Value {
    json!({ "success": true, "data": data })
}

impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, Error> {
        let path = request.url.path().to_owned();
        self.cloud
            .state
            .calls
            .lock()
            .unwrap()
            .push((request.method.clone(), path.clone()));

        let scenario = &self.cloud.state.scenario;
        let rejected = json!({ "success": false, "data": { "reason": "device offline" } });

        if path.ends_with("/login/v2") {
            return Ok(if scenario.login_ok {
                ok(json!({ "token": "tok-1", "userId": "U1" }))
            } else {
                json!({ "success": false, "data": { "message": "Invalid email or password" } })
            });
        }
        if path.ends_with("/users/devices") {
            return Ok(ok(scenario.devices.clone()));
        }
        if path.ends_with("/users/devices/fullFrameSnapshot") {
            if scenario.reject_commands {
                return Ok(rejected);
            }
            if scenario.emit_snapshot {
                let body = request.body.unwrap_or_default();
                let resource = body["resource"].clone();
                let gateway = body["to"].clone();
                self.cloud.push(&json!({
                    "resource": resource,
                    "from": gateway,
                    "action": "fullFrameSnapshotAvailable",
                    "properties": { "presignedFullFrameSnapshotUrl": SNAPSHOT_URL }
                }));
                // Let the reader broadcast before the request returns
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            return Ok(ok(Value::Null));
        }
        if path.ends_with("/users/devices/startStream") {
            if scenario.reject_commands {
                return Ok(rejected);
            }
            return Ok(ok(json!({ "url": scenario.stream_url })));
        }
        if path.contains("/users/devices/notify/") {
            if scenario.reject_commands {
                return Ok(rejected);
            }
            return Ok(ok(Value::Null));
        }
        if path.ends_with("/users/devices/automation/active") {
            return Ok(ok(scenario.automation.clone()));
        }
        if path.ends_with("/client/unsubscribe") {
            return Ok(ok(Value::Null));
        }
        if path.ends_with("/logout") {
            return Ok(Value::Null);
        }

        Err(Error::Http {
            status: 404,
            body: format!("no route for {path}"),
        })
    }

    async fn open_stream(&self, request: ApiRequest) -> Result<ByteStream, Error> {
        self.cloud
            .state
            .calls
            .lock()
            .unwrap()
            .push((request.method.clone(), request.url.path().to_owned()));

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(Ok(Bytes::from_static(b"data: {\"status\":\"connected\"}\n\n")));
        self.cloud.state.streams.lock().unwrap().push(tx);
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}

// ── Builders ────────────────────────────────────────────────────────

pub fn credentials() -> Credentials {
    Credentials::new("user@example.com", SecretString::from("hunter2".to_string()))
}

pub fn sessions(cloud: &FakeCloud) -> Arc<SessionManager<FakeCloud>> {
    let urls = ServiceUrls::new(&Url::parse(ROOT).unwrap());
    Arc::new(
        SessionManager::new(cloud.clone(), urls, credentials())
            .with_event_timeout(Duration::from_millis(500)),
    )
}

pub fn dispatcher(cloud: &FakeCloud) -> Arc<CommandDispatcher<FakeCloud>> {
    Arc::new(CommandDispatcher::new(sessions(cloud)))
}
