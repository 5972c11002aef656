use std::{
    sync::{
        atomic::{AtomicBool, AtomicI32, Ordering},
        Arc, OnceLock,
    },
    time::{Duration, Instant},
};

use anyhow::Context;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use alarmclock_common::{
    AlarmAction, BrokerSession, ConnectError, ConnectivityManager, DeviceCore, LinkStatus,
    RuntimeConfig, UpdateErrorKind, UpdateEvent, UpdateIndication, UpdateKind,
};

const MAX_MQTT_PAYLOAD_BYTES: usize = 512;
const LINK_CHECK_INTERVAL: Duration = Duration::from_secs(2);
const TICK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone)]
struct AppState {
    core: Arc<Mutex<DeviceCore>>,
    link: Arc<Mutex<ConnectivityManager>>,
    health: Arc<SessionHealth>,
    mqtt: AsyncClient,
}

/// Broker session liveness as last observed by the event loop. The link
/// loop reads this through `MqttSession` without blocking on network I/O.
struct SessionHealth {
    connected: AtomicBool,
    last_code: AtomicI32,
}

impl SessionHealth {
    fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            last_code: AtomicI32::new(-1),
        }
    }
}

/// `BrokerSession` adapter over rumqttc. `connect` is one bounded check of
/// the session the event loop maintains; `subscribe` enqueues without
/// awaiting, so neither call can stall the cooperative loop.
struct MqttSession<'a> {
    client: &'a AsyncClient,
    health: &'a SessionHealth,
}

impl BrokerSession for MqttSession<'_> {
    fn connect(&mut self) -> Result<(), ConnectError> {
        if self.health.connected.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(ConnectError {
                code: self.health.last_code.load(Ordering::Relaxed),
            })
        }
    }

    fn subscribe(&mut self, topic: &str) -> bool {
        self.client
            .try_subscribe(topic, QoS::AtMostOnce)
            .is_ok()
    }
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut runtime = RuntimeConfig::default();
    runtime.alarm.sanitize();

    let mqtt_host = std::env::var("MQTT_HOST").unwrap_or(runtime.broker.host.clone());
    let mqtt_port = std::env::var("MQTT_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(runtime.broker.port);
    let client_id = std::env::var("MQTT_CLIENT_ID").unwrap_or(runtime.broker.client_id.clone());
    let hostname = std::env::var("HOSTNAME").unwrap_or(runtime.broker.hostname.clone());

    let mut mqtt_options = MqttOptions::new(client_id, mqtt_host, mqtt_port);
    mqtt_options.set_keep_alive(Duration::from_secs(30));
    let mqtt_user = std::env::var("MQTT_USER").unwrap_or(runtime.broker.username.clone());
    let mqtt_pass = std::env::var("MQTT_PASS").unwrap_or(runtime.broker.password.clone());
    if !mqtt_user.is_empty() {
        mqtt_options.set_credentials(mqtt_user, mqtt_pass);
    }

    let (mqtt, eventloop) = AsyncClient::new(mqtt_options, 64);

    let app_state = AppState {
        core: Arc::new(Mutex::new(DeviceCore::new(runtime.alarm.clone()))),
        link: Arc::new(Mutex::new(ConnectivityManager::new())),
        health: Arc::new(SessionHealth::new()),
        mqtt,
    };

    let (update_tx, update_rx) = mpsc::unbounded_channel::<UpdateEvent>();

    spawn_mqtt_loop(app_state.clone(), eventloop);
    spawn_link_loop(app_state.clone());
    spawn_control_loop(app_state.clone());
    spawn_update_loop(app_state.clone(), update_rx);
    spawn_update_feed(update_tx, hostname.clone());

    info!("alarm clock controller running (updater discovery name: {hostname})");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");
    Ok(())
}

fn spawn_mqtt_loop(app_state: AppState, mut eventloop: rumqttc::EventLoop) {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    app_state.health.connected.store(true, Ordering::Relaxed);
                    app_state.health.last_code.store(0, Ordering::Relaxed);
                    info!("mqtt session established");
                }
                Ok(Event::Incoming(Incoming::Publish(message))) => {
                    if let Err(err) =
                        handle_mqtt_message(&app_state, message.topic, message.payload.to_vec())
                            .await
                    {
                        warn!("mqtt message handling error: {err:#}");
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    app_state.health.connected.store(false, Ordering::Relaxed);
                    app_state.health.last_code.store(-1, Ordering::Relaxed);
                    app_state.link.lock().await.mark_disconnected();
                    warn!("mqtt poll error: {err}");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });
}

/// Re-checks broker liveness on a fixed cadence. Each pass makes at most
/// one connection check and logs the outcome; reconnect pacing lives here,
/// never inside the connectivity manager.
fn spawn_link_loop(app_state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LINK_CHECK_INTERVAL);
        loop {
            interval.tick().await;

            let status = {
                let mut session = MqttSession {
                    client: &app_state.mqtt,
                    health: &app_state.health,
                };
                let mut link = app_state.link.lock().await;
                link.ensure_connected(&mut session)
            };

            match status {
                LinkStatus::AlreadyConnected => {}
                LinkStatus::Connected {
                    temperature_ok,
                    alarm_ok,
                } => {
                    info!(
                        "connected to mqtt, subscriptions: temp:{} alarm:{}",
                        if temperature_ok { "OK" } else { "FAIL" },
                        if alarm_ok { "OK" } else { "FAIL" },
                    );
                }
                LinkStatus::Failed(code) => {
                    warn!("mqtt connection attempt failed, rc={code}");
                }
            }
        }
    });
}

/// The recurring external tick. Well under the toggle period so the blink
/// cadence is re-evaluated promptly; the core itself returns immediately.
fn spawn_control_loop(app_state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            interval.tick().await;

            let actions = {
                let mut core = app_state.core.lock().await;
                core.tick(monotonic_ms())
            };

            if !actions.is_empty() {
                drive_actuation(&actions);
            }
        }
    });
}

fn spawn_update_loop(app_state: AppState, mut events: mpsc::UnboundedReceiver<UpdateEvent>) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let indication = {
                let mut core = app_state.core.lock().await;
                core.handle_update_event(event)
            };
            if let Some(indication) = indication {
                render_update(indication);
            }
        }
    });
}

/// Updater integration point: the device build bridges the platform
/// updater's lifecycle callbacks onto this channel. Off-hardware, an
/// env-gated scripted run exercises the same path end to end.
fn spawn_update_feed(events: mpsc::UnboundedSender<UpdateEvent>, _discovery_name: String) {
    tokio::spawn(async move {
        if std::env::var("SIMULATE_UPDATE").is_err() {
            // Keep the channel open for the real updater bridge.
            std::future::pending::<()>().await;
        }

        tokio::time::sleep(Duration::from_secs(5)).await;
        let total: u64 = 400_000;
        let _ = events.send(UpdateEvent::Started(UpdateKind::Firmware));
        for step in 1..=8u64 {
            tokio::time::sleep(Duration::from_millis(250)).await;
            let _ = events.send(UpdateEvent::Progress {
                transferred: total * step / 8,
                total,
            });
        }
        if std::env::var("SIMULATE_UPDATE").as_deref() == Ok("fail") {
            let _ = events.send(UpdateEvent::Failed(UpdateErrorKind::ReceiveFailed));
        } else {
            let _ = events.send(UpdateEvent::Finished);
        }
    });
}

async fn handle_mqtt_message(
    app_state: &AppState,
    topic: String,
    payload: Vec<u8>,
) -> anyhow::Result<()> {
    if payload.len() > MAX_MQTT_PAYLOAD_BYTES {
        warn!(
            "dropping oversized MQTT payload on topic {} ({} bytes)",
            topic,
            payload.len()
        );
        return Ok(());
    }

    let message = String::from_utf8(payload).context("non utf8 mqtt payload")?;

    let actions = {
        let mut core = app_state.core.lock().await;
        core.handle_message(&topic, &message, monotonic_ms())
    };

    // Deactivation clears are committed here, synchronously with the
    // message, not deferred to the next tick.
    if !actions.is_empty() {
        drive_actuation(&actions);
    }
    Ok(())
}

/// Hardware integration point: the device build replaces these log lines
/// with buzzer PWM and RGB pixel writes.
fn drive_actuation(actions: &[AlarmAction]) {
    for action in actions {
        match action {
            AlarmAction::BuzzerOn => info!("buzzer: on"),
            AlarmAction::BuzzerOff => info!("buzzer: off"),
            AlarmAction::IndicatorOn => info!("indicator: on"),
            AlarmAction::IndicatorClear => info!("indicator: clear"),
        }
    }
}

/// Display integration point: the device build renders these on the OLED
/// (title, progress bar, percent, error text).
fn render_update(indication: UpdateIndication) {
    match indication {
        UpdateIndication::Begin(kind) => info!("display: OTA Update... ({})", kind.as_str()),
        UpdateIndication::Progress(percent) => info!("display: OTA Update {percent}%"),
        UpdateIndication::Done => info!("display: Update Done! Rebooting..."),
        UpdateIndication::Error(message) => info!("display: OTA Error: {message}"),
    }
}

fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START
        .get_or_init(Instant::now)
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}
