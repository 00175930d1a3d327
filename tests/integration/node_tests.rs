//! Integration tests for the node lifecycle: boot, join, registration,
//! telemetry and settings sync, driven through the public `Node` API.

use sensornode::app::events::NodeEvent;
use sensornode::app::node::Flow;
use sensornode::app::ports::{Method, Reading};
use sensornode::config::{DeviceConfig, Setting};
use sensornode::error::{BackendError, Error};
use sensornode::fsm::LinkState;
use sensornode::scheduler::Job;
use serde_json::json;

use crate::mock_board::{boot, registered_config, run, seed_config, world};

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn first_boot_runs_on_defaults() {
    let w = world();
    let node = boot(&w);

    assert_eq!(node.link().state(), LinkState::Disconnected);
    assert!(!node.store().config().is_registered());
    assert!(node.last_error().is_some(), "missing config.json is recorded");
    assert!(node.scheduler().is_enabled(Job::Supervisor));
    assert!(node.scheduler().is_enabled(Job::Telemetry));
    assert!(node.scheduler().is_enabled(Job::SettingsSync));
    assert!(!node.scheduler().is_enabled(Job::Reconnect));

    let w = w.borrow();
    assert!(w.led, "indicator lit while off the network");
    assert_eq!(w.events, vec![NodeEvent::Booted { registered: false }]);
}

#[test]
fn boot_restores_persisted_identity() {
    let w = world();
    seed_config(&w, &registered_config());
    let node = boot(&w);

    assert_eq!(node.store().config().device_id, 42);
    assert!(node.last_error().is_none());
    assert_eq!(w.borrow().events, vec![NodeEvent::Booted { registered: true }]);
}

// ── Steady state ──────────────────────────────────────────────

#[test]
fn registered_node_reports_and_syncs() {
    let w = world();
    seed_config(&w, &registered_config());
    w.borrow_mut().settings_reply = (
        200,
        r#"[{"type":1,"type_name":"temp","unit":"C","value":22.0}]"#.into(),
    );
    let mut node = boot(&w);

    assert_eq!(run(&mut node, &w, 250), Flow::Continue);
    assert!(node.link().is_connected());

    let w = w.borrow();
    assert!(!w.led);
    assert!(!w.ap_active);
    assert!(w.requests_to("devices/").is_empty(), "already registered");

    let posts = w.requests_to("measurements/");
    assert_eq!(posts.len(), 4, "two cycles of two channels");
    assert_eq!(posts[0].method, Method::Post);
    assert_eq!(posts[0].url, "http://api.test/measurements/");
    assert_eq!(posts[0].auth, "Token abc123");
    assert_eq!(posts[0].body, json!({"device": 42, "value": 21.5, "type": 1}));
    assert_eq!(posts[1].body, json!({"device": 42, "value": 40.0, "type": 2}));

    let gets = w.requests_to("settings/");
    assert_eq!(gets.len(), 1);
    assert_eq!(gets[0].method, Method::Get);
    assert_eq!(gets[0].url, "http://api.test/settings/?device=42");

    assert_eq!(
        w.stored_config().unwrap().settings,
        vec![Setting {
            kind: 1,
            type_name: "temp".into(),
            unit: "C".into(),
            value: 22.0,
        }]
    );
    assert!(w.events.contains(&NodeEvent::SettingsUpdated { count: 1 }));
    assert!(w.events.contains(&NodeEvent::MeasurementsSent {
        temperature_c: 21.5,
        humidity_pct: 40.0,
    }));
}

#[test]
fn nan_reading_sends_nothing() {
    let w = world();
    seed_config(&w, &registered_config());
    w.borrow_mut().reading = Ok(Reading {
        temperature_c: f32::NAN,
        humidity_pct: 40.0,
    });
    let mut node = boot(&w);

    run(&mut node, &w, 150);

    let w = w.borrow();
    assert!(w.requests_to("measurements/").is_empty());
    assert!(w.events.contains(&NodeEvent::SensorReadFailed));
}

// ── Registration ──────────────────────────────────────────────

#[test]
fn unregistered_node_registers_once() {
    let w = world();
    seed_config(
        &w,
        &DeviceConfig {
            device_id: -1,
            created: false,
            ..registered_config()
        },
    );
    let mut node = boot(&w);

    run(&mut node, &w, 50);
    assert!(node.store().config().is_registered());
    assert_eq!(node.store().config().device_id, 7);

    run(&mut node, &w, 150);
    let w = w.borrow();
    let regs = w.requests_to("devices/");
    assert_eq!(regs.len(), 1);
    assert_eq!(
        regs[0].body,
        json!({"name": "Sensor1", "mac_address": "DE:AD:BE:EF:CA:FE", "type": 1})
    );
    assert_eq!(regs[0].auth, "Token abc123");
    assert!(w.events.contains(&NodeEvent::Registered { device_id: 7 }));

    let stored = w.stored_config().unwrap();
    assert!(stored.created);
    assert_eq!(stored.device_id, 7);
    // Telemetry only runs once the identity exists.
    assert_eq!(w.requests_to("measurements/").len(), 2);
}

#[test]
fn refused_registration_retries_and_blocks_telemetry() {
    let w = world();
    seed_config(
        &w,
        &DeviceConfig {
            device_id: -1,
            created: false,
            ..registered_config()
        },
    );
    w.borrow_mut().register_reply = (400, r#"{"detail":"bad token"}"#.into());
    let mut node = boot(&w);

    run(&mut node, &w, 150);

    assert!(!node.store().config().is_registered());
    assert_eq!(
        node.last_error(),
        Some(Error::Backend(BackendError::Status(400)))
    );
    let w = w.borrow();
    assert!(w.requests_to("devices/").len() > 1, "retried every tick");
    assert!(w.requests_to("measurements/").is_empty());
    assert!(w.requests_to("settings/").is_empty());
    assert!(w.events.contains(&NodeEvent::RegistrationFailed));
}

// ── Link loss ─────────────────────────────────────────────────

#[test]
fn lost_link_recovers_through_background_reconnect() {
    let w = world();
    seed_config(&w, &registered_config());
    let mut node = boot(&w);

    run(&mut node, &w, 120);
    assert!(node.link().is_connected());

    // Network drops, comes back 150 ms later.
    {
        let mut w = w.borrow_mut();
        w.reachable_from_ms = Some(w.now_ms + 150);
    }
    assert_eq!(run(&mut node, &w, 400), Flow::Continue);

    assert!(node.link().is_connected());
    assert!(!node.scheduler().is_enabled(Job::Reconnect));
    let w = w.borrow();
    assert!(!w.ap_active);
    assert!(!w.listening);
    assert!(!w.led);
    for change in [
        (LinkState::Connected, LinkState::Disconnected),
        (LinkState::Connecting, LinkState::Provisioning),
        (LinkState::Provisioning, LinkState::Connected),
    ] {
        assert!(
            w.events.contains(&NodeEvent::LinkChanged {
                from: change.0,
                to: change.1,
            }),
            "missing {change:?}"
        );
    }
    assert!(w.events.contains(&NodeEvent::ProvisioningStarted));
}
