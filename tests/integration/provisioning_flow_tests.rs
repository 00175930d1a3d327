//! Integration tests for the access-point provisioning flow.
//!
//! The node falls back to provisioning when it cannot join, serves the
//! line protocol over the mock transport, and restarts once a request
//! has been applied.

use sensornode::app::events::NodeEvent;
use sensornode::app::node::Flow;
use sensornode::config::UNREGISTERED_ID;
use sensornode::error::{Error, ProtocolError};
use sensornode::fsm::LinkState;
use sensornode::provision::codec::FAILURE_REPLY;

use crate::mock_board::{boot, registered_config, run, seed_config, world};

fn position(events: &[NodeEvent], wanted: &NodeEvent) -> usize {
    events
        .iter()
        .position(|e| e == wanted)
        .unwrap_or_else(|| panic!("{wanted:?} not emitted"))
}

#[test]
fn first_boot_provisions_new_device_and_restarts() {
    let w = world();
    w.borrow_mut().clients.push_back(
        b"ACTION=0;SSID=Home;PASSWORD=secret99;DEVICE_NAME=Sensor1;TOKEN=abc123\n".to_vec(),
    );
    let mut node = boot(&w);

    assert_eq!(run(&mut node, &w, 100), Flow::Restart);
    assert_eq!(node.link().state(), LinkState::Provisioning);

    let w = w.borrow();
    assert_eq!(w.restarts, 1);
    assert!(w.join_attempts.is_empty(), "no credentials, no join");
    assert!(w.replies.is_empty());

    // Factory reset first, then the new record in one write.
    assert_eq!(w.writes.len(), 2);
    assert!(w.writes[0].wifi_ssid.is_empty());
    assert_eq!(w.writes[0].device_id, UNREGISTERED_ID);

    let stored = w.stored_config().unwrap();
    assert_eq!(stored.wifi_ssid, "Home");
    assert_eq!(stored.wifi_password, "secret99");
    assert_eq!(stored.device_name, "Sensor1");
    assert_eq!(stored.token, "abc123");
    assert_eq!(stored.device_id, UNREGISTERED_ID);
    assert!(!stored.created);

    let applied = position(&w.events, &NodeEvent::ProvisioningApplied { action: 0 });
    let restarting = position(&w.events, &NodeEvent::Restarting);
    assert!(applied < restarting);
}

#[test]
fn rejected_request_then_credential_update() {
    let w = world();
    seed_config(&w, &registered_config());
    {
        let mut w = w.borrow_mut();
        w.reachable_from_ms = None;
        w.clients.push_back(b"ACTION=1;SSID=Office\n".to_vec());
        w.clients.push_back(
            b"ACTION=1;SSID=Office;PASSWORD=newpass99;DEVICE_NAME=ignored;TOKEN=ignored\r\n"
                .to_vec(),
        );
    }
    let mut node = boot(&w);

    assert_eq!(run(&mut node, &w, 500), Flow::Restart);
    assert_eq!(
        node.last_error(),
        Some(Error::Protocol(ProtocolError::MissingKey("PASSWORD")))
    );

    let w = w.borrow();
    assert_eq!(w.join_attempts, vec!["Home".to_string()]);
    assert_eq!(w.replies, FAILURE_REPLY);
    assert_eq!(w.writes.len(), 1, "rejected request wrote nothing");

    let stored = w.stored_config().unwrap();
    assert_eq!(stored.wifi_ssid, "Office");
    assert_eq!(stored.wifi_password, "newpass99");
    assert_eq!(stored.device_name, "Sensor1");
    assert_eq!(stored.token, "abc123");
    assert_eq!(stored.device_id, 42);
    assert!(stored.created);

    let rejected = position(&w.events, &NodeEvent::ProvisioningRejected);
    let applied = position(&w.events, &NodeEvent::ProvisioningApplied { action: 1 });
    assert!(rejected < applied);
    assert_eq!(w.restarts, 1);
}

#[test]
fn client_hanging_up_mid_line_changes_nothing() {
    let w = world();
    seed_config(&w, &registered_config());
    {
        let mut w = w.borrow_mut();
        w.reachable_from_ms = Some(200);
        w.clients.push_back(b"ACTION=0;SSID=Evil".to_vec());
    }
    let mut node = boot(&w);

    assert_eq!(run(&mut node, &w, 400), Flow::Continue);
    assert!(node.link().is_connected());

    let w = w.borrow();
    assert_eq!(w.restarts, 0);
    assert!(w.writes.iter().all(|c| c.wifi_ssid == "Home" && c.device_id == 42));
    assert_eq!(w.replies, FAILURE_REPLY);
    assert_eq!(w.stored_config().unwrap(), registered_config());
    assert!(w.events.contains(&NodeEvent::ProvisioningRejected));
}

#[test]
fn access_point_and_listener_follow_provisioning() {
    let w = world();
    w.borrow_mut()
        .clients
        .push_back(b"ACTION=2;SSID=Home;PASSWORD=;DEVICE_NAME=;TOKEN=\n".to_vec());
    let mut node = boot(&w);

    {
        let w = w.borrow();
        assert!(!w.ap_active);
        assert!(!w.listening);
    }
    assert_eq!(run(&mut node, &w, 100), Flow::Restart);

    // On the host the restart returns, leaving provisioning up.
    let w = w.borrow();
    assert!(w.ap_active);
    assert!(w.listening);
    assert!(w.led);
    assert_eq!(w.stored_config().unwrap().wifi_ssid, "Home");
    assert!(w.stored_config().unwrap().wifi_password.is_empty());
}
