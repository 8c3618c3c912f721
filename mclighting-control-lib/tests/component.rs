mod common;

use mclighting_control_lib::component::{ErrorPayload, InPacket, McLightingComponent, OutPacket};
use serde_json::json;

use common::{test_config, MockLight, CONNECT_TIMEOUT};

#[tokio::test]
async fn test_component_round_trip() {
    let status = json!({
        "ws2812fx_mode": 3,
        "speed": 100,
        "brightness": 20,
        "color": [1, 2, 3]
    });
    let a = MockLight::start("a", Some(status.clone())).await;
    let b = MockLight::start("b", Some(status)).await;
    let mut component = McLightingComponent::new(test_config());

    let out = component
        .process(InPacket::Addresses(vec![a.address(), b.address()]))
        .await;
    assert_eq!(
        out,
        Some(OutPacket::Out(vec![
            "CONNECTING".to_string(),
            "CONNECTING".to_string()
        ]))
    );
    component
        .session()
        .wait_connected(CONNECT_TIMEOUT)
        .await
        .unwrap();

    let out = component
        .process(InPacket::Restore)
        .await;
    assert_eq!(
        out,
        Some(OutPacket::Error(ErrorPayload {
            message: "No stored modes to restore".to_string()
        }))
    );

    let out = component.process(InPacket::Command("=off".to_string())).await;
    assert_eq!(
        out,
        Some(OutPacket::Out(vec![
            "a: =off".to_string(),
            "b: =off".to_string()
        ]))
    );

    let Some(OutPacket::Out(stored)) = component.process(InPacket::Store).await else {
        panic!("store should succeed");
    };
    assert_eq!(stored.len(), 2);

    let out = component.process(InPacket::Restore).await;
    assert_eq!(
        out,
        Some(OutPacket::Out(vec![
            "a: %20".to_string(),
            "b: %20".to_string()
        ]))
    );
    assert_eq!(a.commands(), vec!["=off", "#010203", "/3", "?100", "%20"]);
}

#[tokio::test]
async fn test_command_to_unconnected_light_goes_to_error_port() {
    let mut component = McLightingComponent::new(test_config());
    component
        .process(InPacket::Addresses(vec!["ws://127.0.0.1:9/ws".to_string()]))
        .await;

    let out = component.process(InPacket::Command("%1".to_string())).await;
    assert_eq!(
        out,
        Some(OutPacket::Error(ErrorPayload {
            message: "Not connected to McLighting ws://127.0.0.1:9/ws".to_string()
        }))
    );
}
