//! Inbound channel edge cases, focus tracking, and scale changes.

use dash_shared::{
    event::HostEvent,
    math::Vector3,
    protocol::{OutboundEvent, WindowEvent},
};
use dash_tests::Harness;

#[test]
fn garbage_unknown_and_malformed_events_are_dropped() -> anyhow::Result<()> {
    let mut h = Harness::new();
    let id = h.spawn("qml:a", "A", Some(true))?;
    h.clear_outbound();

    for raw in [
        "",
        "not json",
        "{\"dash_window\":",
        "[1, 2, 3]",
        "{\"something_else\":{\"event\":\"pin\"}}",
        "{\"dash_window\":{}}",
        "{\"dash_window\":{\"event\":42}}",
        "{\"dash_window\":{\"event\":\"teleport\"}}",
        "{\"dash_window\":{\"event\":\"set_grabbable\"}}",
        "{\"dash_window\":{\"event\":\"pin\",\"extra\":true}}x",
        "{\"dash_window\":{\"event\":\"spawn_window\",\"title\":\"no url\"}}",
    ] {
        h.send_raw(id, raw);
    }

    let window = h.manager.window(id).expect("window");
    assert!(!window.is_pinned());
    assert!(!window.is_initialized());
    assert_eq!(h.manager.len(), 1);
    assert!(h.outbound(id).is_empty());
    Ok(())
}

#[test]
fn spawn_window_over_ipc_defaults_pinnable() -> anyhow::Result<()> {
    let mut h = Harness::new();
    let id = h.spawn("qml:a", "A", None)?;
    assert!(h.manager.window(id).is_some_and(|w| w.is_pinnable()));

    // Window-specific events need a sending window.
    let channel = h.manager.config().ipc_channel.clone();
    h.manager
        .on_message(&channel, r#"{"dash_window":{"event":"pin"}}"#);
    assert!(h.manager.window(id).is_some_and(|w| !w.is_pinned()));

    // Other channels are not ours.
    h.manager.on_message(
        "chat",
        r#"{"dash_window":{"event":"spawn_window","source_url":"x","title":"x"}}"#,
    );
    assert_eq!(h.manager.len(), 1);
    Ok(())
}

#[test]
fn child_windows_can_spawn_windows() -> anyhow::Result<()> {
    let mut h = Harness::new();
    let parent = h.spawn("qml:a", "A", None)?;
    h.send(
        parent,
        &WindowEvent::SpawnWindow {
            source_url: "qml:b".into(),
            title: "B".into(),
            pinnable: Some(false),
        },
    )?;
    assert_eq!(h.manager.len(), 2);
    let child = h
        .manager
        .windows()
        .find(|w| w.title() == "B")
        .expect("child window");
    assert!(!child.is_pinnable());
    Ok(())
}

#[test]
fn focus_moves_between_windows() -> anyhow::Result<()> {
    let mut h = Harness::new();
    let a = h.spawn("qml:a", "A", None)?;
    let b = h.spawn("qml:b", "B", None)?;
    h.clear_outbound();

    h.manager
        .handle_host_event(HostEvent::KeyboardFocusChanged { entity: Some(a) });
    assert_eq!(h.manager.focused(), Some(a));
    assert_eq!(h.outbound(a), vec![OutboundEvent::Focus]);

    h.manager
        .handle_host_event(HostEvent::KeyboardFocusChanged { entity: Some(b) });
    assert_eq!(h.manager.focused(), Some(b));
    let sent = h.scene_mut().drain_script_events();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].entity, a);
    assert_eq!(sent[1].entity, b);

    // Focus leaving the dashboard clears it.
    let rail = h.manager.rail();
    h.manager
        .handle_host_event(HostEvent::KeyboardFocusChanged { entity: Some(rail) });
    assert_eq!(h.manager.focused(), None);
    assert_eq!(h.outbound(b), vec![OutboundEvent::Unfocus]);

    h.manager
        .handle_host_event(HostEvent::KeyboardFocusChanged { entity: None });
    assert!(h.outbound(b).is_empty());
    Ok(())
}

#[test]
fn closing_focused_window_clears_focus() -> anyhow::Result<()> {
    let mut h = Harness::new();
    let a = h.spawn("qml:a", "A", None)?;
    h.manager.on_keyboard_focus_changed(Some(a));
    h.send(a, &WindowEvent::BeginDrag)?;

    h.send(a, &WindowEvent::FinishedClosing)?;
    assert_eq!(h.manager.focused(), None);
    assert_eq!(h.manager.dragged(), None);
    Ok(())
}

#[test]
fn scale_change_refreshes_every_window() -> anyhow::Result<()> {
    let mut h = Harness::new();
    let a = h.spawn("qml:a", "A", None)?;
    let b = h.spawn("qml:b", "B", None)?;
    let (dims, dpi) = {
        let cfg = h.manager.config();
        (cfg.window_dimensions, cfg.window_dpi)
    };

    h.scene_mut().set_sensor_to_world_scale(0.5);
    h.manager
        .handle_host_event(HostEvent::SensorToWorldScaleChanged);

    for id in [a, b] {
        let web = h.scene().web(id).expect("web");
        assert!(web.dimensions.within_epsilon(dims * 0.5, 1e-6));
        assert!((web.dpi - dpi * 2.0).abs() < 1e-4);
    }

    // Windows spawned afterwards pick up the current scale.
    let c = h.spawn("qml:c", "C", None)?;
    let web = h.scene().web(c).expect("web");
    assert!(web.dimensions.within_epsilon(dims * 0.5, 1e-6));
    assert!(web.dimensions.within_epsilon(Vector3::new(0.6, 0.4, 0.005), 1e-6));
    Ok(())
}
