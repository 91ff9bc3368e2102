//! Window spawn, initialization, close, and manager teardown.

use dash_shared::host::EntityHost;
use dash_shared::protocol::{OutboundEvent, SetProps, WindowEvent};
use dash_tests::Harness;
use dash_windows::WindowState;

#[test]
fn spawn_pushes_initial_props_after_delay() -> anyhow::Result<()> {
    let mut h = Harness::new();
    let id = h.spawn("qml:foo", "Foo", Some(true))?;
    assert_eq!(h.manager.len(), 1);

    // Nothing before the fallback delay elapses.
    h.manager.update(0.05);
    assert!(h.outbound(id).is_empty());

    h.manager.update(0.06);
    let pushed = h.outbound(id);
    assert_eq!(
        pushed,
        vec![OutboundEvent::SetProps(SetProps {
            title: Some("Foo".into()),
            source_url: Some("qml:foo".into()),
            pinnable: Some(true),
            grabbed: None,
        })]
    );
    assert!(h.manager.window(id).is_some_and(|w| w.is_initialized()));

    // Fires once.
    h.manager.update(1.0);
    assert!(h.outbound(id).is_empty());
    Ok(())
}

#[test]
fn spawned_window_sits_at_rail_center() -> anyhow::Result<()> {
    let mut h = Harness::new();
    let id = h.spawn("qml:foo", "Foo", None)?;

    let window = h.manager.window(id).expect("window");
    assert!(window.is_pinnable());
    assert_eq!(window.state(), WindowState::DockedVisible);

    let meta = h.scene().meta(id).expect("meta");
    assert_eq!(meta.parent, Some(h.manager.root()));

    let pose = h.scene().local_pose(id).expect("pose");
    let cfg = h.manager.config();
    assert!((pose.position.y - cfg.dock_height()).abs() < 1e-6);
    assert!((pose.position.z + cfg.rail_curvature + cfg.rail_distance).abs() < 1e-6);

    let web = h.scene().web(id).expect("web");
    assert_eq!(web.source_url, cfg.window_root_url);
    assert_eq!(web.dimensions, cfg.window_dimensions);
    Ok(())
}

#[test]
fn readiness_ack_pushes_title_and_url() -> anyhow::Result<()> {
    let mut h = Harness::new();
    let id = h.spawn("qml:foo", "Foo", Some(false))?;

    h.send(id, &WindowEvent::WindowSpawned)?;
    assert_eq!(
        h.outbound(id),
        vec![OutboundEvent::SetProps(SetProps {
            title: Some("Foo".into()),
            source_url: Some("qml:foo".into()),
            ..SetProps::default()
        })]
    );

    // A duplicate ack does not push again.
    h.send(id, &WindowEvent::WindowSpawned)?;
    h.manager.update(1.0);
    assert!(h.outbound(id).is_empty());
    Ok(())
}

#[test]
fn managed_windows_accept_prop_updates() -> anyhow::Result<()> {
    let mut h = Harness::new();
    let id = h.spawn("qml:foo", "Foo", Some(true))?;
    h.send(id, &WindowEvent::WindowSpawned)?;
    h.send(id, &WindowEvent::Pin)?;
    h.clear_outbound();

    assert!(h.manager.set_title(id, "Bar"));
    assert!(h.manager.set_source_url(id, "qml:bar"));
    assert!(h.manager.set_pinnable(id, false));

    let window = h.manager.window(id).expect("window");
    assert_eq!(window.title(), "Bar");
    assert!(!window.is_pinnable());
    assert!(!window.is_pinned());
    assert_eq!(window.release_time(), h.manager.clock());

    assert_eq!(
        h.outbound(id),
        vec![
            OutboundEvent::SetProps(SetProps {
                title: Some("Bar".into()),
                ..SetProps::default()
            }),
            OutboundEvent::SetProps(SetProps {
                source_url: Some("qml:bar".into()),
                ..SetProps::default()
            }),
            OutboundEvent::SetProps(SetProps {
                pinnable: Some(false),
                ..SetProps::default()
            }),
            // Losing pinnability unpinned it.
            OutboundEvent::Unhide,
        ]
    );

    let rail = h.manager.rail();
    assert!(!h.manager.set_title(rail, "Rail"));
    assert!(!h.manager.set_source_url(rail, "qml:rail"));
    assert!(!h.manager.set_pinnable(rail, true));
    assert!(h.outbound(rail).is_empty());
    Ok(())
}

#[test]
fn finished_closing_removes_and_deletes_once() -> anyhow::Result<()> {
    let mut h = Harness::new();
    let keep = h.spawn("qml:a", "A", None)?;
    let gone = h.spawn("qml:b", "B", None)?;
    h.scene_mut().drain_deleted();

    h.send(gone, &WindowEvent::FinishedClosing)?;
    assert_eq!(h.manager.len(), 1);
    assert!(h.manager.window(gone).is_none());
    assert!(!h.scene().contains(gone));
    assert!(h.scene().contains(keep));

    // A second ack comes from an entity we no longer track.
    h.send(gone, &WindowEvent::FinishedClosing)?;
    let deleted = h.scene_mut().drain_deleted();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].0, gone);
    Ok(())
}

#[test]
fn close_request_round_trip() -> anyhow::Result<()> {
    let mut h = Harness::new();
    let id = h.spawn("qml:a", "A", None)?;
    h.clear_outbound();

    assert!(h.manager.request_close(id));
    assert_eq!(h.outbound(id), vec![OutboundEvent::Close]);
    assert_eq!(
        h.manager.window(id).map(|w| w.state()),
        Some(WindowState::Closing)
    );

    // Asking twice does not re-send.
    h.manager.request_close(id);
    assert!(h.outbound(id).is_empty());

    h.send(id, &WindowEvent::FinishedClosing)?;
    assert!(h.manager.is_empty());
    Ok(())
}

#[test]
fn dispose_disconnects_and_deletes_everything() -> anyhow::Result<()> {
    let mut h = Harness::new();
    let a = h.spawn("qml:a", "A", None)?;
    let b = h.spawn("qml:b", "B", None)?;
    let rail = h.manager.rail();
    assert_eq!(h.scene().signals().len(), 4);

    let mut scene = h.manager.dispose();
    assert!(scene.signals().is_empty());
    for id in [a, b, rail] {
        assert!(!scene.contains(id));
    }
    assert_eq!(scene.drain_deleted().len(), 3);
    // Only the root anchor remains.
    assert_eq!(scene.entity_count(), 1);
    Ok(())
}
