//! Integration tests for the overlay stack and the loading overlay

mod common;

use std::rc::Rc;

use pretty_assertions::assert_eq;

use checkin_kiosk::spa::app::LOADING_NAMESPACE;
use checkin_kiosk::spa::{
    RenderTarget, Screen, ScreenKind, ScreenStackManager, SpaError, navigation_data, to_css_class,
};
use common::Harness;

/// Test clear_overlays unloads from the top of the stack down
#[tokio::test]
async fn test_clear_overlays_unloads_in_reverse_order() {
    let h = Harness::new();
    h.app.register_overlay_types([h.probe_type("first", false), h.probe_type("second", false)]);

    h.app.add_overlay("first", None).await.unwrap();
    h.app.add_overlay("note", None).await.unwrap();
    h.app.add_overlay("second", None).await.unwrap();
    h.clear_log();

    h.app.clear_overlays().await.unwrap();

    assert_eq!(
        h.entries("unload:"),
        vec!["unload:second", "unload:note", "unload:first"]
    );
    assert!(h.app.overlays().is_empty());
}

/// Test overlays are stacked in insertion order and get their data
#[tokio::test]
async fn test_add_overlay_stacks_in_order() {
    let h = Harness::new();
    let data = navigation_data([("code", "family-42")]);

    let note = h.app.add_overlay("note", Some(data.clone())).await.unwrap();
    let focus = h.app.add_overlay("focus", None).await.unwrap();

    let stacked = h.app.overlays();
    assert_eq!(stacked.len(), 2);
    assert!(checkin_kiosk::spa::same_screen(&stacked[0], &note));
    assert!(checkin_kiosk::spa::same_screen(&stacked[1], &focus));
    assert_eq!(h.last("note").unwrap().received(), Some(data));
}

/// Test removing an overlay that was never stacked does nothing
#[tokio::test]
async fn test_remove_not_added_overlay_is_noop() {
    let h = Harness::new();
    let stacked = h.app.add_overlay("note", None).await.unwrap();
    let loose = h.app.overlay_type("note").unwrap().create(&h.app).unwrap();
    h.clear_log();

    h.app.remove_overlay(&loose).await.unwrap();

    assert!(h.entries("unload:").is_empty());
    assert_eq!(h.app.overlays().len(), 1);
    assert!(h.app.has_overlay(&stacked));
    assert!(!h.app.has_overlay(&loose));
}

/// Test an overlay cannot veto its own removal
#[tokio::test]
async fn test_remove_overlay_ignores_veto() {
    let h = Harness::new();
    let overlay = h.app.add_overlay("note", None).await.unwrap();
    h.last("note").unwrap().set_veto(true);

    h.app.remove_overlay(&overlay).await.unwrap();

    assert!(h.logged("unload:note"));
    assert!(!h.app.has_overlay(&overlay));
}

/// Test an unknown overlay type is NotFound and the stack is unchanged
#[tokio::test]
async fn test_unknown_overlay_not_found() {
    let h = Harness::new();
    h.app.add_overlay("note", None).await.unwrap();

    let Err(err) = h.app.add_overlay("missing", None).await else {
        panic!("adding an unknown overlay type succeeded");
    };

    match err.downcast_ref::<SpaError>() {
        Some(SpaError::NotFound { kind, .. }) => assert_eq!(*kind, ScreenKind::Overlay),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(h.app.overlays().len(), 1);
}

/// Test the first autofocus element of a new overlay gets focus
#[tokio::test]
async fn test_overlay_autofocus() {
    let h = Harness::new();
    h.app.add_overlay("note", None).await.unwrap();
    assert!(h.surface.focused().is_none());

    h.app.add_overlay("focus", None).await.unwrap();

    let focused = h.surface.focused_element().unwrap();
    assert_eq!(focused.tag, "button");
    assert_eq!(focused.text.as_deref(), Some("OK"));
}

/// Test stacking the same screen twice mounts it once, on top
#[tokio::test]
async fn test_double_add_mounts_once_on_top() {
    let h = Harness::new();
    let stack: ScreenStackManager<dyn Screen> =
        ScreenStackManager::new(h.surface.clone(), h.surface.root(), "test");
    let note_type = h.probe_type("note", false);
    let first = note_type.create(&h.app).unwrap();
    let second = note_type.create(&h.app).unwrap();

    stack.add(Rc::clone(&first)).await.unwrap();
    stack.add(Rc::clone(&second)).await.unwrap();
    h.clear_log();
    stack.add(Rc::clone(&first)).await.unwrap();

    assert!(h.entries("render:").is_empty());
    assert_eq!(stack.len(), 2);
    assert_eq!(h.surface.children(stack.root()).len(), 2);
    assert_eq!(
        h.surface.children(stack.root()).last().copied(),
        stack.node_of(&first)
    );
    assert!(checkin_kiosk::spa::same_screen(&stack.get_all()[1], &first));
}

/// Test the loading overlay shows, updates and hides its status
#[tokio::test]
async fn test_loading_overlay_status() {
    let h = Harness::new();
    let loading_root = h
        .surface
        .find_child_by_class(
            h.surface.root(),
            &format!("{}s-root", to_css_class(LOADING_NAMESPACE)),
        )
        .unwrap();
    let status_text = || {
        h.surface
            .children(loading_root)
            .first()
            .and_then(|node| h.surface.element(*node))
            .map(|e| e.text_content())
    };

    // Nothing to update yet
    h.app.set_loading_status("ignored").await.unwrap();
    assert!(h.app.loading_overlay().is_none());

    h.app.show_loading_overlay(Some("Loading A")).await.unwrap();
    assert_eq!(status_text(), Some(vec!["Loading A".to_string()]));
    assert!(!h.surface.is_hidden(loading_root));

    h.app.set_loading_status("Almost there").await.unwrap();
    assert_eq!(status_text(), Some(vec!["Almost there".to_string()]));

    // Showing again reuses the mounted overlay
    h.app.show_loading_overlay(None).await.unwrap();
    assert_eq!(h.entries("create:loading").len(), 1);

    h.app.hide_loading_overlay().await.unwrap();
    assert!(h.app.loading_overlay().is_none());
    assert!(h.surface.is_hidden(loading_root));
    assert_eq!(status_text(), None);
}
