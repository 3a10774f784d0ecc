// Settings panel: kind and object visibility, transparency, rotation,
// camera switching and reset.

mod common;

use common::*;
use glam::DVec3;
use scene_core::camera::Projection;
use scene_core::constants::ROTATION_STEP;
use scene_core::host::ControlState;
use scene_core::scene::ObjectKind;
use scene_core::Shared;
use serde_json::json;

fn checkbox_id(host: &Shared<FakeHost>, container: &str, name: &str) -> String {
    host.borrow()
        .checkbox(container, name)
        .map(|c| c.id.clone())
        .unwrap_or_else(|| panic!("no checkbox {name} in {container}"))
}

#[test]
fn kind_checkboxes_list_contained_kinds_in_key_order() {
    let (_session, host) = bound_session(scene(vec![cube("a", [0.0; 3], false)]));
    let h = host.borrow();
    let listed: Vec<(&str, &str)> = h
        .checkboxes
        .iter()
        .filter(|c| c.container == "shownObjectTypesList")
        .map(|c| (c.name.as_str(), c.caption.as_str()))
        .collect();
    assert_eq!(
        listed,
        [
            ("faces", "Faces"),
            ("lines", "Edges"),
            ("pointlabels", "Point labels"),
            ("points", "Points"),
        ]
    );
}

#[test]
fn hiding_a_kind_touches_only_that_kind() {
    let (session, host) = bound_session(scene(vec![
        cube("a", [0.0; 3], false),
        cube("b", [2.0, 0.0, 0.0], false),
    ]));
    let lines = checkbox_id(&host, "shownObjectTypesList", "lines");
    toggle(&host, &lines, false);

    assert_eq!(kind_visible(&session, "lines"), [false, false]);
    for other in ["points", "pointlabels", "frontfaces", "backfaces"] {
        assert_eq!(kind_visible(&session, other), [true, true], "{other}");
    }
    assert!(!session.borrow().display.is_kind_visible(ObjectKind::Lines));
    assert!(session.borrow().display.is_kind_visible(ObjectKind::Points));

    toggle(&host, &lines, true);
    assert_eq!(kind_visible(&session, "lines"), [true, true]);
}

#[test]
fn faces_toggle_both_meshes() {
    let (session, host) = bound_session(scene(vec![cube("a", [0.0; 3], false)]));
    let faces = checkbox_id(&host, "shownObjectTypesList", "faces");
    toggle(&host, &faces, false);
    assert_eq!(kind_visible(&session, "frontfaces"), [false]);
    assert_eq!(kind_visible(&session, "backfaces"), [false]);
    assert_eq!(kind_visible(&session, "lines"), [true]);
}

#[test]
fn object_checkboxes_hide_whole_nodes() {
    let (session, host) = bound_session(scene(vec![
        cube("first", [0.0; 3], false),
        cube("second", [2.0, 0.0, 0.0], false),
    ]));
    let second = host.borrow().checkbox("shownObjectsList", "1").cloned().unwrap();
    assert_eq!(second.caption, "second");
    toggle(&host, &second.id, false);

    let s = session.borrow();
    assert!(s.scene.nodes[0].visible);
    assert!(!s.scene.nodes[1].visible);
    assert!(!s.display.is_object_visible(1));
    // sub-object flags are untouched
    assert_eq!(s.scene.nodes[1].object_by_name("lines").map(|o| o.visible), Some(true));
}

#[test]
fn transparency_sets_opacity_on_every_facet_material() {
    let (session, host) = bound_session(scene(vec![cube("a", [0.0; 3], false), hinged_pair()]));
    input(&host, "transparencyRange", 0.25);
    let s = session.borrow();
    for node in &s.scene.nodes {
        assert!(!node.facet_materials.is_empty());
        for id in &node.facet_materials {
            assert_eq!(node.material(*id).unwrap().opacity, 0.75);
        }
    }
    // edge materials keep their opacity
    let cube = &s.scene.nodes[0];
    let edge_opacity: Vec<f32> = cube
        .materials
        .iter()
        .enumerate()
        .filter(|(i, _)| !cube.facet_materials.iter().any(|m| m.0 == *i))
        .map(|(_, m)| m.opacity)
        .collect();
    assert!(edge_opacity.iter().all(|&o| o == 1.0));
}

#[test]
fn rotation_advances_enabled_axes_each_frame() {
    let (session, host) = bound_session(scene(vec![cube("a", [0.0; 3], false)]));
    toggle(&host, "changeRotationY", true);
    input(&host, "rotationSpeedRange", 2.0);
    session.borrow_mut().frame();
    session.borrow_mut().frame();
    let r = session.borrow().scene.rotation;
    assert!((r - DVec3::new(0.0, 4.0 * ROTATION_STEP, 0.0)).length() < 1e-12);

    toggle(&host, "changeRotationY", false);
    session.borrow_mut().frame();
    assert_eq!(session.borrow().scene.rotation, r);
}

#[test]
fn reset_restores_rotation_and_camera_poses() {
    let doc = json!({
        "nodes": [cube("a", [0.0; 3], false)],
        "cameras": [
            {"type": "perspective", "fov": 45, "position": [0, 0, 8]},
            {"type": "orthographic", "frustum_size": 4, "position": [3, 3, 3]}
        ]
    });
    let (session, host) = bound_session(doc);
    toggle(&host, "changeRotationX", true);
    session.borrow_mut().frame();
    {
        let mut s = session.borrow_mut();
        s.cameras.active_mut().pose.eye = DVec3::new(1.0, 2.0, 3.0);
        s.cameras.look_at(DVec3::ONE);
    }
    click(&host, "resetButton");
    let s = session.borrow();
    assert_eq!(s.scene.rotation, DVec3::ZERO);
    assert_eq!(s.cameras.active().pose.eye, DVec3::new(0.0, 0.0, 8.0));
    assert_eq!(s.cameras.active_control().target, DVec3::ZERO);
}

#[test]
fn camera_select_switches_active_pair_and_refits_projection() {
    let doc = json!({
        "nodes": [cube("a", [0.0; 3], false)],
        "cameras": [
            {"type": "perspective", "fov": 45, "position": [0, 0, 8]},
            {"type": "orthographic", "frustum_size": 4, "position": [3, 3, 3]}
        ]
    });
    let (session, host) = bound_session(doc);
    host.borrow_mut().aspect = 2.0;
    change(
        &host,
        "cameraType",
        ControlState {
            selected_index: Some(1),
            ..Default::default()
        },
    );
    let s = session.borrow();
    assert_eq!(s.cameras.active_index(), 1);
    let enabled: Vec<bool> = s.cameras.controls().iter().map(|c| c.enabled).collect();
    assert_eq!(enabled, [false, true]);
    match s.cameras.active().projection {
        Projection::Orthographic { left, right, .. } => assert_eq!((left, right), (-4.0, 4.0)),
        ref other => panic!("unexpected projection {other:?}"),
    }
}

#[test]
fn unknown_camera_index_keeps_current_camera() {
    let (session, host) = bound_session(scene(vec![cube("a", [0.0; 3], false)]));
    change(
        &host,
        "cameraType",
        ControlState {
            selected_index: Some(4),
            ..Default::default()
        },
    );
    assert_eq!(session.borrow().cameras.active_index(), 0);
}

#[test]
fn settings_buttons_show_and_hide_panel() {
    let (session, host) = bound_session(scene(vec![cube("a", [0.0; 3], false)]));
    click(&host, "showSettingsButton");
    {
        let h = host.borrow();
        assert_eq!(h.visible.get("settings"), Some(&true));
        assert_eq!(h.visible.get("showSettingsButton"), Some(&false));
        assert_eq!(h.visible.get("hideSettingsButton"), Some(&true));
    }
    assert!(session.borrow().display.settings_shown);

    click(&host, "hideSettingsButton");
    assert_eq!(host.borrow().visible.get("settings"), Some(&false));
    assert!(!session.borrow().display.settings_shown);
}

#[test]
fn element_ids_carry_the_output_suffix() {
    let doc = json!({
        "nodes": [cube("a", [1.0, 0.0, 0.0], true)],
        "config": {"output_id": "x7"}
    });
    let (session, host) = bound_session(doc);
    input(&host, "explodeRange_x7", 2.0);
    assert_eq!(session.borrow().scene.nodes[0].position, DVec3::new(2.0, 0.0, 0.0));
    assert!(host.borrow().checkbox("shownObjectsList_x7", "0").is_some());
}

#[test]
fn missing_page_element_fails_binding() {
    let data: scene_core::SceneData =
        serde_json::from_value(scene(vec![cube("a", [0.0; 3], false)])).unwrap();
    let mut page = FakeHost::with_page(&data.config);
    page.elements.remove("resetButton");
    let host = shared(page);
    let session = shared(scene_core::Session::from_data(&data));
    match scene_core::bind(&session, &host) {
        Err(scene_core::SceneError::MissingElement(id)) => assert_eq!(id, "resetButton"),
        other => panic!("expected missing element, got {other:?}"),
    }
}
