// Manual and automatic explosion, driven through the page controls.

mod common;

use common::*;
use glam::DVec3;
use scene_core::constants::{EXPLODE_HOLD_MS, EXPLODE_TICK_MS};
use scene_core::explode::{explode, Phase, TimerKind};

fn two_cubes() -> serde_json::Value {
    scene(vec![
        cube("left", [-1.0, 0.0, 0.0], true),
        cube("right", [1.0, 0.0, 0.0], true),
        cube("fixed", [0.0, 3.0, 0.0], false),
    ])
}

fn offsets(session: &scene_core::Shared<scene_core::Session>) -> Vec<DVec3> {
    session.borrow().scene.nodes.iter().map(|n| n.position).collect()
}

fn assert_close(a: DVec3, b: DVec3) {
    assert!((a - b).length() < 1e-9, "{a:?} != {b:?}");
}

#[test]
fn factor_two_doubles_centroid_offsets() {
    let (session, host) = bound_session(two_cubes());
    input(&host, "explodeRange", 2.0);
    let o = offsets(&session);
    assert_close(o[0], DVec3::new(-2.0, 0.0, 0.0));
    assert_close(o[1], DVec3::new(2.0, 0.0, 0.0));
    // nodes without a centroid never move
    assert_close(o[2], DVec3::ZERO);
}

#[test]
fn start_up_applies_tiny_factor() {
    let (session, _host) = bound_session(two_cubes());
    let o = offsets(&session);
    assert_close(o[1], DVec3::new(1e-6, 0.0, 0.0));
    assert!(session.borrow().scene.nodes[0].centroid.is_some());
    assert!(session.borrow().scene.nodes[2].centroid.is_none());
}

#[test]
fn manual_factor_is_not_clamped() {
    let (session, host) = bound_session(two_cubes());
    input(&host, "explodeRange", 9.0);
    assert_close(offsets(&session)[1], DVec3::new(9.0, 0.0, 0.0));
    input(&host, "explodeRange", -1.0);
    assert_close(offsets(&session)[1], DVec3::new(-1.0, 0.0, 0.0));
}

#[test]
fn automatic_cycle_clamps_and_holds() {
    let (session, host) = bound_session(two_cubes());
    input(&host, "explodingSpeedRange", 0.5);
    toggle(&host, "explodeCheckbox", true);
    assert_eq!(session.borrow().explosion.phase(), Phase::Exploding);

    // 1e-6 + 12 * 0.5 is just above 6, so the twelfth tick clamps
    for _ in 0..11 {
        let kind = fire_only_timer(&host);
        assert_eq!(kind, TimerKind::Interval { period_ms: EXPLODE_TICK_MS });
        assert!(session.borrow().explosion.factor() <= 6.0);
    }
    assert_eq!(session.borrow().explosion.phase(), Phase::Exploding);
    fire_only_timer(&host);
    assert_eq!(session.borrow().explosion.factor(), 6.0);
    assert_eq!(host.borrow().values.get("explodeRange"), Some(&6.0));
    assert_close(offsets(&session)[1], DVec3::new(6.0, 0.0, 0.0));

    // the interval is gone and a hold timeout took its place
    let live = host.borrow().live_timers();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].1, TimerKind::Timeout { delay_ms: EXPLODE_HOLD_MS });

    fire_only_timer(&host);
    assert_eq!(session.borrow().explosion.phase(), Phase::Imploding);
    // twelve ticks land exactly on 0, the thirteenth clamps
    for _ in 0..13 {
        fire_only_timer(&host);
        assert!(session.borrow().explosion.factor() >= 0.0);
    }
    assert_eq!(session.borrow().explosion.factor(), 0.0);
    assert_eq!(
        session.borrow().explosion.phase(),
        Phase::Holding(scene_core::explode::Direction::Out)
    );
    assert_eq!(host.borrow().values.get("explodeRange"), Some(&0.0));

    fire_only_timer(&host);
    assert_eq!(session.borrow().explosion.phase(), Phase::Exploding);
}

#[test]
fn ticks_mirror_factor_into_slider() {
    let (session, host) = bound_session(two_cubes());
    toggle(&host, "explodeCheckbox", true);
    fire_only_timer(&host);
    fire_only_timer(&host);
    let factor = session.borrow().explosion.factor();
    assert!((factor - (1e-6 + 0.1)).abs() < 1e-12);
    assert_eq!(host.borrow().values.get("explodeRange"), Some(&factor));
}

#[test]
fn only_one_timer_is_ever_live() {
    let (_session, host) = bound_session(two_cubes());
    toggle(&host, "explodeCheckbox", true);
    toggle(&host, "explodeCheckbox", true);
    assert_eq!(host.borrow().live_timers().len(), 1);
}

#[test]
fn disabling_cancels_timers() {
    let (session, host) = bound_session(two_cubes());
    toggle(&host, "explodeCheckbox", true);
    fire_only_timer(&host);
    toggle(&host, "explodeCheckbox", false);
    assert!(host.borrow().live_timers().is_empty());
    assert_eq!(session.borrow().explosion.phase(), Phase::Idle);

    // disabling during a hold also clears the timeout
    input(&host, "explodingSpeedRange", 10.0);
    toggle(&host, "explodeCheckbox", true);
    fire_only_timer(&host);
    assert!(matches!(session.borrow().explosion.phase(), Phase::Holding(_)));
    toggle(&host, "explodeCheckbox", false);
    assert!(host.borrow().live_timers().is_empty());
}

#[test]
fn stale_timer_is_ignored() {
    let (session, host) = bound_session(two_cubes());
    toggle(&host, "explodeCheckbox", true);
    let (first, _) = host.borrow().live_timers()[0];
    toggle(&host, "explodeCheckbox", false);
    toggle(&host, "explodeCheckbox", true);
    let factor = session.borrow().explosion.factor();

    // an old interval callback still queued by the page does nothing
    let callback = {
        let h = host.borrow();
        h.timers.values().next().map(|(_, cb)| cb.clone())
    };
    let callback = callback.unwrap();
    (&mut **callback.borrow_mut())(first);
    assert_eq!(session.borrow().explosion.factor(), factor);
}

#[test]
fn no_explosion_controls_without_explodable_nodes() {
    let (_session, host) = bound_session(scene(vec![cube("c", [1.0, 0.0, 0.0], false)]));
    let target = scene_core::host::Target::Element("explodeCheckbox".into());
    assert_eq!(
        host.borrow()
            .listeners_on(&target, scene_core::host::EventKind::Change),
        0
    );
}

#[test]
fn explode_moves_only_nodes_with_centroids() {
    let (session, _host) = bound_session(two_cubes());
    explode(&mut session.borrow_mut().scene, 3.0);
    let o = offsets(&session);
    assert_close(o[0], DVec3::new(-3.0, 0.0, 0.0));
    assert_close(o[2], DVec3::ZERO);
}
