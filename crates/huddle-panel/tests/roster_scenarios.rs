//! End-to-end roster scenarios against the in-memory session

use std::sync::Arc;

use huddle_core::{MockSession, MockSlotFactory, ParticipantId, RenderStats};
use huddle_panel::*;

const ADA: ParticipantId = ParticipantId(1);
const BO: ParticipantId = ParticipantId(2);
const CY: ParticipantId = ParticipantId(3);
const DEE: ParticipantId = ParticipantId(4);
const EVE: ParticipantId = ParticipantId(5);

fn setup(config: PanelConfig) -> (Arc<MockSession>, ParticipantPanel, Arc<RenderStats>) {
    let session = Arc::new(MockSession::new());
    let factory = MockSlotFactory::new();
    let stats = factory.stats();
    let mut panel = ParticipantPanel::new(session.clone(), Box::new(factory), config).unwrap();
    panel.activate().unwrap();
    (session, panel, stats)
}

fn join_all(session: &MockSession, panel: &mut ParticipantPanel, ids: &[(ParticipantId, &str)]) {
    for (id, name) in ids {
        session.connect(*id, *name);
    }
    panel.tick();
}

// ----------------------------------------------------------------------------
// Pool exhaustion
// ----------------------------------------------------------------------------

#[test]
fn test_fifth_joiner_waits_in_pool_of_four() {
    let (session, mut panel, _stats) = setup(PanelConfig::with_slots(4));
    join_all(
        &session,
        &mut panel,
        &[(ADA, "Ada"), (BO, "Bo"), (CY, "Cy"), (DEE, "Dee"), (EVE, "Eve")],
    );

    for id in [ADA, BO, CY, DEE] {
        assert!(panel.slot_for(id).is_some(), "{} should be displayed", id);
    }
    assert!(panel.slot_for(EVE).is_none());
    assert!(panel.tracker().is_tracked(EVE));
    assert_eq!(panel.tracker().waiting(panel.allocator()), vec![EVE]);

    // Eve's activity has no effect on any slot
    let before = panel.snapshot();
    session.set_amplitude(EVE, 0.9);
    session.rename(EVE, "Evelyn");
    panel.tick();
    assert_eq!(panel.snapshot(), before);
}

#[test]
fn test_leave_promotes_longest_waiting() {
    let (session, mut panel, _stats) = setup(PanelConfig::with_slots(4));
    join_all(
        &session,
        &mut panel,
        &[(ADA, "Ada"), (BO, "Bo"), (CY, "Cy"), (DEE, "Dee"), (EVE, "Eve")],
    );
    let ada_slot = panel.allocator().slot_index(ADA).unwrap();

    session.disconnect(ADA);
    panel.tick();

    assert!(!panel.tracker().is_tracked(ADA));
    assert_eq!(panel.allocator().slot_index(EVE), Some(ada_slot));
    assert_eq!(panel.slot_for(EVE).unwrap().name(), "Eve");
    assert!(panel.tracker().waiting(panel.allocator()).is_empty());
}

#[test]
fn test_freed_slot_stays_empty_without_reassignment() {
    let config = PanelConfig::with_slots(1).with_reassign(ReassignPolicy::None);
    let (session, mut panel, _stats) = setup(config);
    join_all(&session, &mut panel, &[(ADA, "Ada"), (BO, "Bo")]);

    session.disconnect(ADA);
    panel.tick();
    assert_eq!(panel.allocator().bound_count(), 0);
    assert!(panel.slot_for(BO).is_none());

    // A fresh join takes the free slot
    session.connect(CY, "Cy");
    panel.tick();
    assert_eq!(panel.allocator().slot_index(CY), Some(0));
}

#[test]
fn test_waiter_lost_during_leave_takes_slot_when_back() {
    let (session, mut panel, _stats) = setup(PanelConfig::with_slots(1));
    join_all(&session, &mut panel, &[(ADA, "Ada"), (BO, "Bo")]);

    session.make_unreachable(BO);
    session.disconnect(ADA);
    panel.tick();
    assert_eq!(panel.allocator().bound_count(), 0);

    session.restore(BO);
    panel.tick();
    assert_eq!(panel.allocator().slot_index(BO), Some(0));
    assert_eq!(panel.slot_for(BO).unwrap().name(), "Bo");

    session.connect(CY, "Cy");
    panel.tick();
    assert_eq!(panel.allocator().slot_index(BO), Some(0));
    assert_eq!(panel.tracker().waiting(panel.allocator()), vec![CY]);
}

// ----------------------------------------------------------------------------
// Idempotence
// ----------------------------------------------------------------------------

#[test]
fn test_double_join_matches_single_join() {
    let (session, mut once, _s1) = setup(PanelConfig::with_slots(2));
    session.connect(ADA, "Ada");
    once.tick();

    let (session2, mut twice, _s2) = setup(PanelConfig::with_slots(2));
    session2.connect(ADA, "Ada");
    twice.tick();
    assert_eq!(twice.handle_join(ADA), JoinOutcome::AlreadyTracked);

    assert_eq!(once.snapshot(), twice.snapshot());
    assert_eq!(twice.tracker().tracked_count(), 1);
    assert_eq!(session2.name_listener_count(ADA), 1);
}

#[test]
fn test_leave_for_untracked_is_noop() {
    let (session, mut panel, _stats) = setup(PanelConfig::with_slots(2));
    join_all(&session, &mut panel, &[(ADA, "Ada")]);
    let before = panel.snapshot();

    assert!(!panel.handle_leave(EVE));
    assert_eq!(panel.snapshot(), before);
    assert_eq!(panel.tracker().tracked_count(), 1);
}

// ----------------------------------------------------------------------------
// Source reachability and video
// ----------------------------------------------------------------------------

#[test]
fn test_unreachable_source_keeps_assignment() {
    let (session, mut panel, _stats) = setup(PanelConfig::with_slots(2));
    join_all(&session, &mut panel, &[(ADA, "Ada")]);
    session.spawn_video(ADA);
    session.set_amplitude(ADA, 0.7);
    panel.tick();
    assert!(panel.slot_for(ADA).unwrap().is_video_set());

    session.make_unreachable(ADA);
    let report = panel.tick();
    assert_eq!(report.degraded, 1);

    let slot = panel.slot_for(ADA).unwrap();
    assert_eq!(slot.amplitude(), 0.0);
    assert!(slot.is_mic_off());
    assert!(!slot.is_video_set());
    assert!(panel.tracker().is_tracked(ADA));
    assert_eq!(panel.allocator().slot_index(ADA), Some(0));

    // Only an explicit leave reclaims
    session.disconnect(ADA);
    panel.tick();
    assert!(panel.slot_for(ADA).is_none());
}

#[test]
fn test_late_video_binds_exactly_once() {
    let (session, mut panel, stats) = setup(PanelConfig::with_slots(2));
    join_all(&session, &mut panel, &[(ADA, "Ada")]);
    assert!(!panel.slot_for(ADA).unwrap().is_video_set());

    session.spawn_video(ADA);
    assert_eq!(panel.tick().video_bound, 1);
    assert!(panel.slot_for(ADA).unwrap().is_video_set());

    for _ in 0..5 {
        assert_eq!(panel.tick().video_bound, 0);
    }
    assert_eq!(stats.attaches(), 1);
}

#[test]
fn test_rebound_slot_has_no_stale_state() {
    let (session, mut panel, _stats) = setup(PanelConfig::with_slots(1));
    join_all(&session, &mut panel, &[(ADA, "Ada")]);
    session.spawn_video(ADA);
    session.set_amplitude(ADA, 0.8);
    panel.tick();

    session.disconnect(ADA);
    session.connect(BO, "");
    panel.tick();

    let slot = panel.slot_for(BO).unwrap();
    assert_eq!(slot.name(), "Player 2");
    assert!(!slot.is_video_set());
    assert_eq!(slot.amplitude(), 0.0);
}

// ----------------------------------------------------------------------------
// Failures and teardown
// ----------------------------------------------------------------------------

#[test]
fn test_slot_creation_failure_rolls_back() {
    let (session, mut panel, stats) = setup(PanelConfig::with_slots(2));
    stats.fail_next(1);
    session.connect(ADA, "Ada");
    panel.tick();

    assert!(!panel.tracker().is_tracked(ADA));
    assert_eq!(session.name_listener_count(ADA), 0);
    assert_eq!(panel.allocator().bound_count(), 0);

    // The next participant is unaffected
    session.connect(BO, "Bo");
    panel.tick();
    assert_eq!(panel.allocator().slot_index(BO), Some(0));
}

#[test]
fn test_join_before_spawn_is_ignored() {
    let (session, mut panel, _stats) = setup(PanelConfig::with_slots(2));
    session.connect_unspawned(ADA);
    panel.tick();
    assert!(!panel.tracker().is_tracked(ADA));
    assert_eq!(panel.allocator().bound_count(), 0);
}

#[test]
fn test_teardown_leaves_nothing_behind() {
    let config = PanelConfig::with_slots(3).with_pool_policy(PoolPolicy::Destroy);
    let (session, mut panel, stats) = setup(config);
    join_all(
        &session,
        &mut panel,
        &[(ADA, "Ada"), (BO, "Bo"), (CY, "Cy"), (DEE, "Dee")],
    );
    assert_eq!(stats.live(), 3);
    assert_eq!(session.listener_count(), 1);
    assert_eq!(session.total_name_listeners(), 4);

    panel.deactivate();
    assert_eq!(stats.live(), 0);
    assert_eq!(session.listener_count(), 0);
    assert_eq!(session.total_name_listeners(), 0);

    // Reactivation rebuilds from the connected set
    assert_eq!(panel.activate().unwrap(), 4);
    assert_eq!(panel.allocator().bound_count(), 3);
    drop(panel);
    assert_eq!(stats.live(), 0);
    assert_eq!(session.listener_count(), 0);
}
