//! End-to-end terminal scenarios.
//!
//! Each test drives a [`Terminal`](roomkey_terminal::Terminal) through ticks
//! on paused time and checks the device state, the card I/O and the backend
//! traffic together.

mod common;

use common::test_data::*;
use common::{Rig, room, wall_clock};
use roomkey_core::{CardUid, EventTimestamp};
use roomkey_hardware::RoomBlock;
use roomkey_network::{
    BackendCall, BackendError, BackendOperation, CardReadEvent, ConfirmWriteRequest,
    InspectionReport,
};
use roomkey_terminal::{
    AccessDecision, DenyReason, DeviceMode, InspectionOutcome, Poller, PresentationOutcome,
    ProvisionOutcome, Screen, TargetOrigin, TerminalConfig, WriteTarget,
};
use std::time::Duration;

fn access(decision: AccessDecision) -> PresentationOutcome {
    PresentationOutcome::Access(decision)
}

fn armed(id: &str, origin: TargetOrigin) -> DeviceMode {
    DeviceMode::Provision {
        target: Some(WriteTarget {
            room: room(id),
            origin,
        }),
    }
}

// ============================================================================
// Verify mode
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_matching_allowed_card_unlocks() {
    let mut rig = Rig::new().await;
    rig.backend.allow_card(CardUid::from_bytes(&GUEST_CARD));

    let outcome = rig.tap(&GUEST_CARD).await;

    assert_eq!(outcome, access(AccessDecision::Granted));
    assert_eq!(
        rig.backend.calls(),
        vec![BackendCall::SubmitCardRead(CardReadEvent {
            room: room(ASSIGNED_ROOM),
            uid: CardUid::from_bytes(&GUEST_CARD),
            timestamp: EventTimestamp::from_datetime(wall_clock()),
        })]
    );
    assert_eq!(
        rig.terminal.display().current(),
        &Screen::Unlocked {
            room: room(ASSIGNED_ROOM)
        }
    );

    rig.advance_ms(2000).await;
    assert_eq!(
        rig.terminal.display().current(),
        &Screen::Ready {
            room: room(ASSIGNED_ROOM)
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_room_mismatch_never_reaches_backend() {
    let mut rig = Rig::new().await;
    rig.backend.allow_card(CardUid::from_bytes(&OTHER_ROOM_CARD));

    let outcome = rig.tap(&OTHER_ROOM_CARD).await;

    assert_eq!(outcome, access(AccessDecision::Denied(DenyReason::RoomMismatch)));
    assert!(rig.backend.calls().is_empty());
    assert_eq!(
        rig.terminal.display().current(),
        &Screen::Denied(DenyReason::RoomMismatch)
    );
}

#[tokio::test(start_paused = true)]
async fn test_blank_card_denied_as_mismatch() {
    let mut rig = Rig::new().await;

    let outcome = rig.tap(&BLANK_CARD).await;

    assert_eq!(outcome, access(AccessDecision::Denied(DenyReason::RoomMismatch)));
    assert_eq!(rig.backend.call_count(BackendOperation::SubmitCardRead), 0);
}

#[tokio::test(start_paused = true)]
async fn test_backend_refusal_denies() {
    let mut rig = Rig::new().await;

    let outcome = rig.tap(&GUEST_CARD).await;

    assert_eq!(outcome, access(AccessDecision::Denied(DenyReason::NotAuthorized)));
    assert_eq!(rig.backend.call_count(BackendOperation::SubmitCardRead), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_backend_fails_closed() {
    let mut rig = Rig::new().await;
    rig.backend.allow_card(CardUid::from_bytes(&GUEST_CARD));
    rig.backend.fail_transport(BackendOperation::SubmitCardRead);

    let outcome = rig.tap(&GUEST_CARD).await;

    assert_eq!(outcome, access(AccessDecision::Denied(DenyReason::NotAuthorized)));
}

#[tokio::test(start_paused = true)]
async fn test_slow_backend_times_out_and_denies() {
    let mut rig = Rig::new().await;
    rig.backend.allow_card(CardUid::from_bytes(&GUEST_CARD));
    rig.backend.set_latency(Some(Duration::from_secs(10)));

    let started = tokio::time::Instant::now();
    let outcome = rig.tap(&GUEST_CARD).await;

    assert_eq!(outcome, access(AccessDecision::Denied(DenyReason::NotAuthorized)));
    assert_eq!(started.elapsed(), Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn test_same_card_debounced_within_cooldown() {
    let mut rig = Rig::new().await;
    rig.backend.allow_card(CardUid::from_bytes(&GUEST_CARD));

    assert_eq!(rig.tap(&GUEST_CARD).await, access(AccessDecision::Granted));
    assert_eq!(rig.tap(&GUEST_CARD).await, PresentationOutcome::Debounced);
    assert_eq!(rig.cards.read_count(), 1);
    assert_eq!(rig.backend.call_count(BackendOperation::SubmitCardRead), 1);

    // A different card is not held back by the first one's cooldown.
    assert_eq!(
        rig.tap(&OTHER_ROOM_CARD).await,
        access(AccessDecision::Denied(DenyReason::RoomMismatch))
    );

    rig.advance_ms(2000).await;
    assert_eq!(rig.tap(&GUEST_CARD).await, access(AccessDecision::Granted));
    assert_eq!(rig.backend.call_count(BackendOperation::SubmitCardRead), 2);
}

#[tokio::test(start_paused = true)]
async fn test_debounced_card_is_still_released() {
    let mut rig = Rig::new().await;
    rig.tap(&GUEST_CARD).await;
    rig.tap(&GUEST_CARD).await;

    let releases = rig
        .cards
        .operations()
        .into_iter()
        .filter(|op| matches!(op, roomkey_hardware::mock::CardOperation::Release { .. }))
        .count();
    assert_eq!(releases, 2);
}

// ============================================================================
// Provision mode
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_pending_write_arms_writes_and_reports() {
    let mut rig = Rig::new().await;
    rig.backend.queue_write(room(ASSIGNED_ROOM));

    let report = rig.advance_ms(2000).await;
    assert_eq!(report.polled, vec![Poller::PendingWrite, Poller::Inspection]);
    assert_eq!(
        rig.terminal.mode(),
        &armed(ASSIGNED_ROOM, TargetOrigin::Assigned)
    );
    assert_eq!(
        rig.terminal.display().current(),
        &Screen::WriteArmed {
            room: room(ASSIGNED_ROOM)
        }
    );

    let outcome = rig.tap(&BLANK_CARD).await;

    assert_eq!(
        outcome,
        PresentationOutcome::Provisioned(ProvisionOutcome::Written(room(ASSIGNED_ROOM)))
    );
    assert_eq!(
        rig.cards.card_memory(&BLANK_CARD),
        Some(RoomBlock::encode(&room(ASSIGNED_ROOM)))
    );
    assert_eq!(
        rig.backend.calls_for(BackendOperation::ConfirmWrite),
        vec![BackendCall::ConfirmWrite(ConfirmWriteRequest {
            room: room(ASSIGNED_ROOM),
            success: true,
        })]
    );
    assert_eq!(rig.terminal.mode(), &DeviceMode::Verify);
    assert_eq!(rig.terminal.display().current(), &Screen::WriteSucceeded);

    // The confirmed write is no longer pending: no re-arm.
    rig.advance_ms(2000).await;
    assert_eq!(rig.terminal.mode(), &DeviceMode::Verify);
}

#[tokio::test(start_paused = true)]
async fn test_failed_write_reported_and_rearmed() {
    let mut rig = Rig::new().await;
    rig.cards.fail_writes(&BLANK_CARD, true);
    rig.backend.queue_write(room(ASSIGNED_ROOM));
    rig.advance_ms(2000).await;

    let outcome = rig.tap(&BLANK_CARD).await;

    assert_eq!(
        outcome,
        PresentationOutcome::Provisioned(ProvisionOutcome::Failed(room(ASSIGNED_ROOM)))
    );
    assert_eq!(
        rig.backend.calls_for(BackendOperation::ConfirmWrite),
        vec![BackendCall::ConfirmWrite(ConfirmWriteRequest {
            room: room(ASSIGNED_ROOM),
            success: false,
        })]
    );
    assert_eq!(rig.terminal.mode(), &DeviceMode::Verify);
    assert_eq!(rig.terminal.display().current(), &Screen::WriteFailed);

    // The backend keeps asking for the write; the next poll arms again.
    rig.backend.queue_write(room(ASSIGNED_ROOM));
    rig.advance_ms(2000).await;
    assert_eq!(
        rig.terminal.mode(),
        &armed(ASSIGNED_ROOM, TargetOrigin::Assigned)
    );
}

#[tokio::test(start_paused = true)]
async fn test_withdrawn_write_cancels_target() {
    let mut rig = Rig::new().await;
    rig.backend.queue_write(room(ASSIGNED_ROOM));
    rig.advance_ms(2000).await;
    assert!(rig.terminal.mode().is_provision());

    rig.backend.cancel_write(&room(ASSIGNED_ROOM));
    rig.advance_ms(2000).await;

    assert_eq!(rig.terminal.mode(), &DeviceMode::Verify);
    assert_eq!(rig.cards.write_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unassigned_provision_claims_any_pending_write() {
    let mut rig = Rig::new().await;
    rig.terminal
        .handle_input(roomkey_hardware::LocalInput::ToggleMode);
    assert_eq!(rig.terminal.display().current(), &Screen::WriterWaiting);

    rig.backend.queue_write(room(CLAIMED_ROOM));
    rig.advance_ms(2000).await;

    assert_eq!(rig.terminal.mode(), &armed(CLAIMED_ROOM, TargetOrigin::Claimed));
    assert_eq!(
        rig.backend.call_count(BackendOperation::AnyPendingWrite),
        1
    );
    assert_eq!(rig.backend.call_count(BackendOperation::PendingWrite), 0);

    let outcome = rig.tap(&BLANK_CARD).await;
    assert_eq!(
        outcome,
        PresentationOutcome::Provisioned(ProvisionOutcome::Written(room(CLAIMED_ROOM)))
    );
    assert_eq!(
        rig.cards.card_memory(&BLANK_CARD),
        Some(RoomBlock::encode(&room(CLAIMED_ROOM)))
    );
    assert_eq!(rig.terminal.assigned_room(), &room(ASSIGNED_ROOM));
}

#[tokio::test(start_paused = true)]
async fn test_tap_without_target_touches_nothing() {
    let mut rig = Rig::new().await;
    rig.terminal
        .handle_input(roomkey_hardware::LocalInput::ToggleMode);

    let outcome = rig.tap(&GUEST_CARD).await;

    assert_eq!(
        outcome,
        PresentationOutcome::Provisioned(ProvisionOutcome::NoTarget)
    );
    assert_eq!(rig.cards.write_count(), 0);
    assert!(rig.backend.calls().is_empty());
    assert_eq!(rig.terminal.mode(), &DeviceMode::Provision { target: None });
}

#[tokio::test(start_paused = true)]
async fn test_writes_ignore_debounce() {
    let config = TerminalConfig {
        debounce_ms: 60_000,
        ..TerminalConfig::default()
    };
    let mut rig = Rig::with_config(config).await;
    rig.backend.allow_card(CardUid::from_bytes(&GUEST_CARD));
    assert_eq!(rig.tap(&GUEST_CARD).await, access(AccessDecision::Granted));

    rig.backend.queue_write(room(ASSIGNED_ROOM));
    rig.advance_ms(2000).await;
    let outcome = rig.tap(&GUEST_CARD).await;

    assert_eq!(
        outcome,
        PresentationOutcome::Provisioned(ProvisionOutcome::Written(room(ASSIGNED_ROOM)))
    );
}

// ============================================================================
// Inspection
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_inspection_consumed_by_one_presentation() {
    let mut rig = Rig::new().await;
    rig.backend.allow_card(CardUid::from_bytes(&GUEST_CARD));
    rig.backend.request_inspection();
    rig.advance_ms(2000).await;
    assert!(rig.terminal.inspection_pending());

    let outcome = rig.tap(&OTHER_ROOM_CARD).await;

    assert_eq!(
        outcome,
        PresentationOutcome::Inspected(InspectionOutcome::Found(room(OTHER_ROOM)))
    );
    assert_eq!(
        rig.backend.calls_for(BackendOperation::ConfirmInspection),
        vec![BackendCall::ConfirmInspection(InspectionReport::found(
            room(OTHER_ROOM),
            CardUid::from_bytes(&OTHER_ROOM_CARD),
        ))]
    );
    assert_eq!(rig.backend.call_count(BackendOperation::SubmitCardRead), 0);
    assert_eq!(
        rig.terminal.display().current(),
        &Screen::CardRoom {
            room: room(OTHER_ROOM)
        }
    );

    assert_eq!(rig.tap(&GUEST_CARD).await, access(AccessDecision::Granted));
}

#[tokio::test(start_paused = true)]
async fn test_inspection_flag_cleared_even_if_report_fails() {
    let mut rig = Rig::new().await;
    rig.backend.request_inspection();
    rig.backend.fail_transport(BackendOperation::ConfirmInspection);
    rig.advance_ms(2000).await;

    let first = rig.tap(&BLANK_CARD).await;
    let second = rig.tap(&GUEST_CARD).await;

    assert_eq!(first, PresentationOutcome::Inspected(InspectionOutcome::Unreadable));
    assert_eq!(rig.terminal.display().current(), &Screen::Denied(DenyReason::NotAuthorized));
    assert!(matches!(second, PresentationOutcome::Access(_)));
}

#[tokio::test(start_paused = true)]
async fn test_inspection_preempts_provision() {
    let mut rig = Rig::new().await;
    rig.backend.queue_write(room(ASSIGNED_ROOM));
    rig.backend.request_inspection();
    rig.advance_ms(2000).await;
    assert!(rig.terminal.mode().is_provision());

    let outcome = rig.tap(&GUEST_CARD).await;

    assert_eq!(
        outcome,
        PresentationOutcome::Inspected(InspectionOutcome::Found(room(ASSIGNED_ROOM)))
    );
    assert_eq!(rig.cards.write_count(), 0);
    assert_eq!(
        rig.terminal.mode(),
        &armed(ASSIGNED_ROOM, TargetOrigin::Assigned)
    );
}

#[tokio::test(start_paused = true)]
async fn test_inspection_ignores_debounce() {
    let config = TerminalConfig {
        debounce_ms: 60_000,
        ..TerminalConfig::default()
    };
    let mut rig = Rig::with_config(config).await;
    rig.tap(&GUEST_CARD).await;

    rig.backend.request_inspection();
    rig.advance_ms(2000).await;
    let outcome = rig.tap(&GUEST_CARD).await;

    assert_eq!(
        outcome,
        PresentationOutcome::Inspected(InspectionOutcome::Found(room(ASSIGNED_ROOM)))
    );
    assert_eq!(rig.tap(&GUEST_CARD).await, PresentationOutcome::Debounced);
}

// ============================================================================
// Remote config sync
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_same_room_sync_is_a_no_op() {
    let mut rig = Rig::new().await;

    let report = rig.advance_ms(3000).await;

    assert_eq!(report.polled, vec![Poller::ConfigSync]);
    assert_eq!(rig.terminal.assigned_room(), &room(ASSIGNED_ROOM));
    assert_eq!(
        rig.terminal.display().current(),
        &Screen::Ready {
            room: room(ASSIGNED_ROOM)
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_remote_room_adopted() {
    let mut rig = Rig::new().await;
    rig.backend.set_reader_room(Some(room("204")));

    rig.advance_ms(3000).await;

    assert_eq!(rig.terminal.assigned_room(), &room("204"));
    assert_eq!(
        rig.terminal.display().current(),
        &Screen::RemoteRoomSet { room: room("204") }
    );

    rig.advance_ms(1000).await;
    assert_eq!(
        rig.terminal.display().current(),
        &Screen::Ready { room: room("204") }
    );
}

#[tokio::test(start_paused = true)]
async fn test_missing_remote_room_keeps_current() {
    let mut rig = Rig::new().await;
    rig.backend.set_reader_room(None);

    rig.advance_ms(3000).await;

    assert_eq!(rig.terminal.assigned_room(), &room(ASSIGNED_ROOM));
}

#[tokio::test(start_paused = true)]
async fn test_reassignment_invalidates_assigned_target() {
    let mut rig = Rig::new().await;
    rig.backend.queue_write(room(ASSIGNED_ROOM));
    rig.advance_ms(2000).await;
    assert_eq!(
        rig.terminal.mode(),
        &armed(ASSIGNED_ROOM, TargetOrigin::Assigned)
    );

    rig.backend.set_reader_room(Some(room("204")));
    rig.advance_ms(1000).await;

    assert_eq!(rig.terminal.assigned_room(), &room("204"));
    assert_eq!(rig.terminal.mode(), &DeviceMode::Verify);
}

#[tokio::test(start_paused = true)]
async fn test_reassignment_keeps_claimed_target() {
    let mut rig = Rig::new().await;
    rig.terminal
        .handle_input(roomkey_hardware::LocalInput::ToggleMode);
    rig.backend.queue_write(room(CLAIMED_ROOM));
    rig.advance_ms(2000).await;

    rig.backend.set_reader_room(Some(room("204")));
    rig.advance_ms(1000).await;

    assert_eq!(rig.terminal.assigned_room(), &room("204"));
    assert_eq!(rig.terminal.mode(), &armed(CLAIMED_ROOM, TargetOrigin::Claimed));
}

// ============================================================================
// Resilience
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_unreachable_backend_leaves_state_untouched() {
    let mut rig = Rig::new().await;
    rig.backend.queue_write(room(ASSIGNED_ROOM));
    rig.backend.request_inspection();
    for operation in [
        BackendOperation::ReaderRoom,
        BackendOperation::PendingInspection,
        BackendOperation::PendingWrite,
        BackendOperation::AnyPendingWrite,
    ] {
        rig.backend.fail_transport(operation);
    }

    for _ in 0..5 {
        rig.advance_ms(1000).await;
    }

    assert_eq!(rig.terminal.mode(), &DeviceMode::Verify);
    assert!(!rig.terminal.inspection_pending());
    assert_eq!(rig.terminal.assigned_room(), &room(ASSIGNED_ROOM));
}

#[tokio::test(start_paused = true)]
async fn test_malformed_reply_treated_as_failure() {
    let mut rig = Rig::new().await;
    rig.backend.request_inspection();
    rig.backend.fail(
        BackendOperation::PendingInspection,
        BackendError::parse(BackendOperation::PendingInspection, "missing field `pending`"),
    );

    rig.advance_ms(2000).await;

    assert!(!rig.terminal.inspection_pending());
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_has_no_backend_traffic() {
    let mut rig = Rig::new().await;
    rig.advance_ms(4000).await;
    rig.backend.clear_calls();

    let report = rig.advance_ms(1000).await;

    assert_eq!(report.polled, vec![Poller::Heartbeat]);
    assert!(rig.backend.calls().is_empty());
}

// ============================================================================
// Local input
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_local_room_override_until_next_sync() {
    let mut rig = Rig::new().await;

    rig.terminal
        .handle_input(roomkey_hardware::LocalInput::SetRoom("204".into()));
    assert_eq!(rig.terminal.assigned_room(), &room("204"));

    // The backend still says 101, and wins on the next sync.
    rig.advance_ms(3000).await;
    assert_eq!(rig.terminal.assigned_room(), &room(ASSIGNED_ROOM));
}
