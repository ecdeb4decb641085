mod common;

use common::{
    FixedAttachments, MissingDocuments, RejectingUpdates, ScriptedNotifier, ledger_with, login,
    may, payment,
};
use remit_dispatch::application::dispatch::DispatchOrchestrator;
use remit_dispatch::application::selection::SelectionTracker;
use remit_dispatch::domain::notification::MessageTemplate;
use remit_dispatch::domain::payment::EmailStatus;
use remit_dispatch::domain::ports::{LedgerGateway, LedgerGatewayRef};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;

fn template() -> MessageTemplate {
    MessageTemplate::new("Payment {DocNum} - {CardName}", "Dear {CardName}")
}

fn statuses(tracker: &SelectionTracker) -> Vec<EmailStatus> {
    tracker.records().iter().map(|r| r.status().clone()).collect()
}

#[tokio::test]
async fn test_empty_destination_fails_while_others_are_sent() {
    let ledger = Arc::new(ledger_with(vec![
        payment(1, "a@x.com"),
        payment(2, ""),
        payment(3, "b@x.com,c@x.com"),
    ]));
    let attachments = FixedAttachments::default();
    let notifier = ScriptedNotifier::default();
    let orchestrator = DispatchOrchestrator::new(
        ledger.clone(),
        Box::new(attachments.clone()),
        Box::new(notifier.clone()),
        template(),
    );

    let session = login(ledger.as_ref()).await;
    let mut tracker = SelectionTracker::new();
    tracker.replace(ledger.list_unsent_payments(&session, may()).await.unwrap());
    tracker.toggle_all();

    let summary = orchestrator
        .dispatch(Some(&session), &mut tracker, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.attempted, 3);
    assert_eq!((summary.sent, summary.failed), (2, 1));
    assert_eq!(
        statuses(&tracker),
        vec![EmailStatus::Sent, EmailStatus::Error, EmailStatus::Sent]
    );

    let records = tracker.records();
    assert!(records[0].status_log().contains("OK"));
    assert!(records[1].status_log().contains("(To: )"));
    assert!(records[2].status_log().contains("OK"));
    assert!(records[2].status_log().contains("To: b@x.com, c@x.com"));

    // The record without an address never reached the collaborators.
    assert_eq!(attachments.calls(), 2);
    assert_eq!(notifier.calls(), 2);

    let updates = ledger.updates().await;
    let flags: Vec<(i32, bool)> = updates.iter().map(|u| (u.entry, u.success)).collect();
    assert_eq!(flags, vec![(1, true), (2, false), (3, true)]);
    assert_eq!(updates[1].audit_text, records[1].status_log());
}

#[tokio::test]
async fn test_delivery_failure_is_isolated_to_its_record() {
    let ledger = Arc::new(ledger_with(vec![
        payment(1, "a@x.com"),
        payment(2, "b@x.com"),
        payment(3, "c@x.com"),
    ]));
    let notifier = ScriptedNotifier::failing_on(&[2]);
    let orchestrator = DispatchOrchestrator::new(
        ledger.clone(),
        Box::new(FixedAttachments::default()),
        Box::new(notifier.clone()),
        template(),
    );

    let session = login(ledger.as_ref()).await;
    let mut tracker = SelectionTracker::new();
    tracker.replace(ledger.list_unsent_payments(&session, may()).await.unwrap());
    tracker.toggle_all();

    let summary = orchestrator
        .dispatch(Some(&session), &mut tracker, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(notifier.calls(), 3);
    assert_eq!(summary.attempted, 3);
    assert_eq!(
        statuses(&tracker),
        vec![EmailStatus::Sent, EmailStatus::Error, EmailStatus::Sent]
    );
    assert_eq!(tracker.sent_count(), 2);

    let failed = &tracker.records()[1];
    assert!(failed.status_log().starts_with("Error "));
    assert!(failed.status_log().contains("550 mailbox unavailable"));
    assert!(failed.status_log().ends_with("(To: b@x.com)"));
}

#[tokio::test]
async fn test_rejected_status_update_still_commits_locally() {
    let inner = ledger_with(vec![
        payment(1, "a@x.com"),
        payment(2, ""),
        payment(3, "c@x.com"),
    ]);
    let ledger = Arc::new(RejectingUpdates::new(inner));
    let gateway: LedgerGatewayRef = ledger.clone();
    let orchestrator = DispatchOrchestrator::new(
        gateway.clone(),
        Box::new(FixedAttachments::default()),
        Box::new(ScriptedNotifier::default()),
        template(),
    );

    let session = login(gateway.as_ref()).await;
    let mut tracker = SelectionTracker::new();
    tracker.replace(gateway.list_unsent_payments(&session, may()).await.unwrap());
    tracker.toggle_all();

    let summary = orchestrator
        .dispatch(Some(&session), &mut tracker, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.attempted, 3);
    assert_eq!(ledger.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(
        statuses(&tracker),
        vec![EmailStatus::Sent, EmailStatus::Error, EmailStatus::Sent]
    );
    assert!(tracker.records()[0].status_log().contains("OK"));
    assert_eq!(tracker.sent_count(), 2);
}

#[tokio::test]
async fn test_attachment_failure_skips_notifier() {
    let ledger = Arc::new(ledger_with(vec![payment(1, "a@x.com")]));
    let notifier = ScriptedNotifier::default();
    let orchestrator = DispatchOrchestrator::new(
        ledger.clone(),
        Box::new(MissingDocuments),
        Box::new(notifier.clone()),
        template(),
    );

    let session = login(ledger.as_ref()).await;
    let mut tracker = SelectionTracker::new();
    tracker.replace(ledger.list_unsent_payments(&session, may()).await.unwrap());
    tracker.toggle_all();

    orchestrator
        .dispatch(Some(&session), &mut tracker, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(notifier.calls(), 0);
    let record = &tracker.records()[0];
    assert_eq!(record.status(), &EmailStatus::Error);
    assert!(record.status_log().contains("No documents found for payment 4001"));
    assert_eq!(
        ledger.record(1).await.unwrap().status(),
        &EmailStatus::Error
    );
}

#[tokio::test]
async fn test_every_selected_record_ends_terminal() {
    let ledger = Arc::new(ledger_with(
        (1..=8)
            .map(|i| payment(i, if i % 3 == 0 { "" } else { "v@x.com" }))
            .collect(),
    ));
    let orchestrator = DispatchOrchestrator::new(
        ledger.clone(),
        Box::new(FixedAttachments::default()),
        Box::new(ScriptedNotifier::failing_on(&[1, 4])),
        template(),
    );

    let session = login(ledger.as_ref()).await;
    let mut tracker = SelectionTracker::new();
    tracker.replace(ledger.list_unsent_payments(&session, may()).await.unwrap());
    for entry in [1, 2, 3, 5, 6, 8] {
        tracker.set_selected(entry, true);
    }

    let summary = orchestrator
        .dispatch(Some(&session), &mut tracker, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.attempted, 6);
    for record in tracker.records() {
        if record.is_selected() {
            assert!(record.status().is_terminal(), "entry {}", record.doc_entry);
        } else {
            assert_eq!(record.status(), &EmailStatus::ToSend);
        }
    }
}

#[tokio::test]
async fn test_rerun_after_error_keeps_attempt_history() {
    let ledger = Arc::new(ledger_with(vec![payment(1, "a@x.com")]));
    let orchestrator = DispatchOrchestrator::new(
        ledger.clone(),
        Box::new(FixedAttachments::default()),
        Box::new(ScriptedNotifier::failing_on(&[1])),
        template(),
    );

    let session = login(ledger.as_ref()).await;
    let mut tracker = SelectionTracker::new();
    tracker.replace(ledger.list_unsent_payments(&session, may()).await.unwrap());
    tracker.toggle_all();

    let cancel = CancellationToken::new();
    orchestrator
        .dispatch(Some(&session), &mut tracker, &cancel)
        .await
        .unwrap();
    assert_eq!(tracker.records()[0].status(), &EmailStatus::Error);
    assert_eq!(tracker.selected_count(), 1);

    orchestrator
        .dispatch(Some(&session), &mut tracker, &cancel)
        .await
        .unwrap();

    let record = &tracker.records()[0];
    assert_eq!(record.status(), &EmailStatus::Sent);
    assert_eq!(record.audit_trail().len(), 2);
    assert!(record.audit_trail()[0].starts_with("Error "));
    assert!(record.status_log().starts_with("Sent "));
    assert_eq!(ledger.record(1).await.unwrap().status(), &EmailStatus::Sent);
}
