mod common;

use common::{FixedAttachments, ScriptedNotifier, ledger_with, login, may, payment};
use remit_dispatch::domain::notification::MessageTemplate;
use remit_dispatch::domain::ports::{AttachmentBuilderBox, LedgerGatewayRef, NotifierBox};

#[tokio::test]
async fn test_ports_as_trait_objects() {
    let ledger: LedgerGatewayRef = std::sync::Arc::new(ledger_with(vec![payment(1, "a@x.com")]));
    let attachments: AttachmentBuilderBox = Box::new(FixedAttachments::default());
    let notifier: NotifierBox = Box::new(ScriptedNotifier::default());

    // Verify Send + Sync by spawning tasks
    let ledger_task = ledger.clone();
    let ledger_handle = tokio::spawn(async move {
        let session = login(ledger_task.as_ref()).await;
        ledger_task
            .list_unsent_payments(&session, may())
            .await
            .unwrap()
    });

    let delivery_handle = tokio::spawn(async move {
        let record = payment(2, "b@x.com");
        let files = attachments.build(&record).await.unwrap();
        let message = MessageTemplate::new("Payment {DocNum}", "")
            .compose(&record, files)
            .unwrap();
        notifier.send(&message).await.unwrap()
    });

    let rows = ledger_handle.await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].doc_entry, 1);

    let transcript = delivery_handle.await.unwrap();
    assert_eq!(transcript, "OK");
}
