// tests/integration/events.rs

use employee_directory::audit_log;
use employee_directory::events::EventHub;

#[tokio::test]
async fn audit_macro_expands_outside_the_crate() {
    let hub = EventHub::new();
    let mut rx = hub.subscribe();

    audit_log!(hub, "employees.import", "org-1", None, "imported" => 3);

    let event = rx.recv().await.unwrap();
    assert_eq!(event.action, "employees.import");
    assert_eq!(event.client, None);
    assert_eq!(event.metadata["imported"], "3");
}
