use crate::handlers::commit_ticket::CommitTicket;

use std::time::Duration;

#[test]
fn given_pending_ticket_when_handler_commits_then_expiry_refused() {
    let ticket = CommitTicket::new(Duration::from_secs(1));

    assert!(ticket.commit());
    assert!(!ticket.expire());
    assert!(ticket.commit());
}

#[test]
fn given_expired_ticket_when_handler_commits_then_refused() {
    // Given
    let ticket = CommitTicket::new(Duration::from_secs(3));
    let handler_side = ticket.clone();

    // When
    let expired = ticket.expire();

    // Then
    assert!(expired);
    assert!(!handler_side.commit());
    assert_eq!(handler_side.timeout(), Duration::from_secs(3));
}
