use crate::tests::{channel, connection, memory_registry, next_frame};
use crate::{CloseReason, ConnectionState, JoinOutcome, LeaveOutcome, ServerFrame, WsError};

use nh_broker::{BrokerLink, NotificationPublisher, SubscriptionSource};

use std::sync::Arc;

use serde_json::json;

fn publisher(link: &Arc<nh_broker::InMemoryBrokerLink>) -> NotificationPublisher {
    let broker: Arc<dyn BrokerLink> = link.clone();
    NotificationPublisher::new(broker)
}

#[tokio::test]
async fn given_empty_channel_when_first_member_joins_then_upstream_subscribed() {
    // Given
    let (link, registry) = memory_registry();
    let (conn, _rx) = connection(8);

    // When
    let outcome = registry.join(&channel("acme"), &conn).await.unwrap();

    // Then
    assert_eq!(outcome, JoinOutcome::Joined);
    assert_eq!(registry.member_count("acme"), 1);
    assert!(registry.is_upstream_active("acme"));
    assert_eq!(link.upstream_subscribe_count(), 1);
    assert!(conn.is_tracking("acme"));
}

#[tokio::test]
async fn given_member_when_joining_again_then_already_member_and_no_new_subscription() {
    // Given
    let (link, registry) = memory_registry();
    let (conn, _rx) = connection(8);
    registry.join(&channel("acme"), &conn).await.unwrap();

    // When
    let outcome = registry.join(&channel("acme"), &conn).await.unwrap();

    // Then
    assert_eq!(outcome, JoinOutcome::AlreadyMember);
    assert_eq!(registry.member_count("acme"), 1);
    assert_eq!(link.upstream_subscribe_count(), 1);
}

#[tokio::test]
async fn given_second_member_when_joining_then_upstream_subscribed_once() {
    // Given
    let (link, registry) = memory_registry();
    let (first, _rx1) = connection(8);
    let (second, _rx2) = connection(8);
    registry.join(&channel("acme"), &first).await.unwrap();

    // When
    registry.join(&channel("acme"), &second).await.unwrap();

    // Then
    assert_eq!(registry.member_count("acme"), 2);
    assert_eq!(link.upstream_subscribe_count(), 1);
}

#[tokio::test]
async fn given_last_member_when_leaving_then_upstream_closed_and_channel_discarded() {
    // Given
    let (_link, registry) = memory_registry();
    let (conn, _rx) = connection(8);
    registry.join(&channel("acme"), &conn).await.unwrap();

    // When
    let outcome = registry.leave("acme", &conn).await;

    // Then
    assert_eq!(outcome, LeaveOutcome::Left);
    assert_eq!(registry.member_count("acme"), 0);
    assert_eq!(registry.channel_count(), 0);
    assert!(!registry.is_upstream_active("acme"));
    assert!(!conn.is_tracking("acme"));
}

#[tokio::test]
async fn given_one_of_two_members_when_leaving_then_upstream_stays_active() {
    // Given
    let (_link, registry) = memory_registry();
    let (first, _rx1) = connection(8);
    let (second, _rx2) = connection(8);
    registry.join(&channel("acme"), &first).await.unwrap();
    registry.join(&channel("acme"), &second).await.unwrap();

    // When
    registry.leave("acme", &first).await;

    // Then
    assert_eq!(registry.member_count("acme"), 1);
    assert!(registry.is_upstream_active("acme"));
}

#[tokio::test]
async fn given_non_member_when_leaving_then_not_member() {
    // Given
    let (_link, registry) = memory_registry();
    let (member, _rx1) = connection(8);
    let (stranger, _rx2) = connection(8);
    registry.join(&channel("acme"), &member).await.unwrap();

    // When
    let unknown = registry.leave("nowhere", &stranger).await;
    let not_joined = registry.leave("acme", &stranger).await;

    // Then
    assert_eq!(unknown, LeaveOutcome::NotMember);
    assert_eq!(not_joined, LeaveOutcome::NotMember);
    assert_eq!(registry.member_count("acme"), 1);
}

#[tokio::test]
async fn given_members_on_two_channels_when_published_then_only_that_channel_receives() {
    // Given
    let (link, registry) = memory_registry();
    let (acme, mut acme_rx) = connection(8);
    let (other, mut other_rx) = connection(8);
    registry.join(&channel("acme"), &acme).await.unwrap();
    registry.join(&channel("other"), &other).await.unwrap();

    // When
    publisher(&link)
        .publish("tester", &channel("acme"), json!({"x": 1}))
        .await
        .unwrap();

    // Then
    match next_frame(&mut acme_rx) {
        Some(ServerFrame::Message {
            channel, content, ..
        }) => {
            assert_eq!(channel, "acme");
            assert_eq!(content, json!({"x": 1}));
        }
        other => panic!("expected message frame, got {:?}", other),
    }
    assert!(next_frame(&mut acme_rx).is_none());
    assert!(next_frame(&mut other_rx).is_none());
}

#[tokio::test]
async fn given_raw_non_envelope_payload_when_delivered_then_fanned_out_as_content() {
    // Given
    let (link, registry) = memory_registry();
    let (conn, mut rx) = connection(8);
    registry.join(&channel("acme"), &conn).await.unwrap();

    // When
    link.publish("acme", "plain text".to_string()).await.unwrap();

    // Then
    match next_frame(&mut rx) {
        Some(ServerFrame::Message { content, .. }) => assert_eq!(content, json!("plain text")),
        other => panic!("expected message frame, got {:?}", other),
    }
}

#[tokio::test]
async fn given_connection_on_several_channels_when_leave_all_then_no_membership_remains() {
    // Given
    let (link, registry) = memory_registry();
    let (conn, mut rx) = connection(8);
    registry.join(&channel("acme"), &conn).await.unwrap();
    registry.join(&channel("beta"), &conn).await.unwrap();

    // When
    let left = registry.leave_all(&conn).await;
    link.publish("acme", "after".to_string()).await.unwrap();

    // Then
    assert_eq!(left, 2);
    assert!(conn.channels().is_empty());
    assert_eq!(registry.channel_count(), 0);
    assert!(!registry.is_member("acme", conn.id()));
    assert!(next_frame(&mut rx).is_none());
}

#[tokio::test]
async fn given_full_buffer_when_fanout_then_only_slow_member_marked_for_closure() {
    // Given
    let (link, registry) = memory_registry();
    let (slow, _slow_rx) = connection(1);
    let (fast, mut fast_rx) = connection(8);
    registry.join(&channel("acme"), &slow).await.unwrap();
    registry.join(&channel("acme"), &fast).await.unwrap();

    // When
    link.publish("acme", "one".to_string()).await.unwrap();
    link.publish("acme", "two".to_string()).await.unwrap();

    // Then
    assert_eq!(
        slow.state(),
        ConnectionState::Closing(CloseReason::SlowConsumer)
    );
    assert!(fast.is_open());
    assert!(next_frame(&mut fast_rx).is_some());
    assert!(next_frame(&mut fast_rx).is_some());
}

#[tokio::test]
async fn given_closing_connection_when_fanout_then_write_dropped() {
    // Given
    let (link, registry) = memory_registry();
    let (conn, mut rx) = connection(8);
    registry.join(&channel("acme"), &conn).await.unwrap();
    conn.begin_close(CloseReason::Normal);

    // When
    link.publish("acme", "late".to_string()).await.unwrap();

    // Then
    assert!(next_frame(&mut rx).is_none());
}

#[tokio::test]
async fn given_closing_connection_when_join_completes_then_membership_not_kept() {
    // Given
    let (_link, registry) = memory_registry();
    let (conn, _rx) = connection(8);
    conn.begin_close(CloseReason::Shutdown);

    // When
    let outcome = registry.join(&channel("acme"), &conn).await.unwrap();

    // Then
    assert_eq!(outcome, JoinOutcome::Joined);
    assert_eq!(registry.member_count("acme"), 0);
    assert!(!registry.is_upstream_active("acme"));
}

#[tokio::test]
async fn given_active_channels_when_broker_reconnects_then_all_resubscribed() {
    // Given
    let (link, registry) = memory_registry();
    let (acme, mut acme_rx) = connection(8);
    let (beta, _beta_rx) = connection(8);
    registry.join(&channel("acme"), &acme).await.unwrap();
    registry.join(&channel("beta"), &beta).await.unwrap();

    // When
    link.disconnect();
    assert!(!registry.is_upstream_active("acme"));
    link.reconnect().await.unwrap();
    publisher(&link)
        .publish("tester", &channel("acme"), json!({"after": "reconnect"}))
        .await
        .unwrap();

    // Then
    assert!(registry.is_upstream_active("acme"));
    assert!(registry.is_upstream_active("beta"));
    match next_frame(&mut acme_rx) {
        Some(ServerFrame::Message { content, .. }) => {
            assert_eq!(content, json!({"after": "reconnect"}))
        }
        other => panic!("expected message frame, got {:?}", other),
    }
}

#[tokio::test]
async fn given_channel_emptied_while_disconnected_when_reconnected_then_not_resubscribed() {
    // Given
    let (link, registry) = memory_registry();
    let (conn, _rx) = connection(8);
    registry.join(&channel("acme"), &conn).await.unwrap();
    link.disconnect();

    // When
    registry.leave("acme", &conn).await;
    link.reconnect().await.unwrap();

    // Then
    assert!(!registry.is_upstream_active("acme"));
    assert_eq!(link.active_channel_count(), 0);
}

#[tokio::test]
async fn given_disconnected_broker_when_joining_then_upstream_unavailable_and_no_state_left() {
    // Given
    let (link, registry) = memory_registry();
    let (conn, _rx) = connection(8);
    link.disconnect();

    // When
    let result = registry.join(&channel("acme"), &conn).await;

    // Then
    assert!(matches!(result, Err(WsError::UpstreamUnavailable { .. })));
    assert_eq!(registry.channel_count(), 0);
    assert!(!conn.is_tracking("acme"));
}

#[tokio::test]
async fn given_members_when_asked_as_source_then_reports_only_channels_with_members() {
    // Given
    let (_link, registry) = memory_registry();
    let (conn, _rx) = connection(8);
    registry.join(&channel("acme"), &conn).await.unwrap();
    registry.join(&channel("beta"), &conn).await.unwrap();
    registry.leave("beta", &conn).await;

    // When
    let reported: Vec<String> = registry
        .active_channels()
        .into_iter()
        .map(|(name, _)| name)
        .collect();

    // Then
    assert_eq!(reported, vec!["acme".to_string()]);
    assert_eq!(registry.channel_names(), vec!["acme".to_string()]);
}

#[tokio::test]
async fn given_refused_admission_when_first_member_joins_then_upstream_released() {
    // Given
    let (link, registry) = memory_registry();
    let (conn, _rx) = connection(8);

    // When
    let outcome = registry
        .join_if(&channel("acme"), &conn, || false)
        .await
        .unwrap();

    // Then
    assert_eq!(outcome, JoinOutcome::Abandoned);
    assert_eq!(registry.channel_count(), 0);
    assert!(!registry.is_upstream_active("acme"));
    assert!(!conn.is_tracking("acme"));
    assert_eq!(link.active_channel_count(), 0);
}

#[tokio::test]
async fn given_existing_member_when_admission_refused_then_channel_untouched() {
    // Given
    let (_link, registry) = memory_registry();
    let (member, _rx1) = connection(8);
    let (late, _rx2) = connection(8);
    registry.join(&channel("acme"), &member).await.unwrap();

    // When
    let outcome = registry
        .join_if(&channel("acme"), &late, || false)
        .await
        .unwrap();

    // Then
    assert_eq!(outcome, JoinOutcome::Abandoned);
    assert_eq!(registry.member_count("acme"), 1);
    assert!(registry.is_member("acme", member.id()));
    assert!(registry.is_upstream_active("acme"));
}
