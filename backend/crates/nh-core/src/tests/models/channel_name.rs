use crate::{ChannelName, CoreError, MAX_CHANNEL_NAME_LENGTH};

#[test]
fn test_channel_name_trims_whitespace() {
    let name = ChannelName::parse("  acme ").unwrap();
    assert_eq!(name.as_str(), "acme");
    assert_eq!(name.to_string(), "acme");
}

#[test]
fn test_channel_name_rejects_empty() {
    assert!(matches!(
        ChannelName::parse(""),
        Err(CoreError::ChannelRequired { .. })
    ));
    assert!(matches!(
        ChannelName::parse("   "),
        Err(CoreError::ChannelRequired { .. })
    ));
}

#[test]
fn test_channel_name_rejects_too_long() {
    let raw = "a".repeat(MAX_CHANNEL_NAME_LENGTH + 1);
    assert!(matches!(
        ChannelName::parse(&raw),
        Err(CoreError::Validation { .. })
    ));

    let raw = "a".repeat(MAX_CHANNEL_NAME_LENGTH);
    assert!(ChannelName::parse(&raw).is_ok());
}

#[test]
fn test_channel_name_rejects_control_characters() {
    assert!(matches!(
        ChannelName::parse("ac\u{0007}me"),
        Err(CoreError::Validation { .. })
    ));
}
