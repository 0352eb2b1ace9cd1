//! Named channel IDs.
//!
//! These values are part of the wire contract with the messaging gateway and
//! must not change.

pub const CHANNEL_FOR_BATCHED_METRICS: i32 = 106;
pub const CHANNEL_FOR_DEGS: i32 = 1026;
pub const CHANNEL_FOR_ECHO_2_CHANNEL_TEST: i32 = 1_048_574;
pub const CHANNEL_FOR_ECHO_TEST: i32 = 1_048_575;
pub const CHANNEL_FOR_HEARTBEAT: i32 = 101;
pub const CHANNEL_FOR_LOOPBACK: i32 = 1_048_568;
pub const CHANNEL_FOR_S2DM: i32 = 480;
pub const CHANNEL_FOR_S2DM_ACK: i32 = 481;
pub const CHANNEL_FOR_SINGLE_METRICS: i32 = 105;
pub const CHANNEL_FOR_SYSTEM_MESSAGES: i32 = 120;
/// Gateway channel carrying website push commands.
pub const DEE_WEBSITE_MESSAGING: i32 = 46201;
pub const DEMO_SEND_MESSAGE_TEST_CHANNEL: i32 = 1_048_572;
pub const DROP_DATA_TEST_CHANNEL: i32 = 1_048_569;
pub const GATEWAY_ECHO_TEST_CHANNEL: i32 = 1_048_573;
pub const GATEWAY_TRANSPARENT_TEST_CHANNEL: i32 = 1_048_571;
pub const GMD_CHANNEL: i32 = 463;
/// Transport channel carrying gateway frames.
pub const GW_CHANNEL: i32 = 866;
pub const GW_CTL_CHANNEL: i32 = 867;
pub const GW_HANDSHAKE_CHANNEL: i32 = 865;
pub const HEARTBEAT_TEST_CHANNEL: i32 = 1_048_570;
pub const INVALID_CHANNEL_ID: i32 = -1;
pub const RAW_MESSAGE_CHANNEL_FOR_DEGS: i32 = 1026;
pub const REQUEST_RESPONSE_CHANNEL_ID_START: i32 = 1_048_577;
pub const RMR_N_TIMES_TEST_CHANNEL: i32 = 202;
pub const RMR_TEST_CHANNEL: i32 = 200;
pub const RMR_THREADING_TEST_CHANNEL: i32 = 201;

/// Every named channel, in table order.
pub const NAMED_CHANNELS: &[(&str, i32)] = &[
    ("CHANNEL_FOR_BATCHED_METRICS", CHANNEL_FOR_BATCHED_METRICS),
    ("CHANNEL_FOR_DEGS", CHANNEL_FOR_DEGS),
    (
        "CHANNEL_FOR_ECHO_2_CHANNEL_TEST",
        CHANNEL_FOR_ECHO_2_CHANNEL_TEST,
    ),
    ("CHANNEL_FOR_ECHO_TEST", CHANNEL_FOR_ECHO_TEST),
    ("CHANNEL_FOR_HEARTBEAT", CHANNEL_FOR_HEARTBEAT),
    ("CHANNEL_FOR_LOOPBACK", CHANNEL_FOR_LOOPBACK),
    ("CHANNEL_FOR_S2DM", CHANNEL_FOR_S2DM),
    ("CHANNEL_FOR_S2DM_ACK", CHANNEL_FOR_S2DM_ACK),
    ("CHANNEL_FOR_SINGLE_METRICS", CHANNEL_FOR_SINGLE_METRICS),
    ("CHANNEL_FOR_SYSTEM_MESSAGES", CHANNEL_FOR_SYSTEM_MESSAGES),
    ("DEE_WEBSITE_MESSAGING", DEE_WEBSITE_MESSAGING),
    (
        "DEMO_SEND_MESSAGE_TEST_CHANNEL",
        DEMO_SEND_MESSAGE_TEST_CHANNEL,
    ),
    ("DROP_DATA_TEST_CHANNEL", DROP_DATA_TEST_CHANNEL),
    ("GATEWAY_ECHO_TEST_CHANNEL", GATEWAY_ECHO_TEST_CHANNEL),
    (
        "GATEWAY_TRANSPARENT_TEST_CHANNEL",
        GATEWAY_TRANSPARENT_TEST_CHANNEL,
    ),
    ("GMD_CHANNEL", GMD_CHANNEL),
    ("GW_CHANNEL", GW_CHANNEL),
    ("GW_CTL_CHANNEL", GW_CTL_CHANNEL),
    ("GW_HANDSHAKE_CHANNEL", GW_HANDSHAKE_CHANNEL),
    ("HEARTBEAT_TEST_CHANNEL", HEARTBEAT_TEST_CHANNEL),
    ("INVALID_CHANNEL_ID", INVALID_CHANNEL_ID),
    ("RAW_MESSAGE_CHANNEL_FOR_DEGS", RAW_MESSAGE_CHANNEL_FOR_DEGS),
    (
        "REQUEST_RESPONSE_CHANNEL_ID_START",
        REQUEST_RESPONSE_CHANNEL_ID_START,
    ),
    ("RMR_N_TIMES_TEST_CHANNEL", RMR_N_TIMES_TEST_CHANNEL),
    ("RMR_TEST_CHANNEL", RMR_TEST_CHANNEL),
    ("RMR_THREADING_TEST_CHANNEL", RMR_THREADING_TEST_CHANNEL),
];

/// Returns the first table name for a channel ID, if it has one.
///
/// 1026 is listed twice in the table; the first entry wins.
pub fn channel_name(id: i32) -> Option<&'static str> {
    NAMED_CHANNELS
        .iter()
        .find(|(_, channel)| *channel == id)
        .map(|(name, _)| *name)
}

/// Returns true for channels reserved for request/response correlation.
pub fn is_request_response(id: i32) -> bool {
    id >= REQUEST_RESPONSE_CHANNEL_ID_START
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve() {
        assert_eq!(channel_name(866), Some("GW_CHANNEL"));
        assert_eq!(channel_name(46201), Some("DEE_WEBSITE_MESSAGING"));
        assert_eq!(channel_name(1026), Some("CHANNEL_FOR_DEGS"));
        assert_eq!(channel_name(-1), Some("INVALID_CHANNEL_ID"));
        assert_eq!(channel_name(7), None);
    }

    #[test]
    fn table_has_every_channel() {
        assert_eq!(NAMED_CHANNELS.len(), 26);
    }

    #[test]
    fn request_response_range() {
        assert!(is_request_response(REQUEST_RESPONSE_CHANNEL_ID_START));
        assert!(!is_request_response(GW_CHANNEL));
    }
}
