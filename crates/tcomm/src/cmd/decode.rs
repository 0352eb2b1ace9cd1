use serde_json::{Map, Value};
use tcomm_frame::{
    channel_name, is_request_response, GatewayHandler, GatewayMessage, TransportDecoder,
    TransportFrame, TuningHandler,
};

use crate::cmd::{DecodeArgs, Layer};
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{payload_preview, print_fields, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let frame = read_frame(&args)?;
    let fields = decode_frame(args.layer, &frame)?;
    print_fields(&fields, format);
    Ok(SUCCESS)
}

fn read_frame(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    match (&args.hex, &args.file) {
        (Some(text), _) => {
            let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            hex::decode(digits).map_err(|err| CliError::new(USAGE, format!("invalid hex: {err}")))
        }
        (None, Some(path)) => std::fs::read(path)
            .map_err(|err| io_error(&format!("failed to read {}", path.display()), err)),
        (None, None) => Err(CliError::new(USAGE, "one of --hex or --file is required")),
    }
}

pub(crate) fn decode_frame(layer: Layer, frame: &[u8]) -> CliResult<Map<String, Value>> {
    let mut fields = Map::new();
    match layer {
        Layer::Tuning => {
            let payload = TuningHandler::new()
                .decode_message(frame)
                .map_err(|err| frame_error("tuning decode failed", &err))?;
            fields.insert("layer".into(), "tuning".into());
            fields.insert("payload".into(), payload);
        }
        Layer::Transport => {
            let decoded = decode_transport(frame)?;
            fields.insert("layer".into(), "transport".into());
            transport_fields(&mut fields, &decoded);
            fields.insert(
                "payload".into(),
                payload_preview(&decoded.message.payload).into(),
            );
        }
        Layer::Gateway => {
            let routed = decode_gateway(frame)?;
            fields.insert("layer".into(), "gateway".into());
            gateway_fields(&mut fields, &routed);
            fields.insert("payload".into(), payload_preview(routed.payload()).into());
        }
        Layer::Stack => {
            let decoded = decode_transport(frame)?;
            let routed = decode_gateway(&decoded.message.payload)?;
            fields.insert("layer".into(), "stack".into());
            transport_fields(&mut fields, &decoded);
            gateway_fields(&mut fields, &routed);
            // Gateway payloads are normally JSON commands; show anything else verbatim.
            let payload = serde_json::from_slice::<Value>(routed.payload())
                .unwrap_or_else(|_| payload_preview(routed.payload()).into());
            fields.insert("command".into(), payload);
        }
    }
    Ok(fields)
}

fn decode_transport(frame: &[u8]) -> CliResult<TransportFrame> {
    TransportDecoder
        .decode_frame(frame)
        .map_err(|err| frame_error("transport decode failed", &err))
}

fn decode_gateway(frame: &[u8]) -> CliResult<GatewayMessage> {
    GatewayHandler::new()
        .decode_message(frame)
        .map_err(|err| frame_error("gateway decode failed", &err))
}

fn transport_fields(fields: &mut Map<String, Value>, frame: &TransportFrame) {
    fields.insert(
        "message_type".into(),
        frame.message.message_type.clone().into(),
    );
    insert_channel(fields, "channel", frame.message.channel);
    fields.insert("message_id".into(), frame.message_id.into());
    fields.insert("more_fragments".into(), frame.more_fragments.into());
    fields.insert("sequence".into(), frame.sequence.into());
}

fn gateway_fields(fields: &mut Map<String, Value>, routed: &GatewayMessage) {
    fields.insert("gateway_type".into(), routed.message_type().into());
    insert_channel(fields, "gateway_channel", routed.channel());
    fields.insert("origin".into(), routed.origin.to_urn().into());
    fields.insert("destination".into(), routed.destination.to_urn().into());
}

fn insert_channel(fields: &mut Map<String, Value>, key: &str, channel: i32) {
    let rendered = match channel_name(channel) {
        Some(name) => format!("{channel} ({name})"),
        None if is_request_response(channel) => format!("{channel} (request/response)"),
        None => channel.to_string(),
    };
    fields.insert(key.into(), rendered.into());
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tcomm_frame::{
        Identity, TransportHandler, TransportParams, DEE_WEBSITE_MESSAGING, GW_CHANNEL,
    };

    use super::*;
    use crate::exit::DATA_INVALID;

    fn push_frame() -> Vec<u8> {
        let service =
            Identity::parse_urn("urn:tcomm-endpoint:service:serviceName:DeeWebsiteMessagingService")
                .unwrap();
        let device =
            Identity::parse_urn("urn:tcomm-endpoint:device:deviceType:0:deviceSerialNumber:0")
                .unwrap();
        let routed = GatewayHandler::new()
            .encode_message(
                br#"{"command":"PUSH_ACTIVITY","payload":"{}"}"#,
                DEE_WEBSITE_MESSAGING,
                &service,
                &device,
            )
            .unwrap();
        TransportHandler::with_message_id(TransportParams::default(), 42)
            .encode_message(&routed, GW_CHANNEL)
            .unwrap()
            .to_vec()
    }

    #[test]
    fn stack_decodes_every_layer() {
        let fields = decode_frame(Layer::Stack, &push_frame()).unwrap();
        assert_eq!(fields["layer"], "stack");
        assert_eq!(fields["message_type"], "MSG");
        assert_eq!(fields["channel"], "866 (GW_CHANNEL)");
        assert_eq!(fields["message_id"], 42);
        assert_eq!(fields["more_fragments"], false);
        assert_eq!(fields["gateway_channel"], "46201 (DEE_WEBSITE_MESSAGING)");
        assert_eq!(
            fields["origin"],
            "urn:tcomm-endpoint:service:serviceName:DeeWebsiteMessagingService"
        );
        assert_eq!(
            fields["command"],
            json!({ "command": "PUSH_ACTIVITY", "payload": "{}" })
        );
    }

    #[test]
    fn tuning_layer_yields_json() {
        let frame = TuningHandler::new()
            .encode_json(&json!({ "protocolName": "A:H" }))
            .unwrap();
        let fields = decode_frame(Layer::Tuning, &frame).unwrap();
        assert_eq!(fields["payload"], json!({ "protocolName": "A:H" }));
    }

    #[test]
    fn corrupt_frame_is_data_invalid() {
        let mut frame = push_frame();
        let last = frame.len() - 1;
        frame[last] = b'X';
        let err = decode_frame(Layer::Transport, &frame).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn unnamed_channels_are_labelled_when_correlated() {
        let mut fields = Map::new();
        insert_channel(&mut fields, "named", 1_048_577);
        insert_channel(&mut fields, "correlated", 1_048_600);
        insert_channel(&mut fields, "plain", 12);
        assert_eq!(fields["named"], "1048577 (REQUEST_RESPONSE_CHANNEL_ID_START)");
        assert_eq!(fields["correlated"], "1048600 (request/response)");
        assert_eq!(fields["plain"], "12");
    }

    #[test]
    fn hex_input_ignores_whitespace() {
        let args = DecodeArgs {
            layer: Layer::Tuning,
            hex: Some("41 3a\n48".to_string()),
            file: None,
        };
        assert_eq!(read_frame(&args).unwrap(), b"A:H");

        let bad = DecodeArgs {
            layer: Layer::Tuning,
            hex: Some("zz".to_string()),
            file: None,
        };
        assert_eq!(read_frame(&bad).unwrap_err().code, USAGE);
    }
}
