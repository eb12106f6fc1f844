use crate::diameter::{DiameterAvp, DiameterHeader, DiameterPacket, AVP_FLAG_MANDATORY, HEADER_LEN};
use crate::error::{DccaError, Result};
use dcca_diameter_dict::{AvpDataType, DictionaryManager};
use dcca_shared::{Avp, AvpValue, DiameterMessage, AVP_SESSION_ID};

fn encode_value(value: &AvpValue) -> Vec<u8> {
    match value {
        AvpValue::OctetString(b) | AvpValue::Address(b) => b.to_vec(),
        AvpValue::Utf8String(s) | AvpValue::DiameterIdentity(s) => s.as_bytes().to_vec(),
        AvpValue::Unsigned32(v) | AvpValue::Time(v) => v.to_be_bytes().to_vec(),
        AvpValue::Unsigned64(v) => v.to_be_bytes().to_vec(),
        AvpValue::Integer32(v) | AvpValue::Enumerated(v) => v.to_be_bytes().to_vec(),
        AvpValue::Grouped(children) => children
            .iter()
            .flat_map(|child| encode_avp(child).serialize())
            .collect(),
    }
}

fn encode_avp(avp: &Avp) -> DiameterAvp {
    DiameterAvp {
        code: avp.code,
        flags: if avp.mandatory { AVP_FLAG_MANDATORY } else { 0 },
        vendor_id: avp.vendor_id,
        data: encode_value(&avp.value),
    }
}

/// Grouped AVPs nested deeper than this are rejected
pub const MAX_GROUP_DEPTH: usize = 16;

fn invalid_avp(raw: &DiameterAvp, dict: &DictionaryManager, reason: impl std::fmt::Display) -> DccaError {
    DccaError::InvalidAvpValue {
        code: raw.code,
        reason: format!("{}: {reason}", dict.name(raw.code, raw.vendor_id)),
    }
}

fn decode_avp(raw: &DiameterAvp, dict: &DictionaryManager, depth: usize) -> Result<Avp> {
    let value = match dict.data_type(raw.code, raw.vendor_id) {
        AvpDataType::Grouped => {
            if depth >= MAX_GROUP_DEPTH {
                return Err(invalid_avp(
                    raw,
                    dict,
                    format!("grouped AVPs nested deeper than {MAX_GROUP_DEPTH} levels"),
                ));
            }
            let children = DiameterAvp::parse_all(&raw.data).map_err(|e| invalid_avp(raw, dict, e))?;
            AvpValue::Grouped(
                children
                    .iter()
                    .map(|child| decode_avp(child, dict, depth + 1))
                    .collect::<Result<Vec<_>>>()?,
            )
        }
        _ => dict
            .parse_avp(raw.code, raw.vendor_id, &raw.data)
            .map_err(|e| invalid_avp(raw, dict, e))?,
    };

    Ok(Avp {
        code: raw.code,
        vendor_id: raw.vendor_id,
        mandatory: (raw.flags & AVP_FLAG_MANDATORY) != 0,
        value,
    })
}

/// Lower a logical message to its wire representation
pub fn encode_message(msg: &DiameterMessage) -> DiameterPacket {
    DiameterPacket {
        header: DiameterHeader {
            version: msg.version,
            length: HEADER_LEN as u32,
            flags: msg.flags,
            command_code: msg.command_code,
            application_id: msg.application_id,
            hop_by_hop_id: msg.hop_by_hop_id,
            end_to_end_id: msg.end_to_end_id,
        },
        avps: msg.avps.iter().map(encode_avp).collect(),
    }
}

/// Lift a wire packet into a typed AVP tree
pub fn decode_message(packet: &DiameterPacket, dict: &DictionaryManager) -> Result<DiameterMessage> {
    let mut msg = decode_envelope(packet);
    msg.avps = packet
        .avps
        .iter()
        .map(|raw| decode_avp(raw, dict, 0))
        .collect::<Result<Vec<_>>>()?;
    Ok(msg)
}

/// Header plus Session-Id only, for answering a packet whose AVPs do not decode
pub fn decode_envelope(packet: &DiameterPacket) -> DiameterMessage {
    let mut msg = DiameterMessage {
        version: packet.header.version,
        flags: packet.header.flags,
        command_code: packet.header.command_code,
        application_id: packet.header.application_id,
        hop_by_hop_id: packet.header.hop_by_hop_id,
        end_to_end_id: packet.header.end_to_end_id,
        avps: Vec::new(),
    };

    let session_id = packet
        .find_avp(AVP_SESSION_ID)
        .and_then(|raw| std::str::from_utf8(&raw.data).ok());
    if let Some(session_id) = session_id {
        msg.push_avp(Avp::utf8(AVP_SESSION_ID, session_id));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcca_shared::{
        APP_ID_CREDIT_CONTROL, AVP_CC_TIME, AVP_EVENT, AVP_EVENT_TYPE,
        AVP_MULTIPLE_SERVICES_CREDIT_CONTROL, AVP_REQUESTED_SERVICE_UNIT, CMD_CREDIT_CONTROL,
        VENDOR_ID_3GPP,
    };

    fn sample_request() -> DiameterMessage {
        let mut msg = DiameterMessage::new(CMD_CREDIT_CONTROL, APP_ID_CREDIT_CONTROL, true);
        msg.hop_by_hop_id = 0x1234;
        msg.end_to_end_id = 0x5678;
        msg.push_avp(Avp::utf8(AVP_SESSION_ID, "client;1;abc"))
            .push_avp(Avp::grouped(
                AVP_MULTIPLE_SERVICES_CREDIT_CONTROL,
                vec![Avp::grouped(
                    AVP_REQUESTED_SERVICE_UNIT,
                    vec![Avp::unsigned32(AVP_CC_TIME, 10)],
                )],
            ))
            .push_avp(Avp::vendor(
                AVP_EVENT_TYPE,
                VENDOR_ID_3GPP,
                AvpValue::Grouped(vec![Avp::vendor(AVP_EVENT, VENDOR_ID_3GPP, AvpValue::Integer32(1))]),
            ));
        msg
    }

    #[test]
    fn test_grouped_tree_survives_the_wire() {
        let dict = DictionaryManager::new();
        let msg = sample_request();

        let bytes = encode_message(&msg).serialize();
        let decoded = decode_message(&DiameterPacket::parse(&bytes).unwrap(), &dict).unwrap();

        assert_eq!(decoded, msg);
        assert_eq!(decoded.session_id(), Some("client;1;abc"));
    }

    #[test]
    fn test_unknown_avp_decodes_as_octets() {
        let dict = DictionaryManager::new();
        let mut msg = DiameterMessage::new(CMD_CREDIT_CONTROL, APP_ID_CREDIT_CONTROL, true);
        msg.push_avp(Avp::new(
            4242,
            AvpValue::OctetString(bytes::Bytes::from_static(b"opaque")),
        ));

        let packet = DiameterPacket::parse(&encode_message(&msg).serialize()).unwrap();
        let decoded = decode_message(&packet, &dict).unwrap();
        assert_eq!(decoded.avps, msg.avps);
    }

    #[test]
    fn test_bad_scalar_is_invalid_avp_value() {
        let dict = DictionaryManager::new();
        let packet = DiameterPacket {
            header: encode_message(&sample_request()).header,
            avps: vec![DiameterAvp {
                code: 268, // Result-Code must be 4 octets
                flags: AVP_FLAG_MANDATORY,
                vendor_id: None,
                data: vec![0, 1],
            }],
        };

        match decode_message(&packet, &dict) {
            Err(DccaError::InvalidAvpValue { code, .. }) => assert_eq!(code, 268),
            other => panic!("Expected InvalidAvpValue, got {other:?}"),
        }
    }

    // MSCC wrapped in itself `levels` times around an empty innermost group
    fn nested_mscc(levels: usize) -> DiameterAvp {
        let mut avp = DiameterAvp {
            code: AVP_MULTIPLE_SERVICES_CREDIT_CONTROL,
            flags: AVP_FLAG_MANDATORY,
            vendor_id: None,
            data: Vec::new(),
        };
        for _ in 1..levels {
            avp = DiameterAvp {
                data: avp.serialize(),
                ..avp
            };
        }
        avp
    }

    #[test]
    fn test_group_nesting_is_bounded() {
        let dict = DictionaryManager::new();
        let header = encode_message(&sample_request()).header;

        let shallow = DiameterPacket {
            header: header.clone(),
            avps: vec![nested_mscc(MAX_GROUP_DEPTH)],
        };
        assert!(decode_message(&shallow, &dict).is_ok());

        let deep = DiameterPacket {
            header,
            avps: vec![nested_mscc(2000)],
        };
        match decode_message(&deep, &dict) {
            Err(DccaError::InvalidAvpValue { code, .. }) => {
                assert_eq!(code, AVP_MULTIPLE_SERVICES_CREDIT_CONTROL)
            }
            other => panic!("Expected InvalidAvpValue, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_group_payload_is_invalid_avp_value() {
        let dict = DictionaryManager::new();
        let packet = DiameterPacket {
            header: encode_message(&sample_request()).header,
            avps: vec![DiameterAvp {
                code: AVP_MULTIPLE_SERVICES_CREDIT_CONTROL,
                flags: AVP_FLAG_MANDATORY,
                vendor_id: None,
                data: vec![0, 0, 1], // shorter than an AVP header
            }],
        };

        assert!(matches!(
            decode_message(&packet, &dict),
            Err(DccaError::InvalidAvpValue { .. })
        ));
    }

    #[test]
    fn test_envelope_of_undecodable_request() {
        let dict = DictionaryManager::new();
        let mut msg = sample_request();
        msg.push_avp(Avp::new(268, AvpValue::OctetString(bytes::Bytes::from_static(&[0, 1]))));
        let packet = DiameterPacket::parse(&encode_message(&msg).serialize()).unwrap();
        assert!(decode_message(&packet, &dict).is_err());

        let envelope = decode_envelope(&packet);
        assert!(envelope.is_ccr());
        assert_eq!(envelope.hop_by_hop_id, 0x1234);
        assert_eq!(envelope.end_to_end_id, 0x5678);
        assert_eq!(envelope.session_id(), Some("client;1;abc"));
        assert_eq!(envelope.avps.len(), 1);
    }
}
