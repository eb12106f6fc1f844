//! Builds the AVP tree of Credit-Control requests and answers.
//!
//! Request layout (RFC 4006 CCR plus 3GPP TS 32.299 IMS charging):
//!
//! ```text
//! Session-Id, Origin-Host, Origin-Realm, Destination-Realm,
//! Auth-Application-Id, Service-Context-Id, CC-Request-Type,
//! CC-Request-Number, Destination-Host, Event-Timestamp,
//! Subscription-Id { E.164 }, Subscription-Id { IMSI },
//! Multiple-Services-Credit-Control { Requested-Service-Unit { CC-Time } },
//! Service-Information { IMS-Information { Event-Type { Event },
//!     Node-Functionality, Calling-Party-Address, Called-Party-Address } }
//! ```
//!
//! TERMINATION keeps an empty Multiple-Services-Credit-Control group.

use chrono::{DateTime, Utc};
use dcca_shared::{
    Avp, AvpValue, CreditControlMessage, RequestType, ServerIdentity, SessionConfig,
    APP_ID_CREDIT_CONTROL, AVP_AUTH_APPLICATION_ID, AVP_CALLED_PARTY_ADDRESS,
    AVP_CALLING_PARTY_ADDRESS, AVP_CC_REQUEST_NUMBER, AVP_CC_REQUEST_TYPE, AVP_CC_TIME,
    AVP_CC_TOTAL_OCTETS, AVP_DEST_HOST, AVP_DEST_REALM, AVP_EVENT, AVP_EVENT_TIMESTAMP,
    AVP_EVENT_TYPE, AVP_GRANTED_SERVICE_UNIT, AVP_IMS_INFORMATION,
    AVP_MULTIPLE_SERVICES_CREDIT_CONTROL, AVP_NODE_FUNCTIONALITY, AVP_ORIGIN_HOST,
    AVP_ORIGIN_REALM, AVP_REQUESTED_SERVICE_UNIT, AVP_RESULT_CODE, AVP_SERVICE_CONTEXT_ID,
    AVP_SERVICE_INFORMATION, AVP_SESSION_ID, AVP_SUBSCRIPTION_ID, AVP_SUBSCRIPTION_ID_DATA,
    AVP_SUBSCRIPTION_ID_TYPE, CMD_CREDIT_CONTROL, NODE_FUNCTIONALITY, REQUESTED_TIME,
    VENDOR_ID_3GPP, VOICE_SERVICE_CONTEXT_ID,
};

/// Seconds between 1900-01-01 and 1970-01-01
const NTP_UNIX_OFFSET: i64 = 2_208_988_800;

/// Which side of the exchange a message is composed for
#[derive(Debug, Clone, Copy)]
pub enum Role<'a> {
    Request {
        config: &'a SessionConfig,
        request_number: u32,
    },
    Answer {
        identity: &'a ServerIdentity,
        result_code: u32,
        granted_units: Option<u64>,
    },
}

/// Compose a request or answer stamped with the current wall-clock time
pub fn compose(request_type: RequestType, role: Role<'_>, session_id: &str) -> CreditControlMessage {
    match role {
        Role::Request { config, request_number } => {
            compose_request(request_type, request_number, config, session_id, Utc::now())
        }
        Role::Answer { identity, result_code, granted_units } => compose_answer(
            Some(request_type),
            identity,
            Some(session_id),
            result_code,
            granted_units,
        ),
    }
}

/// `32260@3gpp.org-<imsi>-<unix millis>`
pub fn new_session_id(config: &SessionConfig, now: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{}",
        VOICE_SERVICE_CONTEXT_ID,
        config.imsi(),
        now.timestamp_millis()
    )
}

/// Event-Timestamp value (NTP seconds, wraps with the 2036 era rollover)
pub fn ntp_timestamp(at: DateTime<Utc>) -> u32 {
    (at.timestamp() + NTP_UNIX_OFFSET) as u32
}

pub fn compose_request(
    request_type: RequestType,
    request_number: u32,
    config: &SessionConfig,
    session_id: &str,
    timestamp: DateTime<Utc>,
) -> CreditControlMessage {
    let mut msg = CreditControlMessage::new(CMD_CREDIT_CONTROL, APP_ID_CREDIT_CONTROL, true);

    msg.push_avp(Avp::utf8(AVP_SESSION_ID, session_id))
        .push_avp(Avp::identity(AVP_ORIGIN_HOST, config.origin_host()))
        .push_avp(Avp::identity(AVP_ORIGIN_REALM, config.origin_realm()))
        .push_avp(Avp::identity(AVP_DEST_REALM, config.destination_realm()))
        .push_avp(Avp::unsigned32(AVP_AUTH_APPLICATION_ID, APP_ID_CREDIT_CONTROL))
        .push_avp(Avp::utf8(AVP_SERVICE_CONTEXT_ID, VOICE_SERVICE_CONTEXT_ID))
        .push_avp(Avp::enumerated(AVP_CC_REQUEST_TYPE, request_type.code()))
        .push_avp(Avp::unsigned32(AVP_CC_REQUEST_NUMBER, request_number))
        .push_avp(Avp::identity(AVP_DEST_HOST, config.destination_host()))
        .push_avp(Avp::new(AVP_EVENT_TIMESTAMP, AvpValue::Time(ntp_timestamp(timestamp))));

    for subscriber in config.subscriber_identifiers() {
        msg.push_avp(Avp::grouped(
            AVP_SUBSCRIPTION_ID,
            vec![
                Avp::enumerated(AVP_SUBSCRIPTION_ID_TYPE, subscriber.id_type as i32),
                Avp::utf8(AVP_SUBSCRIPTION_ID_DATA, subscriber.value),
            ],
        ));
    }

    let requested = request_type.carries_units().then(|| {
        Avp::grouped(
            AVP_REQUESTED_SERVICE_UNIT,
            vec![Avp::unsigned32(AVP_CC_TIME, REQUESTED_TIME)],
        )
    });
    msg.push_avp(voice_mscc(requested));
    msg.push_avp(ims_service_information(request_type, config));

    msg
}

/// Answer body. `request_type` is None when the request could not be read,
/// in which case no credit-control group is attached.
pub fn compose_answer(
    request_type: Option<RequestType>,
    identity: &ServerIdentity,
    session_id: Option<&str>,
    result_code: u32,
    granted_units: Option<u64>,
) -> CreditControlMessage {
    let mut msg = CreditControlMessage::new(CMD_CREDIT_CONTROL, APP_ID_CREDIT_CONTROL, false);

    if let Some(session_id) = session_id {
        msg.push_avp(Avp::utf8(AVP_SESSION_ID, session_id));
    }
    msg.push_avp(Avp::unsigned32(AVP_RESULT_CODE, result_code))
        .push_avp(Avp::identity(AVP_ORIGIN_HOST, identity.origin_host.as_str()))
        .push_avp(Avp::identity(AVP_ORIGIN_REALM, identity.origin_realm.as_str()))
        .push_avp(Avp::unsigned32(AVP_AUTH_APPLICATION_ID, APP_ID_CREDIT_CONTROL));

    if let Some(request_type) = request_type {
        let granted = match (request_type.carries_units(), granted_units) {
            (true, Some(units)) => Some(Avp::grouped(
                AVP_GRANTED_SERVICE_UNIT,
                vec![Avp::new(AVP_CC_TOTAL_OCTETS, AvpValue::Unsigned64(units))],
            )),
            _ => None,
        };
        msg.push_avp(voice_mscc(granted));
    }

    msg
}

/// Granted-Service-Unit/CC-Total-Octets of an answer, if present
pub fn granted_units(answer: &CreditControlMessage) -> Option<u64> {
    answer
        .find_path(&[
            AVP_MULTIPLE_SERVICES_CREDIT_CONTROL,
            AVP_GRANTED_SERVICE_UNIT,
            AVP_CC_TOTAL_OCTETS,
        ])
        .and_then(Avp::as_u64)
}

fn voice_mscc(unit: Option<Avp>) -> Avp {
    Avp::grouped(AVP_MULTIPLE_SERVICES_CREDIT_CONTROL, unit.into_iter().collect())
}

fn ims_service_information(request_type: RequestType, config: &SessionConfig) -> Avp {
    let vendor = |code, value| Avp::vendor(code, VENDOR_ID_3GPP, value);

    let ims_information = vendor(
        AVP_IMS_INFORMATION,
        AvpValue::Grouped(vec![
            vendor(
                AVP_EVENT_TYPE,
                AvpValue::Grouped(vec![vendor(AVP_EVENT, AvpValue::Integer32(request_type.code()))]),
            ),
            vendor(AVP_NODE_FUNCTIONALITY, AvpValue::Enumerated(NODE_FUNCTIONALITY)),
            vendor(AVP_CALLING_PARTY_ADDRESS, AvpValue::Utf8String(config.msisdn().to_string())),
            vendor(
                AVP_CALLED_PARTY_ADDRESS,
                AvpValue::Utf8String(config.target_msisdn().to_string()),
            ),
        ]),
    );

    vendor(AVP_SERVICE_INFORMATION, AvpValue::Grouped(vec![ims_information]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> SessionConfig {
        SessionConfig::new(
            "client.example.org",
            "example.org",
            "ocs.example.org",
            "example.org",
            "905551112233",
            "905554445566",
            "286011234567890",
        )
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    const RSU_CC_TIME: [u32; 3] =
        [AVP_MULTIPLE_SERVICES_CREDIT_CONTROL, AVP_REQUESTED_SERVICE_UNIT, AVP_CC_TIME];

    fn count_requested_units(msg: &CreditControlMessage) -> usize {
        msg.get_all_avps(AVP_MULTIPLE_SERVICES_CREDIT_CONTROL)
            .flat_map(|mscc| mscc.children().unwrap_or_default())
            .filter(|a| a.code == AVP_REQUESTED_SERVICE_UNIT)
            .count()
    }

    #[test]
    fn test_requested_units_for_initial_and_update() {
        let config = config();
        for request_type in [RequestType::Initial, RequestType::Update] {
            let msg = compose_request(request_type, 0, &config, "sid", at(0));
            assert_eq!(count_requested_units(&msg), 1);
            assert_eq!(msg.find_path(&RSU_CC_TIME).and_then(Avp::as_u32), Some(REQUESTED_TIME));
        }
    }

    #[test]
    fn test_termination_keeps_empty_mscc() {
        let msg = compose_request(RequestType::Termination, 2, &config(), "sid", at(0));
        let mscc = msg.get_avp(AVP_MULTIPLE_SERVICES_CREDIT_CONTROL).unwrap();
        assert_eq!(mscc.children(), Some(&[][..]));
        assert_eq!(count_requested_units(&msg), 0);
    }

    #[test]
    fn test_request_header_and_scalars() {
        let msg = compose_request(RequestType::Update, 4, &config(), "sid-1", at(0));

        assert!(msg.is_ccr());
        assert_eq!(msg.application_id, APP_ID_CREDIT_CONTROL);
        assert_eq!(msg.session_id(), Some("sid-1"));
        assert_eq!(msg.request_type(), Some(RequestType::Update));
        assert_eq!(msg.request_number(), Some(4));
        assert_eq!(
            msg.get_avp(AVP_SERVICE_CONTEXT_ID).and_then(Avp::as_str),
            Some("32260@3gpp.org")
        );
        assert_eq!(
            msg.get_avp(AVP_EVENT_TIMESTAMP).and_then(Avp::as_u32),
            Some(NTP_UNIX_OFFSET as u32)
        );
        assert!(msg.get_avp(AVP_RESULT_CODE).is_none());
    }

    #[test]
    fn test_subscription_ids() {
        let msg = compose_request(RequestType::Initial, 0, &config(), "sid", at(0));
        let ids: Vec<(i32, &str)> = msg
            .get_all_avps(AVP_SUBSCRIPTION_ID)
            .map(|group| {
                (
                    group.child(AVP_SUBSCRIPTION_ID_TYPE).and_then(Avp::as_i32).unwrap(),
                    group.child(AVP_SUBSCRIPTION_ID_DATA).and_then(Avp::as_str).unwrap(),
                )
            })
            .collect();

        assert_eq!(ids, vec![(0, "905551112233"), (1, "286011234567890")]);
    }

    #[test]
    fn test_ims_information() {
        let msg = compose_request(RequestType::Termination, 2, &config(), "sid", at(0));
        let ims = msg
            .find_path(&[AVP_SERVICE_INFORMATION, AVP_IMS_INFORMATION])
            .unwrap();

        assert_eq!(ims.vendor_id, Some(VENDOR_ID_3GPP));
        assert_eq!(
            ims.child(AVP_EVENT_TYPE).and_then(|e| e.child(AVP_EVENT)).and_then(Avp::as_i32),
            Some(3)
        );
        assert_eq!(ims.child(AVP_NODE_FUNCTIONALITY).and_then(Avp::as_i32), Some(0));
        assert_eq!(
            ims.child(AVP_CALLING_PARTY_ADDRESS).and_then(Avp::as_str),
            Some("905551112233")
        );
        assert_eq!(
            ims.child(AVP_CALLED_PARTY_ADDRESS).and_then(Avp::as_str),
            Some("905554445566")
        );
    }

    #[test]
    fn test_compose_is_deterministic_apart_from_timestamp() {
        let config = config();
        let mut first = compose(
            RequestType::Update,
            Role::Request { config: &config, request_number: 1 },
            "sid",
        );
        let mut second = compose_request(RequestType::Update, 1, &config, "sid", at(1_000));

        first.avps.retain(|a| a.code != AVP_EVENT_TIMESTAMP);
        second.avps.retain(|a| a.code != AVP_EVENT_TIMESTAMP);
        assert_eq!(first, second);
    }

    #[test]
    fn test_answer_grants_units() {
        let identity = ServerIdentity::new("ocs.example.org", "example.org");
        let answer = compose(
            RequestType::Initial,
            Role::Answer { identity: &identity, result_code: 2001, granted_units: Some(10) },
            "sid",
        );

        assert!(answer.is_cca());
        assert_eq!(answer.result_code(), Some(2001));
        assert_eq!(granted_units(&answer), Some(10));
        assert_eq!(answer.get_avp(AVP_ORIGIN_HOST).and_then(Avp::as_str), Some("ocs.example.org"));
        assert_eq!(answer.get_avp(AVP_ORIGIN_REALM).and_then(Avp::as_str), Some("example.org"));
        assert!(answer.request_type().is_none());
        assert!(answer.request_number().is_none());
    }

    #[test]
    fn test_termination_answer_has_empty_mscc() {
        let identity = ServerIdentity::new("ocs.example.org", "example.org");
        let answer = compose_answer(Some(RequestType::Termination), &identity, Some("sid"), 2001, Some(10));
        let mscc = answer.get_avp(AVP_MULTIPLE_SERVICES_CREDIT_CONTROL).unwrap();
        assert_eq!(mscc.children(), Some(&[][..]));
        assert_eq!(granted_units(&answer), None);
    }

    #[test]
    fn test_error_answer_has_no_mscc() {
        let identity = ServerIdentity::new("ocs.example.org", "example.org");
        let answer = compose_answer(None, &identity, None, 5012, None);
        assert_eq!(answer.result_code(), Some(5012));
        assert!(answer.session_id().is_none());
        assert!(answer.get_avp(AVP_MULTIPLE_SERVICES_CREDIT_CONTROL).is_none());
    }

    #[test]
    fn test_session_id_format() {
        let id = new_session_id(&config(), at(1_600_000_000));
        assert_eq!(id, "32260@3gpp.org-286011234567890-1600000000000");
    }
}
