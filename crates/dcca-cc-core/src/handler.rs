use crate::compose::compose_answer;
use dcca_core::{DccaError, Result};
use dcca_shared::{
    Avp, CreditControlMessage, RequestType, ServerIdentity, AVP_CC_REQUEST_TYPE, AVP_CC_TIME,
    AVP_MULTIPLE_SERVICES_CREDIT_CONTROL, AVP_REQUESTED_SERVICE_UNIT, CMD_CREDIT_CONTROL,
    RESULT_CODE_SUCCESS,
};
use tracing::{debug, error, warn};

/// Server side of the credit-control exchange.
///
/// Stateless apart from the read-only identity, so one instance can serve
/// any number of connections concurrently. Grants exactly what was asked.
#[derive(Debug, Clone)]
pub struct AnswerHandler {
    identity: ServerIdentity,
}

impl AnswerHandler {
    pub fn new(identity: ServerIdentity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    /// Answer a Credit-Control-Request.
    ///
    /// Returns `None` when the message is not a CCR; the caller drops it
    /// without answering. Every accepted request gets an answer: malformed
    /// ones are reported through the Result-Code.
    pub fn handle(&self, request: &CreditControlMessage) -> Option<CreditControlMessage> {
        if request.command_code != CMD_CREDIT_CONTROL || !request.is_request() {
            error!(command_code = request.command_code, "Received bad request");
            return None;
        }

        let session_id = request.session_id();
        match Self::grant(request) {
            Ok((request_type, granted)) => {
                debug!(
                    session_id = session_id.unwrap_or_default(),
                    request_type = %request_type,
                    request_number = ?request.request_number(),
                    ?granted,
                    "Granting service units"
                );
                let answer = compose_answer(
                    Some(request_type),
                    &self.identity,
                    session_id,
                    RESULT_CODE_SUCCESS,
                    granted,
                );
                Some(Self::correlate(answer, request))
            }
            Err(e) => Some(self.reject(request, &e)),
        }
    }

    /// Error answer for a request that cannot be served.
    ///
    /// Only the header and Session-Id of `request` are read, so this also
    /// answers requests whose AVPs failed to decode.
    pub fn reject(&self, request: &CreditControlMessage, error: &DccaError) -> CreditControlMessage {
        let session_id = request.session_id();
        warn!(
            session_id = session_id.unwrap_or_default(),
            error = %error,
            "Error while processing request"
        );
        let answer = compose_answer(None, &self.identity, session_id, error.to_result_code(), None);
        Self::correlate(answer, request)
    }

    fn correlate(mut answer: CreditControlMessage, request: &CreditControlMessage) -> CreditControlMessage {
        answer.flags = request.flags & !dcca_shared::FLAG_REQUEST;
        answer.hop_by_hop_id = request.hop_by_hop_id;
        answer.end_to_end_id = request.end_to_end_id;
        answer
    }

    /// Request type plus the units to grant (pass-through of CC-Time)
    fn grant(request: &CreditControlMessage) -> Result<(RequestType, Option<u64>)> {
        let raw_type = request
            .get_avp(AVP_CC_REQUEST_TYPE)
            .ok_or(DccaError::MissingAvp(AVP_CC_REQUEST_TYPE))?;
        let request_type = raw_type
            .as_i32()
            .and_then(RequestType::from_i32)
            .ok_or_else(|| DccaError::InvalidAvpValue {
                code: AVP_CC_REQUEST_TYPE,
                reason: format!("unsupported CC-Request-Type {:?}", raw_type.value),
            })?;

        if !request_type.carries_units() {
            return Ok((request_type, None));
        }

        let requested = request
            .get_avp(AVP_MULTIPLE_SERVICES_CREDIT_CONTROL)
            .ok_or(DccaError::MissingAvp(AVP_MULTIPLE_SERVICES_CREDIT_CONTROL))?
            .child(AVP_REQUESTED_SERVICE_UNIT)
            .ok_or(DccaError::MissingAvp(AVP_REQUESTED_SERVICE_UNIT))?
            .child(AVP_CC_TIME)
            .ok_or(DccaError::MissingAvp(AVP_CC_TIME))?;

        let cc_time = requested.as_u64().ok_or_else(|| DccaError::InvalidAvpValue {
            code: AVP_CC_TIME,
            reason: format!("expected Unsigned32, got {:?}", requested.value),
        })?;

        Ok((request_type, Some(cc_time)))
    }
}

/// CC-Time requested by a CCR, if any
pub fn requested_units(request: &CreditControlMessage) -> Option<u32> {
    request
        .find_path(&[AVP_MULTIPLE_SERVICES_CREDIT_CONTROL, AVP_REQUESTED_SERVICE_UNIT, AVP_CC_TIME])
        .and_then(Avp::as_u32)
}
