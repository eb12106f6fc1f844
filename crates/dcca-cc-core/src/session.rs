use crate::compose::{compose_request, granted_units, new_session_id};
use crate::types::{SessionAction, SessionEvent, SessionOutcome, SessionPhase};
use chrono::Utc;
use dcca_shared::{
    CreditControlMessage, RequestType, SessionConfig, CMD_CREDIT_CONTROL,
    RESULT_CODE_SUCCESS, RESULT_CODE_UNABLE_TO_COMPLY,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Client side of one credit-control session.
///
/// Sans-IO: every call to [`step`](Self::step) consumes one event and
/// returns the actions the runtime must perform. At most one request is
/// outstanding at any time, so `request_number` doubles as the count of
/// requests sent so far.
pub struct CreditControlSession {
    config: Arc<SessionConfig>,
    session_id: String,
    phase: SessionPhase,
    request_number: u32,
    updates_sent: u32,
    updates_requested: u32,
    outcome: Option<SessionOutcome>,
}

impl CreditControlSession {
    pub fn new(config: Arc<SessionConfig>, updates_requested: u32) -> Self {
        let session_id = new_session_id(&config, Utc::now());
        Self::with_session_id(config, session_id, updates_requested)
    }

    pub fn with_session_id(
        config: Arc<SessionConfig>,
        session_id: String,
        updates_requested: u32,
    ) -> Self {
        Self {
            config,
            session_id,
            phase: SessionPhase::NotStarted,
            request_number: 0,
            updates_sent: 0,
            updates_requested,
            outcome: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// CC-Request-Number the next request will carry
    pub fn next_request_number(&self) -> u32 {
        self.request_number
    }

    pub fn updates_sent(&self) -> u32 {
        self.updates_sent
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome
    }

    pub fn is_closed(&self) -> bool {
        self.phase == SessionPhase::Closed
    }

    // Core state transition function
    pub fn step(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        match (self.phase, event) {
            (SessionPhase::NotStarted, SessionEvent::Start) => {
                info!(session_id = %self.session_id, "Sending initial request");
                let request = self.next_request(RequestType::Initial);
                self.transition(SessionPhase::AwaitingInitialAnswer);
                vec![SessionAction::Send(request)]
            }

            (phase, SessionEvent::Start) => {
                warn!(session_id = %self.session_id, ?phase, "Session already started, ignoring start");
                Vec::new()
            }

            (phase, SessionEvent::AnswerReceived(answer)) if phase.is_awaiting() => {
                self.on_answer(answer)
            }

            (SessionPhase::Closed, SessionEvent::AnswerReceived(answer)) => {
                // Completion is final; a late or duplicated answer never reopens the session
                warn!(
                    session_id = %self.session_id,
                    result_code = ?answer.result_code(),
                    "Answer received after session closed, ignoring"
                );
                Vec::new()
            }

            (phase, SessionEvent::AnswerReceived(_)) => {
                warn!(session_id = %self.session_id, ?phase, "Unsolicited answer, ignoring");
                Vec::new()
            }

            (phase, SessionEvent::TimedOut { request_number }) if phase.is_awaiting() => {
                // No resend: the session stays where it is until an answer shows up
                warn!(
                    session_id = %self.session_id,
                    request_number,
                    ?phase,
                    "Timeout waiting for answer"
                );
                Vec::new()
            }

            (phase, SessionEvent::TimedOut { request_number }) => {
                debug!(session_id = %self.session_id, request_number, ?phase, "Stale timeout ignored");
                Vec::new()
            }
        }
    }

    fn on_answer(&mut self, answer: CreditControlMessage) -> Vec<SessionAction> {
        if answer.command_code != CMD_CREDIT_CONTROL || answer.is_request() {
            error!(
                session_id = %self.session_id,
                command_code = answer.command_code,
                "Received bad answer"
            );
            return Vec::new();
        }

        if let Some(answer_session) = answer.session_id() {
            if answer_session != self.session_id {
                warn!(
                    session_id = %self.session_id,
                    answer_session,
                    "Answer for another session, ignoring"
                );
                return Vec::new();
            }
        }

        let result_code = answer.result_code().unwrap_or(RESULT_CODE_UNABLE_TO_COMPLY);
        if result_code != RESULT_CODE_SUCCESS {
            error!(
                session_id = %self.session_id,
                result_code,
                phase = ?self.phase,
                "Something wrong happened at server side"
            );
            return self.close(SessionOutcome::Failed { result_code, phase: self.phase });
        }

        if let Some(units) = granted_units(&answer) {
            debug!(session_id = %self.session_id, units, "Service units granted");
        }

        match self.phase {
            SessionPhase::AwaitingInitialAnswer => {
                info!(session_id = %self.session_id, "Initial answer received, sending update");
                let request = self.next_request(RequestType::Update);
                self.transition(SessionPhase::AwaitingFirstUpdateAnswer);
                vec![SessionAction::Send(request)]
            }

            SessionPhase::AwaitingFirstUpdateAnswer => {
                // Threshold kept as deployed: with N >= 1 a single UPDATE precedes
                // TERMINATION, with N = 0 a second UPDATE is sent and the session
                // closes on its answer without a TERMINATION.
                if self.request_number - 1 > self.updates_requested {
                    info!(
                        session_id = %self.session_id,
                        update = self.request_number - 1,
                        "Update answer received, sending update"
                    );
                    let request = self.next_request(RequestType::Update);
                    self.transition(SessionPhase::AwaitingSubsequentAnswer);
                    vec![SessionAction::Send(request)]
                } else {
                    info!(session_id = %self.session_id, "Update answer received, terminating");
                    let request = self.next_request(RequestType::Termination);
                    self.transition(SessionPhase::Terminating);
                    vec![SessionAction::Send(request)]
                }
            }

            SessionPhase::AwaitingSubsequentAnswer | SessionPhase::Terminating => {
                info!(session_id = %self.session_id, "Final answer received, disconnecting");
                self.close(SessionOutcome::Completed { requests_sent: self.request_number })
            }

            SessionPhase::NotStarted | SessionPhase::Closed => Vec::new(),
        }
    }

    fn next_request(&mut self, request_type: RequestType) -> CreditControlMessage {
        let request_number = self.request_number;
        self.request_number += 1;
        if request_type == RequestType::Update {
            self.updates_sent += 1;
        }

        debug!(
            session_id = %self.session_id,
            request_type = %request_type,
            request_number,
            "Composing request"
        );
        compose_request(request_type, request_number, &self.config, &self.session_id, Utc::now())
    }

    fn close(&mut self, outcome: SessionOutcome) -> Vec<SessionAction> {
        self.transition(SessionPhase::Closed);
        self.outcome = Some(outcome);
        vec![SessionAction::Release, SessionAction::Finished(outcome)]
    }

    fn transition(&mut self, next: SessionPhase) {
        info!(session_id = %self.session_id, from = ?self.phase, to = ?next, "Session state change");
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::compose_answer;
    use dcca_shared::{ServerIdentity, RESULT_CODE_UNABLE_TO_DELIVER};

    fn config() -> Arc<SessionConfig> {
        Arc::new(SessionConfig::new(
            "client.example.org",
            "example.org",
            "ocs.example.org",
            "example.org",
            "905551112233",
            "905554445566",
            "286011234567890",
        ))
    }

    fn answer(session: &CreditControlSession, result_code: u32) -> CreditControlMessage {
        let identity = ServerIdentity::new("ocs.example.org", "example.org");
        compose_answer(
            Some(RequestType::Update),
            &identity,
            Some(session.session_id()),
            result_code,
            Some(10),
        )
    }

    fn sent_request(actions: &[SessionAction]) -> (RequestType, u32) {
        match actions {
            [SessionAction::Send(msg)] => (msg.request_type().unwrap(), msg.request_number().unwrap()),
            other => panic!("Expected a single send, got {other:?}"),
        }
    }

    /// Drive a session with success answers until it closes
    fn run_to_completion(updates_requested: u32) -> (Vec<(RequestType, u32)>, CreditControlSession) {
        let mut session = CreditControlSession::new(config(), updates_requested);
        let mut sent = vec![sent_request(&session.step(SessionEvent::Start))];

        loop {
            let ok = answer(&session, RESULT_CODE_SUCCESS);
            let actions = session.step(SessionEvent::AnswerReceived(ok));
            match actions.as_slice() {
                [SessionAction::Send(_)] => sent.push(sent_request(&actions)),
                [SessionAction::Release, SessionAction::Finished(_)] => break,
                other => panic!("Unexpected actions {other:?}"),
            }
            assert!(sent.len() < 10, "session never closed");
        }

        (sent, session)
    }

    #[test]
    fn test_start_sends_initial() {
        dcca_logging::init_test();
        let mut session = CreditControlSession::new(config(), 1);
        let actions = session.step(SessionEvent::Start);

        assert_eq!(sent_request(&actions), (RequestType::Initial, 0));
        assert_eq!(session.phase(), SessionPhase::AwaitingInitialAnswer);
        assert_eq!(session.next_request_number(), 1);
    }

    #[test]
    fn test_one_update_then_termination() {
        let (sent, session) = run_to_completion(1);
        assert_eq!(
            sent,
            vec![
                (RequestType::Initial, 0),
                (RequestType::Update, 1),
                (RequestType::Termination, 2),
            ]
        );
        assert_eq!(session.outcome(), Some(SessionOutcome::Completed { requests_sent: 3 }));
        assert!(session.is_closed());
    }

    #[test]
    fn test_update_threshold_table() {
        use RequestType::{Initial as I, Termination as T, Update as U};

        let table: [(u32, &[RequestType]); 4] = [
            (0, &[I, U, U]),
            (1, &[I, U, T]),
            (2, &[I, U, T]),
            (5, &[I, U, T]),
        ];

        for (updates_requested, expected) in table {
            let (sent, session) = run_to_completion(updates_requested);
            let types: Vec<RequestType> = sent.iter().map(|(t, _)| *t).collect();
            assert_eq!(types, expected, "updates_requested = {updates_requested}");

            // CC-Request-Number: 0, 1, 2 ... without gaps
            let numbers: Vec<u32> = sent.iter().map(|(_, n)| *n).collect();
            assert_eq!(numbers, (0..sent.len() as u32).collect::<Vec<_>>());
            assert!(session.outcome().unwrap().is_success());
        }
    }

    #[test]
    fn test_failure_at_every_phase_closes_session() {
        // Number of successful answers before the 3002 arrives
        for successes in 0..3 {
            let mut session = CreditControlSession::new(config(), 1);
            session.step(SessionEvent::Start);
            for _ in 0..successes {
                session.step(SessionEvent::AnswerReceived(answer(&session, RESULT_CODE_SUCCESS)));
            }
            let phase = session.phase();

            let actions = session.step(SessionEvent::AnswerReceived(answer(
                &session,
                RESULT_CODE_UNABLE_TO_DELIVER,
            )));
            let outcome = SessionOutcome::Failed { result_code: 3002, phase };
            assert_eq!(actions, vec![SessionAction::Release, SessionAction::Finished(outcome)]);
            assert!(session.is_closed());

            // Nothing else is ever sent
            let late = session.step(SessionEvent::AnswerReceived(answer(&session, RESULT_CODE_SUCCESS)));
            assert!(late.is_empty());
            assert_eq!(session.outcome(), Some(outcome));
        }
    }

    #[test]
    fn test_missing_result_code_is_failure() {
        let mut session = CreditControlSession::new(config(), 1);
        session.step(SessionEvent::Start);

        let mut bare = answer(&session, RESULT_CODE_SUCCESS);
        bare.avps.retain(|a| a.code != dcca_shared::AVP_RESULT_CODE);

        let actions = session.step(SessionEvent::AnswerReceived(bare));
        assert!(matches!(
            actions.last(),
            Some(SessionAction::Finished(SessionOutcome::Failed { result_code: 5012, .. }))
        ));
    }

    #[test]
    fn test_timeout_leaves_session_stalled() {
        let mut session = CreditControlSession::new(config(), 1);
        session.step(SessionEvent::Start);

        let actions = session.step(SessionEvent::TimedOut { request_number: 0 });
        assert!(actions.is_empty());
        assert_eq!(session.phase(), SessionPhase::AwaitingInitialAnswer);
        assert_eq!(session.next_request_number(), 1);

        // A late answer still moves the session forward
        let actions = session.step(SessionEvent::AnswerReceived(answer(&session, RESULT_CODE_SUCCESS)));
        assert_eq!(sent_request(&actions), (RequestType::Update, 1));
    }

    #[test]
    fn test_bad_command_code_is_ignored() {
        let mut session = CreditControlSession::new(config(), 1);
        session.step(SessionEvent::Start);

        let mut wrong = answer(&session, RESULT_CODE_SUCCESS);
        wrong.command_code = 271;

        assert!(session.step(SessionEvent::AnswerReceived(wrong)).is_empty());
        assert_eq!(session.phase(), SessionPhase::AwaitingInitialAnswer);
    }

    #[test]
    fn test_foreign_session_answer_is_ignored() {
        let mut session = CreditControlSession::new(config(), 1);
        session.step(SessionEvent::Start);

        let identity = ServerIdentity::new("ocs.example.org", "example.org");
        let foreign = compose_answer(Some(RequestType::Initial), &identity, Some("other"), 2001, Some(10));

        assert!(session.step(SessionEvent::AnswerReceived(foreign)).is_empty());
        assert_eq!(session.phase(), SessionPhase::AwaitingInitialAnswer);
    }

    #[test]
    fn test_events_before_start_and_double_start() {
        let mut session = CreditControlSession::new(config(), 1);
        assert!(session.step(SessionEvent::TimedOut { request_number: 0 }).is_empty());
        assert!(session
            .step(SessionEvent::AnswerReceived(answer(&session, RESULT_CODE_SUCCESS)))
            .is_empty());
        assert_eq!(session.phase(), SessionPhase::NotStarted);

        session.step(SessionEvent::Start);
        assert!(session.step(SessionEvent::Start).is_empty());
        assert_eq!(session.next_request_number(), 1);
    }
}
