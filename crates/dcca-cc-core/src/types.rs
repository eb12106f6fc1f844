use dcca_shared::CreditControlMessage;

// Client-side session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    AwaitingInitialAnswer,     // CCR-I sent
    AwaitingFirstUpdateAnswer, // first CCR-U sent
    AwaitingSubsequentAnswer,  // second CCR-U sent
    Terminating,               // CCR-T sent
    Closed,
}

impl SessionPhase {
    /// A request is outstanding in this phase
    pub fn is_awaiting(self) -> bool {
        matches!(
            self,
            Self::AwaitingInitialAnswer
                | Self::AwaitingFirstUpdateAnswer
                | Self::AwaitingSubsequentAnswer
                | Self::Terminating
        )
    }
}

// Input to the session driver
#[derive(Debug)]
pub enum SessionEvent {
    Start,
    AnswerReceived(CreditControlMessage),
    TimedOut { request_number: u32 },
}

// Output of the session driver, executed in order by the runtime
#[derive(Debug, PartialEq)]
pub enum SessionAction {
    Send(CreditControlMessage),
    Release,
    Finished(SessionOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Final answer was DIAMETER_SUCCESS
    Completed { requests_sent: u32 },
    /// Server answered with something other than 2001
    Failed { result_code: u32, phase: SessionPhase },
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Process exit status for this outcome
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Completed { .. } => 0,
            Self::Failed { .. } => 1,
        }
    }
}
