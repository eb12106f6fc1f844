use crate::peer::{read_packet, write_message, IdAllocator, PeerIdentity};
use dcca_cc_core::{CreditControlSession, SessionAction, SessionEvent, SessionOutcome};
use dcca_core::{decode_message, DccaError, Result, Transport};
use dcca_diameter_dict::DictionaryManager;
use dcca_metrics::{ACTIVE_SESSIONS, ANSWER_TIMEOUTS_TOTAL, CCA_RECEIVED_TOTAL, CCR_SENT_TOTAL};
use dcca_shared::{
    DiameterMessage, RequestType, ServerIdentity, SessionConfig, CMD_CREDIT_CONTROL,
    RESULT_CODE_SUCCESS,
};
use futures::stream::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::time::{delay_queue, DelayQueue};
use tracing::{debug, error, info, warn};

/// How long to wait for DPA after sending DPR
pub const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(1);

const INBOUND_CHANNEL_SIZE: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct ClientOptions {
    /// Per-request answer timer
    pub answer_timeout: Duration,
    /// Pause between capabilities exchange and the first CCR
    pub connect_delay: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            answer_timeout: Duration::from_millis(5000),
            connect_delay: Duration::ZERO,
        }
    }
}

// Input to the actor from the reader task
enum Inbound {
    Message(DiameterMessage),
    Closed,
}

/// Handle on a running credit-control session.
///
/// Acquired when the session starts and released exactly once, either by
/// the driver's release action or when the handle is dropped on an error path.
pub struct SessionGuard {
    session_id: String,
    released: bool,
}

impl SessionGuard {
    pub fn acquire(session_id: &str) -> Self {
        ACTIVE_SESSIONS.inc();
        info!(session_id, "Session handle acquired");
        Self {
            session_id: session_id.to_string(),
            released: false,
        }
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        ACTIVE_SESSIONS.dec();
        info!(session_id = %self.session_id, "Session handle released");
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if !self.released {
            warn!(session_id = %self.session_id, "Session ended without release");
            self.release();
        }
    }
}

/// Drives one [`CreditControlSession`] over an established peer connection
pub struct ClientActor<W> {
    session: CreditControlSession,
    local: PeerIdentity,
    writer: W,
    inbound: mpsc::Receiver<Inbound>,

    // Answer timers keyed by hop-by-hop id
    timeout_queue: DelayQueue<u32>,
    // hop-by-hop id -> (CC-Request-Number, timer)
    pending: HashMap<u32, (u32, delay_queue::Key)>,

    ids: IdAllocator,
    guard: SessionGuard,
    answer_timeout: Duration,
}

impl<W> ClientActor<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn new(
        session: CreditControlSession,
        local: PeerIdentity,
        writer: W,
        inbound: mpsc::Receiver<Inbound>,
        ids: IdAllocator,
        answer_timeout: Duration,
    ) -> Self {
        let guard = SessionGuard::acquire(session.session_id());
        Self {
            session,
            local,
            writer,
            inbound,
            timeout_queue: DelayQueue::new(),
            pending: HashMap::new(),
            ids,
            guard,
            answer_timeout,
        }
    }

    pub async fn run(mut self) -> Result<SessionOutcome> {
        let actions = self.session.step(SessionEvent::Start);
        let mut finished = self.execute_actions(actions).await?;

        let outcome = loop {
            if let Some(outcome) = finished.take() {
                break outcome;
            }

            finished = tokio::select! {
                inbound = self.inbound.recv() => match inbound {
                    Some(Inbound::Message(msg)) => self.handle_message(msg).await?,
                    Some(Inbound::Closed) | None => {
                        error!(session_id = %self.session.session_id(), "Peer closed the connection");
                        return Err(DccaError::Disconnected);
                    }
                },

                Some(expired) = self.timeout_queue.next() => {
                    self.handle_timeout(expired.into_inner()).await?
                }
            };
        };

        self.disconnect().await;
        Ok(outcome)
    }

    async fn handle_message(&mut self, msg: DiameterMessage) -> Result<Option<SessionOutcome>> {
        if msg.is_dwr() {
            debug!(session_id = %self.session.session_id(), "Answering watchdog");
            let dwa = self.local.watchdog_answer(&msg);
            write_message(&mut self.writer, &dwa).await?;
            return Ok(None);
        }

        if msg.is_dpr() {
            warn!(session_id = %self.session.session_id(), "Peer requested disconnect");
            let dpa = self.local.disconnect_peer_answer(&msg);
            write_message(&mut self.writer, &dpa).await?;
            return Err(DccaError::Disconnected);
        }

        if msg.command_code != CMD_CREDIT_CONTROL {
            if msg.is_request() {
                warn!(command_code = msg.command_code, "Unsupported request from peer, dropping");
            } else {
                debug!(command_code = msg.command_code, "Ignoring base protocol answer");
            }
            return Ok(None);
        }

        match self.pending.remove(&msg.hop_by_hop_id) {
            Some((_, key)) => {
                self.timeout_queue.remove(&key);
            }
            None => debug!(
                hop_by_hop_id = msg.hop_by_hop_id,
                "Answer for a request that is no longer timed"
            ),
        }

        let result_code = msg
            .result_code()
            .map(|code| code.to_string())
            .unwrap_or_else(|| "none".to_string());
        CCA_RECEIVED_TOTAL.with_label_values(&[result_code.as_str()]).inc();

        let actions = self.session.step(SessionEvent::AnswerReceived(msg));
        self.execute_actions(actions).await
    }

    async fn handle_timeout(&mut self, hop_by_hop_id: u32) -> Result<Option<SessionOutcome>> {
        let Some((request_number, _)) = self.pending.remove(&hop_by_hop_id) else {
            return Ok(None);
        };

        ANSWER_TIMEOUTS_TOTAL.inc();
        let actions = self.session.step(SessionEvent::TimedOut { request_number });
        self.execute_actions(actions).await
    }

    async fn execute_actions(&mut self, actions: Vec<SessionAction>) -> Result<Option<SessionOutcome>> {
        let mut finished = None;

        for action in actions {
            match action {
                SessionAction::Send(mut request) => {
                    self.ids.stamp(&mut request);

                    let request_type = request
                        .request_type()
                        .map(RequestType::as_str)
                        .unwrap_or("UNKNOWN");
                    let request_number = request.request_number().unwrap_or_default();
                    CCR_SENT_TOTAL.with_label_values(&[request_type]).inc();

                    write_message(&mut self.writer, &request).await?;

                    let key = self.timeout_queue.insert(request.hop_by_hop_id, self.answer_timeout);
                    self.pending.insert(request.hop_by_hop_id, (request_number, key));
                    debug!(
                        session_id = %self.session.session_id(),
                        request_type,
                        request_number,
                        hop_by_hop_id = request.hop_by_hop_id,
                        "Request sent"
                    );
                }
                SessionAction::Release => self.guard.release(),
                SessionAction::Finished(outcome) => finished = Some(outcome),
            }
        }

        Ok(finished)
    }

    // DPR/DPA; failures here do not change the session outcome
    async fn disconnect(&mut self) {
        let mut dpr = self.local.disconnect_peer_request();
        self.ids.stamp(&mut dpr);

        if let Err(e) = write_message(&mut self.writer, &dpr).await {
            warn!(error = %e, "Failed to send disconnect request");
            return;
        }

        let inbound = &mut self.inbound;
        let wait_dpa = async {
            while let Some(Inbound::Message(msg)) = inbound.recv().await {
                if msg.is_dpa() {
                    return true;
                }
            }
            false
        };

        match tokio::time::timeout(DISCONNECT_TIMEOUT, wait_dpa).await {
            Ok(true) => info!("Peer disconnected"),
            Ok(false) => debug!("Connection closed before disconnect answer"),
            Err(_) => warn!("No disconnect answer from peer"),
        }
    }
}

// Frames packets off the read half and forwards them to the actor
fn spawn_reader<R>(mut reader: R, tx: mpsc::Sender<Inbound>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let dict = DictionaryManager::new();
        loop {
            let packet = match read_packet(&mut reader).await {
                Ok(Some(packet)) => packet,
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "Failed to read from peer");
                    break;
                }
            };

            match decode_message(&packet, &dict) {
                Ok(msg) => {
                    if tx.send(Inbound::Message(msg)).await.is_err() {
                        return;
                    }
                }
                Err(e) => warn!(
                    command_code = packet.header.command_code,
                    error = %e,
                    "Dropping undecodable message"
                ),
            }
        }
        let _ = tx.send(Inbound::Closed).await;
    })
}

async fn capabilities_exchange<T: Transport>(
    transport: &mut T,
    local: &PeerIdentity,
    ids: &mut IdAllocator,
    answer_timeout: Duration,
) -> Result<()> {
    let mut cer = local.capabilities_exchange_request();
    ids.stamp(&mut cer);
    write_message(transport, &cer).await?;

    let packet = tokio::time::timeout(answer_timeout, read_packet(transport))
        .await
        .map_err(|_| DccaError::AnswerTimeout(answer_timeout.as_millis() as u64))??
        .ok_or(DccaError::Disconnected)?;
    let cea = decode_message(&packet, &DictionaryManager::new())?;

    if !cea.is_cea() {
        return Err(DccaError::CapabilitiesExchange(format!(
            "expected CEA, got command {}",
            cea.command_code
        )));
    }
    match cea.result_code() {
        Some(RESULT_CODE_SUCCESS) => Ok(()),
        other => Err(DccaError::CapabilitiesExchange(format!(
            "peer answered with Result-Code {:?}",
            other
        ))),
    }
}

/// Run one complete session over an already connected transport
pub async fn run_session<T>(
    mut transport: T,
    config: Arc<SessionConfig>,
    updates_requested: u32,
    options: ClientOptions,
) -> Result<SessionOutcome>
where
    T: Transport + 'static,
{
    let peer = transport.peer_addr()?;
    let local = PeerIdentity::new(&ServerIdentity::from(config.as_ref()), transport.local_addr()?.ip());
    let mut ids = IdAllocator::new();

    capabilities_exchange(&mut transport, &local, &mut ids, options.answer_timeout).await?;
    info!(%peer, "Capabilities exchange completed");

    if !options.connect_delay.is_zero() {
        tokio::time::sleep(options.connect_delay).await;
    }

    let (reader, writer) = tokio::io::split(transport);
    let (tx, rx) = mpsc::channel(INBOUND_CHANNEL_SIZE);
    let reader_task = spawn_reader(reader, tx);

    let session = CreditControlSession::new(config, updates_requested);
    let actor = ClientActor::new(session, local, writer, rx, ids, options.answer_timeout);
    let result = actor.run().await;

    reader_task.abort();
    result
}

/// Connect to the server over TCP and run one session
pub async fn connect_and_run(
    address: &str,
    config: Arc<SessionConfig>,
    updates_requested: u32,
    options: ClientOptions,
) -> Result<SessionOutcome> {
    info!(peer = address, "Connecting to credit-control server");
    let stream = TcpStream::connect(address).await?;
    run_session(stream, config, updates_requested, options).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_releases_once() {
        let mut guard = SessionGuard::acquire("sid-1");
        assert!(!guard.is_released());
        guard.release();
        guard.release();
        assert!(guard.is_released());
    }

    #[test]
    fn test_guard_released_on_drop() {
        let guard = SessionGuard::acquire("sid-2");
        drop(guard);
    }

    #[test]
    fn test_default_options() {
        let options = ClientOptions::default();
        assert_eq!(options.answer_timeout, Duration::from_secs(5));
        assert!(options.connect_delay.is_zero());
    }
}
