use crate::peer::{read_packet, write_message, PeerIdentity};
use dcca_cc_core::AnswerHandler;
use dcca_core::{decode_envelope, decode_message, Result, Transport};
use dcca_diameter_dict::DictionaryManager;
use dcca_metrics::{ACTIVE_CONNECTIONS, CCR_HANDLED_TOTAL, REQUESTS_IGNORED_TOTAL};
use dcca_shared::{RequestType, ServerIdentity, CMD_CREDIT_CONTROL, RESULT_CODE_SUCCESS};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// TCP server answering Credit-Control requests
pub struct CreditControlServer {
    listener: TcpListener,
    handler: Arc<AnswerHandler>,
}

impl CreditControlServer {
    /// Bind the listening socket
    pub async fn bind(addr: &str, identity: ServerIdentity) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(address = addr, origin_host = %identity.origin_host, "Credit-control server listening");
        Ok(Self {
            listener,
            handler: Arc::new(AnswerHandler::new(identity)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the process is stopped
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Accept connections until `shutdown` resolves, then close every peer
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(active = connections.len(), "Shutting down credit-control server");
                    break;
                }

                accepted = self.listener.accept() => match accepted {
                    Ok((socket, addr)) => {
                        info!(peer = %addr, "New connection");
                        let handler = self.handler.clone();

                        connections.spawn(async move {
                            if let Err(e) = serve_connection(socket, handler).await {
                                crate::log_by_severity!(e.severity(), peer = %addr, error = %e, "Connection error");
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "Accept error"),
                },

                // Reap finished connection tasks
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        connections.shutdown().await;
        Ok(())
    }
}

/// Serve one peer until it disconnects
pub async fn serve_connection<T: Transport>(mut transport: T, handler: Arc<AnswerHandler>) -> Result<()> {
    let peer = transport.peer_addr()?;
    let local = PeerIdentity::new(handler.identity(), transport.local_addr()?.ip());
    let dict = DictionaryManager::new();

    ACTIVE_CONNECTIONS.inc();
    let result: Result<()> = async {
        loop {
            let Some(packet) = read_packet(&mut transport).await? else {
                info!(%peer, "Connection closed by peer");
                return Ok(());
            };

            let msg = match decode_message(&packet, &dict) {
                Ok(msg) => msg,
                Err(e) => {
                    crate::log_by_severity!(
                        e.severity(),
                        %peer,
                        command_code = packet.header.command_code,
                        error = %e,
                        "Failed to decode message"
                    );
                    // Malformed CCRs still get a correlated answer
                    let envelope = decode_envelope(&packet);
                    if envelope.is_ccr() {
                        let answer = handler.reject(&envelope, &e);
                        let result_code = answer.result_code().unwrap_or_default().to_string();
                        CCR_HANDLED_TOTAL
                            .with_label_values(&["UNKNOWN", result_code.as_str()])
                            .inc();
                        write_message(&mut transport, &answer).await?;
                    } else if envelope.is_request() {
                        REQUESTS_IGNORED_TOTAL.inc();
                    }
                    continue;
                }
            };

            if msg.is_cer() {
                debug!(%peer, "Capabilities exchange");
                let cea = local.capabilities_exchange_answer(&msg, RESULT_CODE_SUCCESS);
                write_message(&mut transport, &cea).await?;
            } else if msg.is_dwr() {
                debug!(%peer, "Watchdog");
                write_message(&mut transport, &local.watchdog_answer(&msg)).await?;
            } else if msg.is_dpr() {
                info!(%peer, "Peer disconnecting");
                write_message(&mut transport, &local.disconnect_peer_answer(&msg)).await?;
                return Ok(());
            } else if msg.command_code == CMD_CREDIT_CONTROL {
                match handler.handle(&msg) {
                    Some(answer) => {
                        let request_type = msg
                            .request_type()
                            .map(RequestType::as_str)
                            .unwrap_or("UNKNOWN");
                        let result_code = answer.result_code().unwrap_or_default().to_string();
                        CCR_HANDLED_TOTAL
                            .with_label_values(&[request_type, result_code.as_str()])
                            .inc();
                        write_message(&mut transport, &answer).await?;
                    }
                    None => {
                        REQUESTS_IGNORED_TOTAL.inc();
                        debug!(%peer, "No answer produced, message dropped");
                    }
                }
            } else if msg.is_request() {
                REQUESTS_IGNORED_TOTAL.inc();
                warn!(%peer, command_code = msg.command_code, "Unsupported request, dropping");
            } else {
                debug!(%peer, command_code = msg.command_code, "Ignoring answer");
            }
        }
    }
    .await;
    ACTIVE_CONNECTIONS.dec();

    result
}
