use bytes::{BufMut, Bytes, BytesMut};
use chrono::Utc;
use dcca_core::{encode_message, DccaError, DiameterPacket, Result, HEADER_LEN};
use dcca_shared::{
    Avp, AvpValue, DiameterMessage, ServerIdentity, APP_ID_COMMON, APP_ID_CREDIT_CONTROL,
    AVP_AUTH_APPLICATION_ID, AVP_DISCONNECT_CAUSE, AVP_HOST_IP_ADDRESS, AVP_ORIGIN_HOST,
    AVP_ORIGIN_REALM, AVP_ORIGIN_STATE_ID, AVP_PRODUCT_NAME, AVP_RESULT_CODE, AVP_VENDOR_ID,
    CMD_CER, CMD_DPR, RESULT_CODE_SUCCESS,
};
use std::io;
use std::net::IpAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const PRODUCT_NAME: &str = "dcca";

// Disconnect-Cause values (RFC 6733 5.4.3)
pub const DISCONNECT_CAUSE_DO_NOT_WANT_TO_TALK_TO_YOU: i32 = 2;

/// Read one framed Diameter packet.
///
/// Returns `Ok(None)` when the peer closed the stream between packets.
/// A bad header is fatal for the connection since framing is lost.
pub async fn read_packet<R>(reader: &mut R) -> Result<Option<DiameterPacket>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let length = DiameterPacket::peek_length(&header)?
        .ok_or_else(|| DccaError::InvalidPacket("Header too short".to_string()))?;

    let mut buffer = vec![0u8; length];
    buffer[..HEADER_LEN].copy_from_slice(&header);
    reader.read_exact(&mut buffer[HEADER_LEN..]).await?;

    DiameterPacket::parse(&buffer).map(Some)
}

/// Encode and write one message, flushing the stream
pub async fn write_message<W>(writer: &mut W, msg: &DiameterMessage) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = encode_message(msg).serialize();
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Hop-by-Hop and End-to-End identifier source for one peer connection.
///
/// Hop-by-hop ids start at a random value and increment. End-to-end ids
/// keep the low 12 bits of the start time in the high bits and count in
/// the low 20 bits (RFC 6733 3).
#[derive(Debug, Clone)]
pub struct IdAllocator {
    hop_by_hop: u32,
    end_to_end: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        let time_bits = (Utc::now().timestamp() as u32 & 0xFFF) << 20;
        Self::with_seed(rand::random(), time_bits | (rand::random::<u32>() & 0x000F_FFFF))
    }

    pub fn with_seed(hop_by_hop: u32, end_to_end: u32) -> Self {
        Self { hop_by_hop, end_to_end }
    }

    /// Assign fresh identifiers to an outgoing request
    pub fn stamp(&mut self, msg: &mut DiameterMessage) {
        msg.hop_by_hop_id = self.hop_by_hop;
        msg.end_to_end_id = self.end_to_end;

        self.hop_by_hop = self.hop_by_hop.wrapping_add(1);
        self.end_to_end =
            (self.end_to_end & 0xFFF0_0000) | (self.end_to_end.wrapping_add(1) & 0x000F_FFFF);
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Local node as seen by the base protocol (CER/CEA, DWA, DPR/DPA)
#[derive(Debug, Clone)]
pub struct PeerIdentity {
    pub origin_host: String,
    pub origin_realm: String,
    pub host_ip: IpAddr,
    pub origin_state_id: u32,
}

impl PeerIdentity {
    pub fn new(identity: &ServerIdentity, host_ip: IpAddr) -> Self {
        Self {
            origin_host: identity.origin_host.clone(),
            origin_realm: identity.origin_realm.clone(),
            host_ip,
            origin_state_id: Utc::now().timestamp() as u32,
        }
    }

    fn push_origin(&self, msg: &mut DiameterMessage) {
        msg.push_avp(Avp::identity(AVP_ORIGIN_HOST, self.origin_host.as_str()))
            .push_avp(Avp::identity(AVP_ORIGIN_REALM, self.origin_realm.as_str()));
    }

    fn push_capabilities(&self, msg: &mut DiameterMessage) {
        self.push_origin(msg);
        msg.push_avp(Avp::new(AVP_HOST_IP_ADDRESS, AvpValue::Address(encode_address(self.host_ip))))
            .push_avp(Avp::unsigned32(AVP_VENDOR_ID, 0))
            .push_avp(Avp { mandatory: false, ..Avp::utf8(AVP_PRODUCT_NAME, PRODUCT_NAME) })
            .push_avp(Avp::unsigned32(AVP_ORIGIN_STATE_ID, self.origin_state_id))
            .push_avp(Avp::unsigned32(AVP_AUTH_APPLICATION_ID, APP_ID_CREDIT_CONTROL));
    }

    /// Capabilities-Exchange-Request advertising the credit-control application
    pub fn capabilities_exchange_request(&self) -> DiameterMessage {
        let mut cer = DiameterMessage::new(CMD_CER, APP_ID_COMMON, true);
        // CER is never proxied
        cer.flags &= !dcca_shared::FLAG_PROXIABLE;
        self.push_capabilities(&mut cer);
        cer
    }

    pub fn capabilities_exchange_answer(&self, cer: &DiameterMessage, result_code: u32) -> DiameterMessage {
        let mut cea = DiameterMessage::answer_to(cer);
        cea.push_avp(Avp::unsigned32(AVP_RESULT_CODE, result_code));
        self.push_capabilities(&mut cea);
        cea
    }

    pub fn watchdog_answer(&self, dwr: &DiameterMessage) -> DiameterMessage {
        let mut dwa = DiameterMessage::answer_to(dwr);
        dwa.push_avp(Avp::unsigned32(AVP_RESULT_CODE, RESULT_CODE_SUCCESS));
        self.push_origin(&mut dwa);
        dwa.push_avp(Avp::unsigned32(AVP_ORIGIN_STATE_ID, self.origin_state_id));
        dwa
    }

    pub fn disconnect_peer_request(&self) -> DiameterMessage {
        let mut dpr = DiameterMessage::new(CMD_DPR, APP_ID_COMMON, true);
        dpr.flags &= !dcca_shared::FLAG_PROXIABLE;
        self.push_origin(&mut dpr);
        dpr.push_avp(Avp::enumerated(
            AVP_DISCONNECT_CAUSE,
            DISCONNECT_CAUSE_DO_NOT_WANT_TO_TALK_TO_YOU,
        ));
        dpr
    }

    pub fn disconnect_peer_answer(&self, dpr: &DiameterMessage) -> DiameterMessage {
        let mut dpa = DiameterMessage::answer_to(dpr);
        dpa.push_avp(Avp::unsigned32(AVP_RESULT_CODE, RESULT_CODE_SUCCESS));
        self.push_origin(&mut dpa);
        dpa
    }
}

// Address AVP: 2-octet address family followed by the address
fn encode_address(ip: IpAddr) -> Bytes {
    let mut buf = BytesMut::with_capacity(18);
    match ip {
        IpAddr::V4(v4) => {
            buf.put_u16(1);
            buf.put_slice(&v4.octets());
        }
        IpAddr::V6(v6) => {
            buf.put_u16(2);
            buf.put_slice(&v6.octets());
        }
    }
    buf.freeze()
}
