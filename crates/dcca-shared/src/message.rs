use crate::avp::Avp;
use crate::{
    AVP_CC_REQUEST_NUMBER, AVP_CC_REQUEST_TYPE, AVP_RESULT_CODE, AVP_SESSION_ID, CMD_CER,
    CMD_CREDIT_CONTROL, CMD_DPR, CMD_DWR, FLAG_PROXIABLE, FLAG_REQUEST,
};

/// CC-Request-Type values (RFC 4006 Sec 8.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum RequestType {
    Initial = 1,
    Update = 2,
    Termination = 3,
}

impl RequestType {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Initial),
            2 => Some(Self::Update),
            3 => Some(Self::Termination),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    /// INITIAL and UPDATE carry service units, TERMINATION does not
    pub fn carries_units(self) -> bool {
        matches!(self, Self::Initial | Self::Update)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "INITIAL",
            Self::Update => "UPDATE",
            Self::Termination => "TERMINATION",
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiameterMessage {
    pub version: u8,
    pub flags: u8,
    pub command_code: u32,
    pub application_id: u32,
    pub hop_by_hop_id: u32,
    pub end_to_end_id: u32,
    pub avps: Vec<Avp>,
}

/// Credit-Control-Request / Credit-Control-Answer
pub type CreditControlMessage = DiameterMessage;

impl DiameterMessage {
    pub fn new(command_code: u32, application_id: u32, is_request: bool) -> Self {
        Self {
            version: 1,
            flags: if is_request { FLAG_REQUEST | FLAG_PROXIABLE } else { FLAG_PROXIABLE },
            command_code,
            application_id,
            hop_by_hop_id: 0,
            end_to_end_id: 0,
            avps: Vec::new(),
        }
    }

    /// Answer skeleton sharing the request's command, application and ids
    pub fn answer_to(request: &DiameterMessage) -> Self {
        Self {
            version: request.version,
            flags: request.flags & !FLAG_REQUEST,
            command_code: request.command_code,
            application_id: request.application_id,
            hop_by_hop_id: request.hop_by_hop_id,
            end_to_end_id: request.end_to_end_id,
            avps: Vec::new(),
        }
    }

    pub fn is_request(&self) -> bool {
        (self.flags & FLAG_REQUEST) != 0
    }

    // Helper: Get specific AVP
    pub fn get_avp(&self, code: u32) -> Option<&Avp> {
        self.avps.iter().find(|a| a.code == code)
    }

    pub fn get_all_avps(&self, code: u32) -> impl Iterator<Item = &Avp> {
        self.avps.iter().filter(move |a| a.code == code)
    }

    /// Follow a chain of grouped AVPs, e.g. MSCC -> RSU -> CC-Time
    pub fn find_path(&self, path: &[u32]) -> Option<&Avp> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.get_avp(*first)?, |avp, code| avp.child(*code))
    }

    pub fn push_avp(&mut self, avp: Avp) -> &mut Self {
        self.avps.push(avp);
        self
    }

    pub fn session_id(&self) -> Option<&str> {
        self.get_avp(AVP_SESSION_ID).and_then(Avp::as_str)
    }

    pub fn result_code(&self) -> Option<u32> {
        self.get_avp(AVP_RESULT_CODE).and_then(Avp::as_u32)
    }

    pub fn request_type(&self) -> Option<RequestType> {
        self.get_avp(AVP_CC_REQUEST_TYPE)
            .and_then(Avp::as_i32)
            .and_then(RequestType::from_i32)
    }

    pub fn request_number(&self) -> Option<u32> {
        self.get_avp(AVP_CC_REQUEST_NUMBER).and_then(Avp::as_u32)
    }

    // Helper: Check message type
    pub fn is_cer(&self) -> bool { self.command_code == CMD_CER && self.is_request() }
    pub fn is_cea(&self) -> bool { self.command_code == CMD_CER && !self.is_request() }
    pub fn is_dwr(&self) -> bool { self.command_code == CMD_DWR && self.is_request() }
    pub fn is_dwa(&self) -> bool { self.command_code == CMD_DWR && !self.is_request() }
    pub fn is_dpr(&self) -> bool { self.command_code == CMD_DPR && self.is_request() }
    pub fn is_dpa(&self) -> bool { self.command_code == CMD_DPR && !self.is_request() }
    pub fn is_ccr(&self) -> bool { self.command_code == CMD_CREDIT_CONTROL && self.is_request() }
    pub fn is_cca(&self) -> bool { self.command_code == CMD_CREDIT_CONTROL && !self.is_request() }
}
