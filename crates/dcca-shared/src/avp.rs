use bytes::Bytes;

/// Typed AVP payload.
///
/// Grouped AVPs own their children, so a message is a tree rather than the
/// flat list the wire format suggests.
#[derive(Debug, Clone, PartialEq)]
pub enum AvpValue {
    OctetString(Bytes),
    Utf8String(String),
    DiameterIdentity(String),
    Unsigned32(u32),
    Unsigned64(u64),
    Integer32(i32),
    Enumerated(i32),
    /// Seconds since 1900-01-01 (NTP era 0)
    Time(u32),
    /// Address family + address bytes
    Address(Bytes),
    Grouped(Vec<Avp>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Avp {
    pub code: u32,
    pub vendor_id: Option<u32>,
    pub mandatory: bool,
    pub value: AvpValue,
}

impl Avp {
    pub fn new(code: u32, value: AvpValue) -> Self {
        Self {
            code,
            vendor_id: None,
            mandatory: true,
            value,
        }
    }

    /// Vendor-specific AVP with the M bit set
    pub fn vendor(code: u32, vendor_id: u32, value: AvpValue) -> Self {
        Self {
            code,
            vendor_id: Some(vendor_id),
            mandatory: true,
            value,
        }
    }

    pub fn utf8(code: u32, value: impl Into<String>) -> Self {
        Self::new(code, AvpValue::Utf8String(value.into()))
    }

    pub fn identity(code: u32, value: impl Into<String>) -> Self {
        Self::new(code, AvpValue::DiameterIdentity(value.into()))
    }

    pub fn unsigned32(code: u32, value: u32) -> Self {
        Self::new(code, AvpValue::Unsigned32(value))
    }

    pub fn enumerated(code: u32, value: i32) -> Self {
        Self::new(code, AvpValue::Enumerated(value))
    }

    pub fn grouped(code: u32, children: Vec<Avp>) -> Self {
        Self::new(code, AvpValue::Grouped(children))
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self.value {
            AvpValue::Unsigned32(v) | AvpValue::Time(v) => Some(v),
            AvpValue::Integer32(v) | AvpValue::Enumerated(v) => u32::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.value {
            AvpValue::Unsigned64(v) => Some(v),
            _ => self.as_u32().map(u64::from),
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self.value {
            AvpValue::Integer32(v) | AvpValue::Enumerated(v) => Some(v),
            AvpValue::Unsigned32(v) => i32::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            AvpValue::Utf8String(s) | AvpValue::DiameterIdentity(s) => Some(s),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&[Avp]> {
        match &self.value {
            AvpValue::Grouped(children) => Some(children),
            _ => None,
        }
    }

    /// First child with the given code (None for non-grouped AVPs)
    pub fn child(&self, code: u32) -> Option<&Avp> {
        self.children()?.iter().find(|a| a.code == code)
    }
}
