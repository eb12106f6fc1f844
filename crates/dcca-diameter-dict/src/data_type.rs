use bytes::Bytes;
use dcca_shared::AvpValue;
use thiserror::Error;

/// AVP data type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvpDataType {
    OctetString,
    Utf8String,
    DiameterIdentity,
    Unsigned32,
    Unsigned64,
    Integer32,
    Enumerated,
    Time,
    Address,
    Grouped,
}

/// Parse errors
#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Invalid length {0} for data type")]
    InvalidLength(usize),

    #[error("Invalid UTF-8 string")]
    InvalidUtf8,

    #[error("Grouped AVP must be decoded as a tree")]
    GroupedPayload,
}

fn fixed<const N: usize>(data: &[u8]) -> Result<[u8; N], ParseError> {
    data.try_into().map_err(|_| ParseError::InvalidLength(data.len()))
}

impl AvpDataType {
    /// Parse raw bytes of a scalar AVP into an AvpValue
    pub fn parse(&self, data: &[u8]) -> Result<AvpValue, ParseError> {
        match self {
            Self::OctetString => Ok(AvpValue::OctetString(Bytes::copy_from_slice(data))),

            Self::Utf8String | Self::DiameterIdentity => {
                let s = String::from_utf8(data.to_vec()).map_err(|_| ParseError::InvalidUtf8)?;
                if *self == Self::Utf8String {
                    Ok(AvpValue::Utf8String(s))
                } else {
                    Ok(AvpValue::DiameterIdentity(s))
                }
            }

            Self::Unsigned32 => Ok(AvpValue::Unsigned32(u32::from_be_bytes(fixed(data)?))),
            Self::Unsigned64 => Ok(AvpValue::Unsigned64(u64::from_be_bytes(fixed(data)?))),
            Self::Integer32 => Ok(AvpValue::Integer32(i32::from_be_bytes(fixed(data)?))),
            Self::Enumerated => Ok(AvpValue::Enumerated(i32::from_be_bytes(fixed(data)?))),
            Self::Time => Ok(AvpValue::Time(u32::from_be_bytes(fixed(data)?))),

            Self::Address => {
                // 2-octet family + at least one address octet
                if data.len() < 3 {
                    return Err(ParseError::InvalidLength(data.len()));
                }
                Ok(AvpValue::Address(Bytes::copy_from_slice(data)))
            }

            Self::Grouped => Err(ParseError::GroupedPayload),
        }
    }
}
