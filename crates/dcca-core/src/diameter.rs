use crate::error::{DccaError, Result};

pub const HEADER_LEN: usize = 20;

// AVP flags
pub const AVP_FLAG_VENDOR: u8 = 0x80;
pub const AVP_FLAG_MANDATORY: u8 = 0x40;

/// Diameter packet header (20 bytes)
#[derive(Debug, Clone, PartialEq)]
pub struct DiameterHeader {
    pub version: u8,
    pub length: u32,
    pub flags: u8,
    pub command_code: u32,
    pub application_id: u32,
    pub hop_by_hop_id: u32,
    pub end_to_end_id: u32,
}

/// Raw AVP as it appears on the wire
#[derive(Debug, Clone, PartialEq)]
pub struct DiameterAvp {
    pub code: u32,
    pub flags: u8,
    pub vendor_id: Option<u32>,
    pub data: Vec<u8>,
}

/// Complete Diameter packet
#[derive(Debug, Clone)]
pub struct DiameterPacket {
    pub header: DiameterHeader,
    pub avps: Vec<DiameterAvp>,
}

fn u24(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])
}

impl DiameterHeader {
    /// Parse header from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(DccaError::InvalidPacket("Header too short".to_string()));
        }

        let version = data[0];
        if version != 1 {
            return Err(DccaError::InvalidPacket(format!("Invalid version: {version}")));
        }

        let length = u24(&data[1..4]);
        if (length as usize) < HEADER_LEN || length % 4 != 0 {
            return Err(DccaError::InvalidPacket(format!("Invalid message length: {length}")));
        }

        Ok(Self {
            version,
            length,
            flags: data[4],
            command_code: u24(&data[5..8]),
            application_id: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
            hop_by_hop_id: u32::from_be_bytes([data[12], data[13], data[14], data[15]]),
            end_to_end_id: u32::from_be_bytes([data[16], data[17], data[18], data[19]]),
        })
    }

    /// Serialize header to bytes
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN);

        bytes.push(self.version);
        bytes.extend_from_slice(&self.length.to_be_bytes()[1..4]);
        bytes.push(self.flags);
        bytes.extend_from_slice(&self.command_code.to_be_bytes()[1..4]);
        bytes.extend_from_slice(&self.application_id.to_be_bytes());
        bytes.extend_from_slice(&self.hop_by_hop_id.to_be_bytes());
        bytes.extend_from_slice(&self.end_to_end_id.to_be_bytes());

        bytes
    }
}

impl DiameterAvp {
    /// Parse one AVP, returning it with its padded on-wire length
    pub fn parse(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < 8 {
            return Err(DccaError::InvalidPacket("AVP too short".to_string()));
        }

        let code = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let flags = data[4];
        let length = u24(&data[5..8]) as usize;

        let (vendor_id, offset) = if (flags & AVP_FLAG_VENDOR) != 0 {
            if data.len() < 12 {
                return Err(DccaError::InvalidPacket("Vendor AVP too short".to_string()));
            }
            (Some(u32::from_be_bytes([data[8], data[9], data[10], data[11]])), 12)
        } else {
            (None, 8)
        };

        if length < offset {
            return Err(DccaError::InvalidPacket(format!("Invalid AVP length {length} for code {code}")));
        }
        if data.len() < length {
            return Err(DccaError::InvalidPacket(format!("AVP {code} data truncated")));
        }

        let avp = Self {
            code,
            flags,
            vendor_id,
            data: data[offset..length].to_vec(),
        };

        // Padding to a 32-bit boundary may be absent on the last AVP of a group
        Ok((avp, length.div_ceil(4) * 4))
    }

    /// Parse a run of AVPs (message body or grouped AVP payload)
    pub fn parse_all(mut data: &[u8]) -> Result<Vec<Self>> {
        let mut avps = Vec::new();
        while !data.is_empty() {
            let (avp, consumed) = Self::parse(data)?;
            avps.push(avp);
            data = &data[consumed.min(data.len())..];
        }
        Ok(avps)
    }

    /// Serialize AVP to bytes, padded to 4 octets
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(12 + self.data.len() + 3);

        let mut flags = self.flags;
        if self.vendor_id.is_some() {
            flags |= AVP_FLAG_VENDOR;
        } else {
            flags &= !AVP_FLAG_VENDOR;
        }

        bytes.extend_from_slice(&self.code.to_be_bytes());
        bytes.push(flags);

        let data_offset = if self.vendor_id.is_some() { 12 } else { 8 };
        let length = (data_offset + self.data.len()) as u32;
        bytes.extend_from_slice(&length.to_be_bytes()[1..4]);

        if let Some(vid) = self.vendor_id {
            bytes.extend_from_slice(&vid.to_be_bytes());
        }

        bytes.extend_from_slice(&self.data);

        while bytes.len() % 4 != 0 {
            bytes.push(0);
        }

        bytes
    }
}

impl DiameterPacket {
    /// Total message length announced by a header prefix, if enough bytes are present
    pub fn peek_length(data: &[u8]) -> Result<Option<usize>> {
        if data.len() < HEADER_LEN {
            return Ok(None);
        }
        DiameterHeader::parse(data).map(|h| Some(h.length as usize))
    }

    /// Parse complete packet from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = DiameterHeader::parse(data)?;

        let end = header.length as usize;
        if data.len() < end {
            return Err(DccaError::InvalidPacket("Packet truncated".to_string()));
        }

        let avps = DiameterAvp::parse_all(&data[HEADER_LEN..end])?;
        Ok(Self { header, avps })
    }

    /// Serialize packet to bytes, fixing up the header length
    pub fn serialize(&self) -> Vec<u8> {
        let avp_bytes: Vec<u8> = self.avps.iter().flat_map(|avp| avp.serialize()).collect();

        let mut header = self.header.clone();
        header.length = (HEADER_LEN + avp_bytes.len()) as u32;

        let mut bytes = header.serialize();
        bytes.extend_from_slice(&avp_bytes);
        bytes
    }

    /// Find AVP by code
    pub fn find_avp(&self, code: u32) -> Option<&DiameterAvp> {
        self.avps.iter().find(|avp| avp.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_parse_serialize() {
        let data = vec![
            1, 0, 0, 20, // Version, Length (20)
            0xC0, 0, 1, 16, // Flags (Request|Proxiable), Command Code (272)
            0, 0, 0, 4, // Application ID (Credit-Control)
            0, 0, 0, 1, // Hop-by-Hop ID
            0, 0, 0, 2, // End-to-End ID
        ];

        let header = DiameterHeader::parse(&data).unwrap();
        assert_eq!(header.version, 1);
        assert_eq!(header.length, 20);
        assert_eq!(header.command_code, 272);
        assert_eq!(header.application_id, 4);

        assert_eq!(header.serialize(), data);
    }

    #[test]
    fn test_header_rejects_bad_version_and_length() {
        let mut data = vec![0u8; 20];
        data[0] = 2;
        data[3] = 20;
        assert!(DiameterHeader::parse(&data).is_err());

        data[0] = 1;
        data[3] = 18;
        assert!(DiameterHeader::parse(&data).is_err());
    }

    #[test]
    fn test_vendor_avp_parse_serialize() {
        let avp = DiameterAvp {
            code: 862,
            flags: AVP_FLAG_MANDATORY,
            vendor_id: Some(10415),
            data: vec![0, 0, 0, 0],
        };

        let bytes = avp.serialize();
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytes[4], AVP_FLAG_VENDOR | AVP_FLAG_MANDATORY);

        let (parsed, length) = DiameterAvp::parse(&bytes).unwrap();
        assert_eq!(length, 16);
        assert_eq!(parsed.vendor_id, Some(10415));
        assert_eq!(parsed.data, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_avp_padding() {
        let avp = DiameterAvp {
            code: 263,
            flags: AVP_FLAG_MANDATORY,
            vendor_id: None,
            data: b"abcde".to_vec(),
        };

        let bytes = avp.serialize();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[5..8], &[0, 0, 13]);

        let (parsed, consumed) = DiameterAvp::parse(&bytes).unwrap();
        assert_eq!(parsed.data, b"abcde");
        assert_eq!(consumed, 16);
    }

    #[test]
    fn test_packet_parse() {
        let data = vec![
            1, 0, 0, 32, // Version, Length (32)
            0x80, 0, 1, 16, // Flags, Command Code
            0, 0, 0, 4, // Application ID
            0, 0, 0, 1, // Hop-by-Hop ID
            0, 0, 0, 2, // End-to-End ID
            // AVP
            0, 0, 1, 8, // Code (264)
            0x40, 0, 0, 12, // Flags, Length
            0x74, 0x65, 0x73, 0x74, // Data "test"
        ];

        assert_eq!(DiameterPacket::peek_length(&data[..20]).unwrap(), Some(32));
        assert_eq!(DiameterPacket::peek_length(&data[..10]).unwrap(), None);

        let packet = DiameterPacket::parse(&data).unwrap();
        assert_eq!(packet.header.command_code, 272);
        assert_eq!(packet.avps.len(), 1);
        assert_eq!(packet.find_avp(264).map(|a| a.data.clone()), Some(b"test".to_vec()));
        assert_eq!(packet.serialize(), data);
    }

    #[test]
    fn test_truncated_avp() {
        let data = vec![0, 0, 1, 8, 0x40, 0, 0, 12, 0x74];
        assert!(DiameterAvp::parse(&data).is_err());
    }
}
