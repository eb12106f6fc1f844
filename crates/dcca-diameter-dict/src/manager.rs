use crate::data_type::{AvpDataType, ParseError};
use crate::standard::StandardAvpCode;
use dcca_shared::AvpValue;

/// AVP information
#[derive(Debug, Clone)]
pub struct AvpInfo {
    pub code: u32,
    pub name: &'static str,
    pub data_type: AvpDataType,
    pub vendor_id: Option<u32>,
}

/// Dictionary manager for AVP lookup and parsing
#[derive(Debug, Clone, Copy, Default)]
pub struct DictionaryManager;

impl DictionaryManager {
    pub fn new() -> Self {
        Self
    }

    /// Lookup AVP information by code and vendor
    pub fn lookup(&self, code: u32, vendor_id: Option<u32>) -> Option<AvpInfo> {
        StandardAvpCode::from_code(code, vendor_id).map(|std_code| AvpInfo {
            code,
            name: std_code.name(),
            data_type: std_code.data_type(),
            vendor_id,
        })
    }

    /// Data type used to decode an AVP. Unknown AVPs stay opaque.
    pub fn data_type(&self, code: u32, vendor_id: Option<u32>) -> AvpDataType {
        self.lookup(code, vendor_id)
            .map(|info| info.data_type)
            .unwrap_or(AvpDataType::OctetString)
    }

    /// Parse scalar AVP data
    pub fn parse_avp(
        &self,
        code: u32,
        vendor_id: Option<u32>,
        data: &[u8],
    ) -> Result<AvpValue, ParseError> {
        self.data_type(code, vendor_id).parse(data)
    }

    /// Human readable AVP name for logs
    pub fn name(&self, code: u32, vendor_id: Option<u32>) -> &'static str {
        self.lookup(code, vendor_id).map(|info| info.name).unwrap_or("Unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_lookup_standard_avp() {
        let manager = DictionaryManager::new();
        let info = manager.lookup(264, None).unwrap(); // Origin-Host

        assert_eq!(info.code, 264);
        assert_eq!(info.name, "Origin-Host");
        assert_eq!(info.data_type, AvpDataType::DiameterIdentity);
        assert_eq!(info.vendor_id, None);
    }

    #[test]
    fn test_lookup_unknown_avp() {
        let manager = DictionaryManager::new();
        assert!(manager.lookup(99999, None).is_none());
        assert_eq!(manager.data_type(99999, None), AvpDataType::OctetString);
        assert_eq!(manager.name(99999, None), "Unknown");
    }

    #[test]
    fn test_parse_avp() {
        let manager = DictionaryManager::new();
        let data = vec![0x00, 0x00, 0x07, 0xD1]; // 2001
        let result = manager.parse_avp(268, None, &data).unwrap(); // Result-Code
        assert_eq!(result, AvpValue::Unsigned32(2001));
    }

    #[test]
    fn test_parse_unknown_avp_is_opaque() {
        let manager = DictionaryManager::new();
        let result = manager.parse_avp(99999, None, &[0x00, 0x01]).unwrap();
        assert_eq!(result, AvpValue::OctetString(Bytes::from_static(&[0x00, 0x01])));
    }
}
