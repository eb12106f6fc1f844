use crate::data_type::AvpDataType;
use dcca_shared::VENDOR_ID_3GPP;

/// AVP codes understood by the credit-control endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardAvpCode {
    // ========================================
    // RFC 6733 Base Protocol
    // ========================================
    EventTimestamp,
    HostIpAddress,
    AuthApplicationId,
    SessionId,
    OriginHost,
    VendorId,
    FirmwareRevision,
    ResultCode,
    ProductName,
    DisconnectCause,
    OriginStateId,
    DestinationRealm,
    DestinationHost,
    OriginRealm,

    // ========================================
    // RFC 4006 Credit-Control
    // ========================================
    CcRequestNumber,
    CcRequestType,
    CcTime,
    CcTotalOctets,
    GrantedServiceUnit,
    RequestedServiceUnit,
    SubscriptionId,
    SubscriptionIdData,
    SubscriptionIdType,
    MultipleServicesCreditControl,
    ServiceContextId,

    // ========================================
    // 3GPP Charging (TS 32.299)
    // ========================================
    EventType,
    Event,
    CallingPartyAddress,
    CalledPartyAddress,
    NodeFunctionality,
    ServiceInformation,
    ImsInformation,
}

impl StandardAvpCode {
    /// Resolve a (code, vendor) pair. 3GPP AVPs only match with vendor 10415.
    pub fn from_code(code: u32, vendor_id: Option<u32>) -> Option<Self> {
        match vendor_id {
            None => match code {
                55 => Some(Self::EventTimestamp),
                257 => Some(Self::HostIpAddress),
                258 => Some(Self::AuthApplicationId),
                263 => Some(Self::SessionId),
                264 => Some(Self::OriginHost),
                266 => Some(Self::VendorId),
                267 => Some(Self::FirmwareRevision),
                268 => Some(Self::ResultCode),
                269 => Some(Self::ProductName),
                273 => Some(Self::DisconnectCause),
                278 => Some(Self::OriginStateId),
                283 => Some(Self::DestinationRealm),
                293 => Some(Self::DestinationHost),
                296 => Some(Self::OriginRealm),
                415 => Some(Self::CcRequestNumber),
                416 => Some(Self::CcRequestType),
                420 => Some(Self::CcTime),
                421 => Some(Self::CcTotalOctets),
                431 => Some(Self::GrantedServiceUnit),
                437 => Some(Self::RequestedServiceUnit),
                443 => Some(Self::SubscriptionId),
                444 => Some(Self::SubscriptionIdData),
                450 => Some(Self::SubscriptionIdType),
                456 => Some(Self::MultipleServicesCreditControl),
                461 => Some(Self::ServiceContextId),
                _ => None,
            },
            Some(VENDOR_ID_3GPP) => match code {
                823 => Some(Self::EventType),
                825 => Some(Self::Event),
                831 => Some(Self::CallingPartyAddress),
                832 => Some(Self::CalledPartyAddress),
                862 => Some(Self::NodeFunctionality),
                873 => Some(Self::ServiceInformation),
                876 => Some(Self::ImsInformation),
                _ => None,
            },
            Some(_) => None,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Self::EventTimestamp => 55,
            Self::HostIpAddress => 257,
            Self::AuthApplicationId => 258,
            Self::SessionId => 263,
            Self::OriginHost => 264,
            Self::VendorId => 266,
            Self::FirmwareRevision => 267,
            Self::ResultCode => 268,
            Self::ProductName => 269,
            Self::DisconnectCause => 273,
            Self::OriginStateId => 278,
            Self::DestinationRealm => 283,
            Self::DestinationHost => 293,
            Self::OriginRealm => 296,
            Self::CcRequestNumber => 415,
            Self::CcRequestType => 416,
            Self::CcTime => 420,
            Self::CcTotalOctets => 421,
            Self::GrantedServiceUnit => 431,
            Self::RequestedServiceUnit => 437,
            Self::SubscriptionId => 443,
            Self::SubscriptionIdData => 444,
            Self::SubscriptionIdType => 450,
            Self::MultipleServicesCreditControl => 456,
            Self::ServiceContextId => 461,
            Self::EventType => 823,
            Self::Event => 825,
            Self::CallingPartyAddress => 831,
            Self::CalledPartyAddress => 832,
            Self::NodeFunctionality => 862,
            Self::ServiceInformation => 873,
            Self::ImsInformation => 876,
        }
    }

    pub fn vendor_id(&self) -> Option<u32> {
        match self {
            Self::EventType
            | Self::Event
            | Self::CallingPartyAddress
            | Self::CalledPartyAddress
            | Self::NodeFunctionality
            | Self::ServiceInformation
            | Self::ImsInformation => Some(VENDOR_ID_3GPP),
            _ => None,
        }
    }

    /// Get AVP name
    pub fn name(&self) -> &'static str {
        match self {
            Self::EventTimestamp => "Event-Timestamp",
            Self::HostIpAddress => "Host-IP-Address",
            Self::AuthApplicationId => "Auth-Application-Id",
            Self::SessionId => "Session-Id",
            Self::OriginHost => "Origin-Host",
            Self::VendorId => "Vendor-Id",
            Self::FirmwareRevision => "Firmware-Revision",
            Self::ResultCode => "Result-Code",
            Self::ProductName => "Product-Name",
            Self::DisconnectCause => "Disconnect-Cause",
            Self::OriginStateId => "Origin-State-Id",
            Self::DestinationRealm => "Destination-Realm",
            Self::DestinationHost => "Destination-Host",
            Self::OriginRealm => "Origin-Realm",
            Self::CcRequestNumber => "CC-Request-Number",
            Self::CcRequestType => "CC-Request-Type",
            Self::CcTime => "CC-Time",
            Self::CcTotalOctets => "CC-Total-Octets",
            Self::GrantedServiceUnit => "Granted-Service-Unit",
            Self::RequestedServiceUnit => "Requested-Service-Unit",
            Self::SubscriptionId => "Subscription-Id",
            Self::SubscriptionIdData => "Subscription-Id-Data",
            Self::SubscriptionIdType => "Subscription-Id-Type",
            Self::MultipleServicesCreditControl => "Multiple-Services-Credit-Control",
            Self::ServiceContextId => "Service-Context-Id",
            Self::EventType => "Event-Type",
            Self::Event => "Event",
            Self::CallingPartyAddress => "Calling-Party-Address",
            Self::CalledPartyAddress => "Called-Party-Address",
            Self::NodeFunctionality => "Node-Functionality",
            Self::ServiceInformation => "Service-Information",
            Self::ImsInformation => "IMS-Information",
        }
    }

    /// Get AVP data type
    pub fn data_type(&self) -> AvpDataType {
        match self {
            Self::EventTimestamp => AvpDataType::Time,
            Self::HostIpAddress => AvpDataType::Address,
            Self::AuthApplicationId
            | Self::VendorId
            | Self::FirmwareRevision
            | Self::ResultCode
            | Self::OriginStateId
            | Self::CcRequestNumber
            | Self::CcTime => AvpDataType::Unsigned32,
            Self::CcTotalOctets => AvpDataType::Unsigned64,
            Self::SessionId
            | Self::ProductName
            | Self::SubscriptionIdData
            | Self::ServiceContextId
            | Self::CallingPartyAddress
            | Self::CalledPartyAddress => AvpDataType::Utf8String,
            Self::OriginHost
            | Self::OriginRealm
            | Self::DestinationHost
            | Self::DestinationRealm => AvpDataType::DiameterIdentity,
            Self::CcRequestType
            | Self::SubscriptionIdType
            | Self::NodeFunctionality
            | Self::DisconnectCause => AvpDataType::Enumerated,
            // Carried as the numeric request type
            Self::Event => AvpDataType::Integer32,
            Self::GrantedServiceUnit
            | Self::RequestedServiceUnit
            | Self::SubscriptionId
            | Self::MultipleServicesCreditControl
            | Self::EventType
            | Self::ServiceInformation
            | Self::ImsInformation => AvpDataType::Grouped,
        }
    }
}
