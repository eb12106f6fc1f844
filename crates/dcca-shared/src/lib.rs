mod avp;
mod identity;
mod message;

pub use avp::{Avp, AvpValue};
pub use identity::{ServerIdentity, SessionConfig, SubscriberIdentifier, SubscriptionIdType};
pub use message::{CreditControlMessage, DiameterMessage, RequestType};

// Diameter Command Codes
pub const CMD_CER: u32 = 257;
pub const CMD_CREDIT_CONTROL: u32 = 272;
pub const CMD_DWR: u32 = 280;
pub const CMD_DPR: u32 = 282;

// Application Ids
pub const APP_ID_COMMON: u32 = 0;
pub const APP_ID_CREDIT_CONTROL: u32 = 4; // Diameter Credit-Control (RFC 4006)

pub const VENDOR_ID_3GPP: u32 = 10415;

// Header flags
pub const FLAG_REQUEST: u8 = 0x80;
pub const FLAG_PROXIABLE: u8 = 0x40;
pub const FLAG_ERROR: u8 = 0x20;

// Base protocol AVP Codes (RFC 6733)
pub const AVP_HOST_IP_ADDRESS: u32 = 257;
pub const AVP_AUTH_APPLICATION_ID: u32 = 258;
pub const AVP_SESSION_ID: u32 = 263;
pub const AVP_ORIGIN_HOST: u32 = 264;
pub const AVP_VENDOR_ID: u32 = 266;
pub const AVP_FIRMWARE_REVISION: u32 = 267;
pub const AVP_RESULT_CODE: u32 = 268;
pub const AVP_PRODUCT_NAME: u32 = 269;
pub const AVP_DISCONNECT_CAUSE: u32 = 273;
pub const AVP_ORIGIN_STATE_ID: u32 = 278;
pub const AVP_DEST_REALM: u32 = 283;
pub const AVP_DEST_HOST: u32 = 293;
pub const AVP_ORIGIN_REALM: u32 = 296;

// Credit-Control AVP Codes (RFC 4006)
pub const AVP_EVENT_TIMESTAMP: u32 = 55;
pub const AVP_CC_REQUEST_NUMBER: u32 = 415;
pub const AVP_CC_REQUEST_TYPE: u32 = 416;
pub const AVP_CC_TIME: u32 = 420;
pub const AVP_CC_TOTAL_OCTETS: u32 = 421;
pub const AVP_GRANTED_SERVICE_UNIT: u32 = 431;
pub const AVP_REQUESTED_SERVICE_UNIT: u32 = 437;
pub const AVP_SUBSCRIPTION_ID: u32 = 443;
pub const AVP_SUBSCRIPTION_ID_DATA: u32 = 444;
pub const AVP_SUBSCRIPTION_ID_TYPE: u32 = 450;
pub const AVP_MULTIPLE_SERVICES_CREDIT_CONTROL: u32 = 456;
pub const AVP_SERVICE_CONTEXT_ID: u32 = 461;

// 3GPP charging AVP Codes (TS 32.299, vendor 10415)
pub const AVP_EVENT_TYPE: u32 = 823;
pub const AVP_EVENT: u32 = 825;
pub const AVP_CALLING_PARTY_ADDRESS: u32 = 831;
pub const AVP_CALLED_PARTY_ADDRESS: u32 = 832;
pub const AVP_NODE_FUNCTIONALITY: u32 = 862;
pub const AVP_SERVICE_INFORMATION: u32 = 873;
pub const AVP_IMS_INFORMATION: u32 = 876;

// Result-Code values (AVP 268)
pub const RESULT_CODE_SUCCESS: u32 = 2001; // DIAMETER_SUCCESS
pub const RESULT_CODE_COMMAND_UNSUPPORTED: u32 = 3001;
pub const RESULT_CODE_UNABLE_TO_DELIVER: u32 = 3002;
pub const RESULT_CODE_INVALID_AVP_VALUE: u32 = 5004;
pub const RESULT_CODE_MISSING_AVP: u32 = 5005;
pub const RESULT_CODE_UNABLE_TO_COMPLY: u32 = 5012;

/// Service-Context-Id of the IMS voice charging service
pub const VOICE_SERVICE_CONTEXT_ID: &str = "32260@3gpp.org";

/// CC-Time requested on every INITIAL and UPDATE request, in seconds
pub const REQUESTED_TIME: u32 = 10;

/// Node-Functionality sent in IMS-Information (S-CSCF)
pub const NODE_FUNCTIONALITY: i32 = 0;
