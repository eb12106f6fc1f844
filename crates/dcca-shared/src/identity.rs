/// Subscription-Id-Type values (RFC 4006 Sec 8.47)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SubscriptionIdType {
    E164 = 0,
    Imsi = 1,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberIdentifier {
    pub id_type: SubscriptionIdType,
    pub value: String,
}

/// Client identity and subscriber data, fixed for the process lifetime.
///
/// Built once from validated settings and passed explicitly to whoever
/// composes requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    origin_host: String,
    origin_realm: String,
    destination_host: String,
    destination_realm: String,
    msisdn: String,
    target_msisdn: String,
    imsi: String,
}

impl SessionConfig {
    pub fn new(
        origin_host: impl Into<String>,
        origin_realm: impl Into<String>,
        destination_host: impl Into<String>,
        destination_realm: impl Into<String>,
        msisdn: impl Into<String>,
        target_msisdn: impl Into<String>,
        imsi: impl Into<String>,
    ) -> Self {
        Self {
            origin_host: origin_host.into(),
            origin_realm: origin_realm.into(),
            destination_host: destination_host.into(),
            destination_realm: destination_realm.into(),
            msisdn: msisdn.into(),
            target_msisdn: target_msisdn.into(),
            imsi: imsi.into(),
        }
    }

    pub fn origin_host(&self) -> &str { &self.origin_host }
    pub fn origin_realm(&self) -> &str { &self.origin_realm }
    pub fn destination_host(&self) -> &str { &self.destination_host }
    pub fn destination_realm(&self) -> &str { &self.destination_realm }
    pub fn msisdn(&self) -> &str { &self.msisdn }
    pub fn target_msisdn(&self) -> &str { &self.target_msisdn }
    pub fn imsi(&self) -> &str { &self.imsi }

    /// The two Subscription-Id entries every request carries: E.164 then IMSI
    pub fn subscriber_identifiers(&self) -> [SubscriberIdentifier; 2] {
        [
            SubscriberIdentifier {
                id_type: SubscriptionIdType::E164,
                value: self.msisdn.clone(),
            },
            SubscriberIdentifier {
                id_type: SubscriptionIdType::Imsi,
                value: self.imsi.clone(),
            },
        ]
    }
}

/// Origin-Host / Origin-Realm a node stamps on everything it emits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    pub origin_host: String,
    pub origin_realm: String,
}

impl ServerIdentity {
    pub fn new(origin_host: impl Into<String>, origin_realm: impl Into<String>) -> Self {
        Self {
            origin_host: origin_host.into(),
            origin_realm: origin_realm.into(),
        }
    }
}

impl From<&SessionConfig> for ServerIdentity {
    fn from(config: &SessionConfig) -> Self {
        Self::new(config.origin_host(), config.origin_realm())
    }
}
