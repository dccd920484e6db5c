use serde::Serialize;

/// One channel the user is subscribed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionItem {
    /// Id of the content service that owns the channel.
    pub service_id: i32,
    pub url: String,
    /// Display name, possibly empty.
    pub title: String,
}

impl SubscriptionItem {
    pub fn new(service_id: i32, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            service_id,
            url: url.into(),
            title: title.into(),
        }
    }
}
