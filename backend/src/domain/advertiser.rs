//! Advertiser accounts reachable with the current credential.

use serde::Serialize;

/// Ad-platform account under which pixels are created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Advertiser {
    /// Platform identifier of the account.
    pub advertiser_id: String,
    /// Display name chosen by the account owner.
    pub advertiser_name: String,
}

impl Advertiser {
    /// Convenience constructor.
    ///
    /// # Examples
    /// ```
    /// use pixel_onboarding::domain::Advertiser;
    ///
    /// let advertiser = Advertiser::new("7001", "Acme Store");
    /// assert_eq!(advertiser.advertiser_id, "7001");
    /// ```
    pub fn new(advertiser_id: impl Into<String>, advertiser_name: impl Into<String>) -> Self {
        Self {
            advertiser_id: advertiser_id.into(),
            advertiser_name: advertiser_name.into(),
        }
    }
}
