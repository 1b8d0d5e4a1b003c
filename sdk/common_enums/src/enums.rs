use serde::{Deserialize, Serialize};

/// Value of the `type` tag carried by every action payload.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum ActionType {
    #[serde(rename = "await")]
    #[strum(serialize = "await")]
    Await,
    #[serde(rename = "qrCode")]
    #[strum(serialize = "qrCode")]
    QrCode,
    #[serde(rename = "redirect")]
    #[strum(serialize = "redirect")]
    Redirect,
    #[serde(rename = "nativeRedirect")]
    #[strum(serialize = "nativeRedirect")]
    NativeRedirect,
    #[serde(rename = "threeDS2Fingerprint")]
    #[strum(serialize = "threeDS2Fingerprint")]
    Threeds2Fingerprint,
    #[serde(rename = "threeDS2Challenge")]
    #[strum(serialize = "threeDS2Challenge")]
    Threeds2Challenge,
    #[serde(rename = "threeDS2")]
    #[strum(serialize = "threeDS2")]
    Threeds2,
    #[serde(rename = "voucher")]
    #[strum(serialize = "voucher")]
    Voucher,
    #[serde(rename = "sdk")]
    #[strum(serialize = "sdk")]
    Sdk,
}

/// Sub type of a `threeDS2` action.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ThreeDs2SubType {
    Fingerprint,
    Challenge,
}

/// Concrete handler family an action is routed to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DelegateKind {
    Await,
    QrCode,
    Redirect,
    ThreeDs2,
    Voucher,
    Sdk,
}

/// What the hosting component should currently render for the active action.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComponentViewType {
    Await,
    SimpleQrCode,
    FullQrCode,
    QrCodeRedirect,
    SimpleVoucher,
    FullVoucher,
    Redirect,
    ThreeDs2,
    Sdk,
}

/// Checkout API environment, each with its own shopper facing host.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Environment {
    #[default]
    Test,
    Europe,
    UnitedStates,
    Australia,
    India,
    Apse,
}

impl Environment {
    pub fn checkout_shopper_base_url(&self) -> &'static str {
        match self {
            Self::Test => "https://checkoutshopper-test.adyen.com/checkoutshopper/",
            Self::Europe => "https://checkoutshopper-live.adyen.com/checkoutshopper/",
            Self::UnitedStates => "https://checkoutshopper-live-us.adyen.com/checkoutshopper/",
            Self::Australia => "https://checkoutshopper-live-au.adyen.com/checkoutshopper/",
            Self::India => "https://checkoutshopper-live-in.adyen.com/checkoutshopper/",
            Self::Apse => "https://checkoutshopper-live-apse.adyen.com/checkoutshopper/",
        }
    }

    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Test)
    }
}

/// Host side permissions a delegate may need before it can continue.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequiredPermission {
    WriteExternalStorage,
}
