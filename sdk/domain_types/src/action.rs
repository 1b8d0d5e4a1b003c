//! Follow up instructions returned by the Checkout API after a payments or details call.
//!
//! The wire format is a JSON object discriminated by its `type` field. Every supported tag maps to
//! one variant of [`Action`]; tags the SDK does not know are kept verbatim in
//! [`Action::Unknown`] so that dispatch can report them.

use std::str::FromStr;

use common_enums::{ActionType, ThreeDs2SubType};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

use crate::payments::Amount;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwaitAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub payment_data: Option<String>,
    pub payment_method_type: Option<String>,
    pub url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub payment_data: Option<String>,
    pub payment_method_type: Option<String>,
    pub qr_code_data: Option<String>,
    pub url: Option<String>,
}

/// Covers both `redirect` and `nativeRedirect`, told apart by `action_type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub payment_data: Option<String>,
    pub payment_method_type: Option<String>,
    pub url: Option<String>,
    pub method: Option<String>,
    pub native_redirect_data: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Threeds2FingerprintAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub payment_data: Option<String>,
    pub payment_method_type: Option<String>,
    pub token: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Threeds2ChallengeAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub payment_data: Option<String>,
    pub payment_method_type: Option<String>,
    pub token: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Threeds2Action {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub payment_data: Option<String>,
    pub payment_method_type: Option<String>,
    pub token: Option<String>,
    #[serde(default, deserialize_with = "lenient_subtype")]
    pub subtype: Option<ThreeDs2SubType>,
    pub authorisation_token: Option<String>,
}

/// Subtypes the SDK does not know read as absent, leaving the delegate to report them.
fn lenient_subtype<'de, D>(deserializer: D) -> Result<Option<ThreeDs2SubType>, D::Error>
where
    D: Deserializer<'de>,
{
    let subtype = Option::<String>::deserialize(deserializer)?;
    Ok(subtype.and_then(|subtype| ThreeDs2SubType::from_str(&subtype).ok()))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub payment_data: Option<String>,
    pub payment_method_type: Option<String>,
    pub url: Option<String>,
    pub download_url: Option<String>,
    pub expires_at: Option<String>,
    pub reference: Option<String>,
    pub alternative_reference: Option<String>,
    pub total_amount: Option<Amount>,
    pub merchant_name: Option<String>,
    pub instructions_url: Option<String>,
    pub entity: Option<String>,
    pub issuer: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub payment_data: Option<String>,
    pub payment_method_type: Option<String>,
    pub sdk_data: Option<serde_json::Value>,
}

/// An action whose `type` the SDK cannot handle. The raw payload is preserved.
#[derive(Clone, Debug, PartialEq)]
pub struct UnknownAction {
    pub action_type: String,
    pub raw: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Await(AwaitAction),
    QrCode(QrCodeAction),
    Redirect(RedirectAction),
    Threeds2Fingerprint(Threeds2FingerprintAction),
    Threeds2Challenge(Threeds2ChallengeAction),
    Threeds2(Threeds2Action),
    Voucher(VoucherAction),
    Sdk(SdkAction),
    Unknown(UnknownAction),
}

impl Action {
    /// Raw `type` tag, exactly as received.
    pub fn type_tag(&self) -> String {
        match self {
            Self::Await(a) => a.action_type.to_string(),
            Self::QrCode(a) => a.action_type.to_string(),
            Self::Redirect(a) => a.action_type.to_string(),
            Self::Threeds2Fingerprint(a) => a.action_type.to_string(),
            Self::Threeds2Challenge(a) => a.action_type.to_string(),
            Self::Threeds2(a) => a.action_type.to_string(),
            Self::Voucher(a) => a.action_type.to_string(),
            Self::Sdk(a) => a.action_type.to_string(),
            Self::Unknown(a) => a.action_type.clone(),
        }
    }

    pub fn payment_data(&self) -> Option<&str> {
        match self {
            Self::Await(a) => a.payment_data.as_deref(),
            Self::QrCode(a) => a.payment_data.as_deref(),
            Self::Redirect(a) => a.payment_data.as_deref(),
            Self::Threeds2Fingerprint(a) => a.payment_data.as_deref(),
            Self::Threeds2Challenge(a) => a.payment_data.as_deref(),
            Self::Threeds2(a) => a.payment_data.as_deref(),
            Self::Voucher(a) => a.payment_data.as_deref(),
            Self::Sdk(a) => a.payment_data.as_deref(),
            Self::Unknown(a) => a.raw.get("paymentData").and_then(serde_json::Value::as_str),
        }
    }

    pub fn payment_method_type(&self) -> Option<&str> {
        match self {
            Self::Await(a) => a.payment_method_type.as_deref(),
            Self::QrCode(a) => a.payment_method_type.as_deref(),
            Self::Redirect(a) => a.payment_method_type.as_deref(),
            Self::Threeds2Fingerprint(a) => a.payment_method_type.as_deref(),
            Self::Threeds2Challenge(a) => a.payment_method_type.as_deref(),
            Self::Threeds2(a) => a.payment_method_type.as_deref(),
            Self::Voucher(a) => a.payment_method_type.as_deref(),
            Self::Sdk(a) => a.payment_method_type.as_deref(),
            Self::Unknown(a) => a
                .raw
                .get("paymentMethodType")
                .and_then(serde_json::Value::as_str),
        }
    }

    /// Parses an action from a JSON string.
    pub fn from_json(
        json: &str,
    ) -> common_utils::CustomResult<Self, common_utils::errors::ParsingError> {
        use error_stack::ResultExt;

        serde_json::from_str(json)
            .change_context(common_utils::errors::ParsingError::StructParseFailure("Action"))
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let type_tag = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| D::Error::missing_field("type"))?;

        let action = match ActionType::from_str(&type_tag) {
            Ok(ActionType::Await) => serde_json::from_value(value).map(Self::Await),
            Ok(ActionType::QrCode) => serde_json::from_value(value).map(Self::QrCode),
            Ok(ActionType::Redirect | ActionType::NativeRedirect) => {
                serde_json::from_value(value).map(Self::Redirect)
            }
            Ok(ActionType::Threeds2Fingerprint) => {
                serde_json::from_value(value).map(Self::Threeds2Fingerprint)
            }
            Ok(ActionType::Threeds2Challenge) => {
                serde_json::from_value(value).map(Self::Threeds2Challenge)
            }
            Ok(ActionType::Threeds2) => serde_json::from_value(value).map(Self::Threeds2),
            Ok(ActionType::Voucher) => serde_json::from_value(value).map(Self::Voucher),
            Ok(ActionType::Sdk) => serde_json::from_value(value).map(Self::Sdk),
            Err(_) => Ok(Self::Unknown(UnknownAction {
                action_type: type_tag,
                raw: value,
            })),
        };
        action.map_err(D::Error::custom)
    }
}

impl Serialize for Action {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Await(a) => a.serialize(serializer),
            Self::QrCode(a) => a.serialize(serializer),
            Self::Redirect(a) => a.serialize(serializer),
            Self::Threeds2Fingerprint(a) => a.serialize(serializer),
            Self::Threeds2Challenge(a) => a.serialize(serializer),
            Self::Threeds2(a) => a.serialize(serializer),
            Self::Voucher(a) => a.serialize(serializer),
            Self::Sdk(a) => a.serialize(serializer),
            Self::Unknown(a) => a.raw.serialize(serializer),
        }
    }
}
