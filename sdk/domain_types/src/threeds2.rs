//! Models exchanged with the 3DS2 native SDK and the fingerprint submission endpoint.

use serde::{Deserialize, Serialize};

use crate::action::{Action, RedirectAction, Threeds2Action};

/// Decoded content of a fingerprint token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintToken {
    pub directory_server_id: Option<String>,
    pub directory_server_public_key: Option<String>,
    pub directory_server_root_certificates: Option<String>,
    #[serde(rename = "threeDSServerTransID")]
    pub three_ds_server_trans_id: Option<String>,
    #[serde(rename = "threeDSMessageVersion")]
    pub three_ds_message_version: Option<String>,
}

/// Decoded content of a challenge token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeToken {
    pub acs_reference_number: Option<String>,
    pub acs_signed_content: Option<String>,
    #[serde(rename = "acsTransID")]
    pub acs_trans_id: Option<String>,
    pub acs_url: Option<String>,
    pub message_version: Option<String>,
    #[serde(rename = "threeDSServerTransID")]
    pub three_ds_server_trans_id: Option<String>,
}

/// Everything the 3DS2 SDK needs to initialise for one directory server.
#[derive(Clone, Debug, PartialEq)]
pub struct ThreeDs2ConfigParameters {
    pub directory_server_id: String,
    pub directory_server_public_key: String,
    pub directory_server_root_certificates: Option<String>,
}

/// Device fingerprint returned by an SDK transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthenticationRequestParameters {
    pub device_data: String,
    pub sdk_transaction_id: String,
    pub sdk_app_id: String,
    pub sdk_reference_number: String,
    pub sdk_ephemeral_public_key: String,
    pub message_version: String,
}

/// Encoded fingerprint payload, base64 wrapped before it leaves the device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FingerprintPayload {
    #[serde(rename = "sdkAppID")]
    pub sdk_app_id: String,
    #[serde(rename = "sdkEncData")]
    pub sdk_enc_data: String,
    #[serde(rename = "sdkEphemPubKey")]
    pub sdk_ephem_pub_key: serde_json::Value,
    #[serde(rename = "sdkReferenceNumber")]
    pub sdk_reference_number: String,
    #[serde(rename = "sdkTransID")]
    pub sdk_trans_id: String,
    #[serde(rename = "messageVersion")]
    pub message_version: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChallengeParameters {
    pub three_ds_server_transaction_id: Option<String>,
    pub acs_transaction_id: Option<String>,
    pub acs_ref_number: Option<String>,
    pub acs_signed_content: Option<String>,
    pub three_ds_requestor_app_url: Option<String>,
}

/// Outcome of a challenge, reported by the SDK once the shopper is done.
#[derive(Clone, Debug, PartialEq)]
pub enum ChallengeResult {
    Completed {
        transaction_status: String,
    },
    Cancelled {
        transaction_status: String,
        additional_details: Option<String>,
    },
    Timeout {
        transaction_status: String,
        additional_details: Option<String>,
    },
    Error {
        transaction_status: String,
        additional_details: Option<String>,
    },
}

/// SDK initialisation failed in a way that still yields a transaction status to submit.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("3DS2 SDK initialisation failed with status {transaction_status}")]
pub struct ThreeDs2InitFailure {
    pub transaction_status: String,
    pub additional_details: Option<String>,
}

/// Transaction status and optional error details, base64 wrapped into the details payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResultPayload {
    pub trans_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorisation_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFingerprintRequest {
    pub fingerprint_result: String,
    pub payment_data: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFingerprintResponse {
    #[serde(rename = "type")]
    pub response_type: String,
    pub details: Option<serde_json::Value>,
    pub action: Option<Action>,
}

/// What to do after the fingerprint was submitted.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitFingerprintResult {
    Completed(serde_json::Value),
    Redirect(RedirectAction),
    Threeds2(Threeds2Action),
}
