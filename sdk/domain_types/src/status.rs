use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub payment_data: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(rename = "type")]
    pub status_type: Option<String>,
    pub payload: Option<String>,
    pub result_code: Option<String>,
}

impl StatusResponse {
    /// Anything but `pending` ends the polling loop.
    pub fn is_final_result(&self) -> bool {
        !self
            .result_code
            .as_deref()
            .is_some_and(|code| code.eq_ignore_ascii_case(common_utils::consts::RESULT_PENDING))
    }

    pub fn is_refused(&self) -> bool {
        self.result_code
            .as_deref()
            .is_some_and(|code| code.eq_ignore_ascii_case(common_utils::consts::RESULT_REFUSED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(result_code: Option<&str>) -> StatusResponse {
        StatusResponse {
            status_type: Some("complete".to_string()),
            payload: None,
            result_code: result_code.map(str::to_string),
        }
    }

    #[test]
    fn pending_is_the_only_non_final_code() {
        assert!(!response(Some("pending")).is_final_result());
        assert!(!response(Some("PENDING")).is_final_result());
        assert!(response(Some("authorised")).is_final_result());
        assert!(response(None).is_final_result());
    }

    #[test]
    fn refused_is_case_insensitive() {
        assert!(response(Some("Refused")).is_refused());
        assert!(!response(Some("authorised")).is_refused());
    }
}
