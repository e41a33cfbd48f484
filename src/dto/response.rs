use serde::Serialize;

/// Body shape shared by every endpoint: `success` always, `message` or
/// `data` when the operation has one, `results` carrying the returned row
/// count on listings.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            results: None,
            data: Some(data),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            results: None,
            data: None,
        }
    }

    pub fn message_with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            results: None,
            data: Some(data),
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(items: Vec<T>) -> Self {
        Self {
            success: true,
            message: None,
            results: Some(items.len()),
            data: Some(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_only_omits_other_fields() {
        let value = serde_json::to_value(ApiResponse::<()>::message("logged out successfully"))
            .unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "success": true, "message": "logged out successfully" })
        );
    }

    #[test]
    fn listing_reports_returned_count() {
        let value = serde_json::to_value(ApiResponse::list(vec![1, 2, 3])).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["results"], 3);
        assert_eq!(value["data"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn data_envelope_has_no_results_field() {
        let value = serde_json::to_value(ApiResponse::data("payload")).unwrap();
        assert!(value.get("results").is_none());
        assert_eq!(value["data"], "payload");
    }
}
