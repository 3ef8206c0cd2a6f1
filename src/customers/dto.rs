use serde::{Deserialize, Serialize};

use crate::customers::repo::Status;

/// Query parameters for the customer listing.
#[derive(Debug, Deserialize)]
pub struct CustomerQuery {
    pub search: Option<String>,
    pub sort_by: Option<String>,
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
}

fn default_sort_order() -> String {
    "asc".into()
}

/// Partial customer update.
#[derive(Debug, Deserialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date: Option<String>,
    pub payments: Option<f64>,
    pub status: Option<Status>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_order_defaults_to_ascending() {
        let query: CustomerQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.sort_order, "asc");
        assert!(query.search.is_none());
        assert!(query.sort_by.is_none());
    }

    #[test]
    fn update_accepts_partial_fields() {
        let update: CustomerUpdate =
            serde_json::from_str(r#"{"payments": 120.5, "status": "Pending"}"#).unwrap();
        assert_eq!(update.payments, Some(120.5));
        assert_eq!(update.status, Some(Status::Pending));
        assert!(update.name.is_none());
    }
}
