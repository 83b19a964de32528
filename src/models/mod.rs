pub mod auth;
pub mod chats;
pub mod positioning;
pub mod questionnaire;
pub mod tensorzero;
pub mod tools;
pub mod users;

use serde::Serialize;

/// Standard success envelope returned by every endpoint.
#[derive(Serialize, Debug, Clone)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub const fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_envelope() {
        let value = serde_json::to_value(ApiResponse::new(vec![1, 2, 3])).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"][2], 3);
    }
}
