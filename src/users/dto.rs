use serde::{Deserialize, Serialize};

/// Request body for user registration. Fields are optional so that a
/// missing field and an empty one get the same validation answer.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for updating an existing user; password is optional.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Public projection of a user; the password hash is never included.
#[derive(Debug, Serialize)]
pub struct UserListItem {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// Body returned by the mutating endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_item_serialization() {
        let item = UserListItem {
            id: 1,
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
        };

        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("ana@x.com"));
        assert!(json.contains("\"id\":1"));
    }

    #[test]
    fn test_create_request_tolerates_missing_fields() {
        let parsed: CreateUserRequest = serde_json::from_str(r#"{"email":"a@b.com"}"#).unwrap();
        assert!(parsed.name.is_none());
        assert_eq!(parsed.email.as_deref(), Some("a@b.com"));
        assert!(parsed.password.is_none());
    }
}
