use serde::{Deserialize, Serialize};

/// Signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    /// Display name
    pub name: String,
    pub email: String,
    /// Avatar URL
    pub picture: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_json_shape() {
        let json = r#"{"id":"1","name":"Ada","email":"a@x.com","picture":"p.png"}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.picture, "p.png");
    }
}
