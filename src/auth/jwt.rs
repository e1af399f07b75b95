use crate::models::Claims;
use jsonwebtoken::{DecodingKey, Validation, decode};

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
pub(crate) fn issue_token(
    user_id: u64,
    role: u8,
    employee_id: Option<u64>,
    token_type: crate::models::TokenType,
    secret: &str,
    ttl_secs: i64,
) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let claims = Claims {
        user_id,
        sub: format!("user{user_id}"),
        role,
        exp: (chrono::Utc::now().timestamp() + ttl_secs) as usize,
        jti: uuid::Uuid::new_v4().to_string(),
        token_type,
        employee_id,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenType;

    #[test]
    fn verifies_own_tokens() {
        let token = issue_token(7, 2, Some(70), TokenType::Access, "s3cret", 600);
        let claims = verify_token(&token, "s3cret").unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.role, 2);
        assert_eq!(claims.employee_id, Some(70));
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn rejects_wrong_secret_and_expired() {
        let token = issue_token(7, 2, None, TokenType::Access, "s3cret", 600);
        assert!(verify_token(&token, "other").is_err());

        let expired = issue_token(7, 2, None, TokenType::Access, "s3cret", -3600);
        assert!(verify_token(&expired, "s3cret").is_err());
    }
}
