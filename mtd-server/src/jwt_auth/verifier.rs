use crate::{
    config::AppConfigAdminApiJwtAuth,
    jwt_auth::{JwtAuthError, JwtClaims},
};

use jsonwebtoken::{Algorithm, DecodingKey, TokenData, Validation};

/// 共有シークレット (HS256) ベースの検証。
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    allowed_subjects: Vec<String>,
}

impl JwtVerifier {
    pub fn new(config: &AppConfigAdminApiJwtAuth) -> JwtVerifier {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.audience.clone()]);

        JwtVerifier {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            allowed_subjects: config.allowed_subjects.clone(),
        }
    }

    pub fn verify(&self, jwt_token: &str) -> Result<JwtClaims, JwtAuthError> {
        let token_data: TokenData<JwtClaims> = jsonwebtoken::decode(jwt_token, &self.decoding_key, &self.validation)?;
        let claims = token_data.claims;

        if self.allowed_subjects.contains(&claims.sub) {
            Ok(claims)
        } else {
            Err(JwtAuthError::SubjectNotAllowed(claims.sub))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jsonwebtoken::{EncodingKey, Header};
    use time::OffsetDateTime;

    fn auth_config() -> AppConfigAdminApiJwtAuth {
        AppConfigAdminApiJwtAuth {
            jwt_header_name: "authorization".to_string(),
            secret: "test-secret".to_string(),
            audience: "mtd-console".to_string(),
            allowed_subjects: vec!["admin@example.com".to_string()],
        }
    }

    fn issue_token(secret: &str, sub: &str, aud: &str) -> String {
        let claims = JwtClaims {
            sub: sub.to_string(),
            aud: aud.to_string(),
            exp: (OffsetDateTime::now_utc().unix_timestamp() + 3600) as usize,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn accepts_allowed_subject() {
        let verifier = JwtVerifier::new(&auth_config());
        let token = issue_token("test-secret", "admin@example.com", "mtd-console");
        assert!(verifier.verify(&token).is_ok());
    }

    #[test]
    fn rejects_unknown_subject() {
        let verifier = JwtVerifier::new(&auth_config());
        let token = issue_token("test-secret", "intruder@example.com", "mtd-console");
        assert!(matches!(
            verifier.verify(&token),
            Err(JwtAuthError::SubjectNotAllowed(_))
        ));
    }

    #[test]
    fn rejects_wrong_secret() {
        let verifier = JwtVerifier::new(&auth_config());
        let token = issue_token("other-secret", "admin@example.com", "mtd-console");
        assert!(matches!(verifier.verify(&token), Err(JwtAuthError::JwtError(_))));
    }
}
