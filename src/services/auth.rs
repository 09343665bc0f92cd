// src/services/auth.rs

use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};

use crate::models::auth::{Claims, StaffSession};

/// Resultado explícito da checagem do token: o chamador precisa tratar a expiração.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCheck {
    Valid(StaffSession),
    Expired,
    Invalid,
}

// Os tokens são emitidos pelo provedor de autenticação; aqui só validamos.
#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
}

impl AuthService {
    pub fn new(jwt_secret: String) -> Self {
        Self { jwt_secret }
    }

    pub fn check_token(&self, token: &str) -> SessionCheck {
        let validation = Validation::default();
        let result = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        );

        match result {
            Ok(token_data) => SessionCheck::Valid(token_data.claims.into()),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => SessionCheck::Expired,
            Err(e) => {
                tracing::debug!("Token rejeitado: {}", e);
                SessionCheck::Invalid
            }
        }
    }
}
