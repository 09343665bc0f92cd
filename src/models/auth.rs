// src/models/auth.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Papel do funcionário dentro do hotel (vem do provedor de autenticação)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Staff,
    Manager,
    Admin,
    SuperAdmin,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do funcionário)
    pub role: StaffRole,
    #[serde(default)]
    pub tenants: Vec<Uuid>, // Hotéis aos quais o funcionário pertence
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

/// Sessão já validada, disponível para os handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffSession {
    pub id: Uuid,
    pub role: StaffRole,
    pub tenants: Vec<Uuid>,
}

impl StaffSession {
    pub fn can_access_tenant(&self, tenant_id: Uuid) -> bool {
        self.role == StaffRole::SuperAdmin || self.tenants.contains(&tenant_id)
    }
}

impl From<Claims> for StaffSession {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
            tenants: claims.tenants,
        }
    }
}
