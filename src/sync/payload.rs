//! Agent sync wire types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::records::{Car, CarStatus};

/// Event kind carried in `tipo`
pub const STOCK_UPDATE: &str = "atualizacao_estoque";

/// What happened to the car
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncAction {
    #[serde(rename = "criado")]
    Created,
    #[serde(rename = "atualizado")]
    Updated,
}

/// Car summary sent to the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarSnapshot {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    pub status: CarStatus,
    #[serde(rename = "preco")]
    pub price: f64,
    #[serde(rename = "marca")]
    pub brand: String,
}

impl From<&Car> for CarSnapshot {
    fn from(car: &Car) -> Self {
        Self {
            id: car.id,
            name: car.name.clone(),
            status: car.status,
            price: car.price,
            brand: car.brand.clone(),
        }
    }
}

/// `{tipo, acao, carro}` body posted after a car is saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPayload {
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "acao")]
    pub action: SyncAction,
    #[serde(rename = "carro")]
    pub car: CarSnapshot,
}

impl SyncPayload {
    pub fn stock_update(action: SyncAction, car: &Car) -> Self {
        Self {
            kind: STOCK_UPDATE.to_string(),
            action,
            car: CarSnapshot::from(car),
        }
    }
}

/// Reply of the Sync Function
///
/// Absent fields are omitted on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncReply {
    pub fn synced(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            error: None,
        }
    }

    /// Failure reported with a user-facing message
    pub fn refused(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }

    /// Failure reported with a raw error description
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Whatever explains a failure, message first
    pub fn reason(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn car() -> Car {
        Car {
            id: 7,
            name: "Onix LTZ".to_string(),
            brand: "Chevrolet".to_string(),
            vehicle_type: "hatch".to_string(),
            transmission: "automático".to_string(),
            year: 2023,
            price: 89990.0,
            status: CarStatus::Available,
            photos: vec![],
            interior_photos: vec![],
            visits: 3,
            inquiries: 1,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_payload_wire_shape() {
        let payload = SyncPayload::stock_update(SyncAction::Created, &car());
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(
            value,
            json!({
                "tipo": "atualizacao_estoque",
                "acao": "criado",
                "carro": {
                    "id": 7,
                    "nome": "Onix LTZ",
                    "status": "disponível",
                    "preco": 89990.0,
                    "marca": "Chevrolet"
                }
            })
        );
    }

    #[test]
    fn test_reply_omits_absent_fields() {
        let reply = SyncReply::refused("Erro ao sincronizar com o agente");
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(
            value,
            json!({"success": false, "message": "Erro ao sincronizar com o agente"})
        );

        let parsed: SyncReply = serde_json::from_value(json!({"success": false, "error": "boom"})).unwrap();
        assert_eq!(parsed.reason(), Some("boom"));
    }
}
