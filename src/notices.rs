//! User-facing notices
//!
//! The back-office is used in Portuguese; the messages a page shows to the
//! operator are defined here, except form validation messages which live on
//! `FormError`. Log lines and other error `Display` impls stay in English.

pub const CARS_LOAD_FAILED: &str = "Erro ao carregar carros";
pub const CAR_LOAD_FAILED: &str = "Erro ao carregar carro";
pub const CAR_NOT_FOUND: &str = "Carro não encontrado";
pub const CAR_CREATED: &str = "Carro adicionado com sucesso";
pub const CAR_UPDATED: &str = "Carro atualizado com sucesso";
pub const CAR_CREATE_FAILED: &str = "Erro ao adicionar carro";
pub const CAR_UPDATE_FAILED: &str = "Erro ao atualizar carro";
pub const CAR_DELETED: &str = "Carro deletado com sucesso";
pub const CAR_DELETE_FAILED: &str = "Erro ao deletar carro";
pub const CAR_MARKED_SOLD: &str = "Carro marcado como vendido";
pub const STATUS_UPDATE_FAILED: &str = "Erro ao atualizar status";

pub const AGENT_SYNCED: &str = "Dados sincronizados com o agente";
pub const AGENT_SYNC_FAILED: &str = "Não foi possível sincronizar com o agente";

pub const UPLOAD_FAILED: &str = "Erro ao fazer upload das fotos";
pub const PHOTO_REMOVED: &str = "Foto removida com sucesso";
pub const PHOTO_REMOVE_FAILED: &str = "Erro ao remover foto";

pub const DASHBOARD_LOAD_FAILED: &str = "Erro ao carregar dados do dashboard";
pub const NO_TOP_CAR: &str = "N/A";

pub const LEADS_LOAD_FAILED: &str = "Erro ao carregar leads";
pub const LEAD_NOT_FOUND: &str = "Lead não encontrado.";
pub const FINANCING_UPDATED: &str = "Status de financiamento atualizado";
pub const FINANCING_UPDATE_FAILED: &str = "Erro ao atualizar status de financiamento";

pub const WEBHOOK_NOT_CONFIGURED: &str =
    "URL do webhook não configurada. Configure WEBHOOK_AGENT_URL nas variáveis de ambiente.";
pub const WEBHOOK_FAILED: &str = "Erro ao sincronizar com o agente";
pub const WEBHOOK_SYNCED: &str = "Sincronizado com sucesso";

pub const SESSION_REQUIRED: &str = "Sessão expirada. Faça login novamente.";
pub const LOGIN_FAILED: &str = "Credenciais inválidas";
pub const LOGGED_OUT: &str = "Logout realizado com sucesso";

pub const INTERNAL_ERROR: &str = "Erro interno do servidor";

pub fn too_many_photos(max: usize) -> String {
    format!("Máximo de {} fotos permitidas", max)
}

pub fn not_an_image(file_name: &str) -> String {
    format!("{} não é uma imagem válida", file_name)
}

pub fn file_too_large(file_name: &str, max_bytes: usize) -> String {
    format!(
        "{} excede o tamanho máximo de {}MB",
        file_name,
        max_bytes / (1024 * 1024)
    )
}

pub fn photos_uploaded(count: usize) -> String {
    format!("{} foto(s) enviada(s) com sucesso", count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameterised_notices() {
        assert_eq!(too_many_photos(10), "Máximo de 10 fotos permitidas");
        assert_eq!(
            file_too_large("big.jpg", 5 * 1024 * 1024),
            "big.jpg excede o tamanho máximo de 5MB"
        );
        assert_eq!(photos_uploaded(2), "2 foto(s) enviada(s) com sucesso");
    }
}
