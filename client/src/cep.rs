//! CEP-driven address autofill. A complete CEP (8 digits) is looked up on
//! ViaCEP; every autofilled field is then pushed through the regular
//! autosave endpoint, one call per field.
use serde::Deserialize;
use tracing::warn;

use crate::{
    field::{FieldTransport, UpdatePayload},
    mask::digits,
};

#[derive(Deserialize)]
struct ViaCepResponse {
    logradouro: Option<String>,
    bairro: Option<String>,
    localidade: Option<String>,
    uf: Option<String>,
    #[serde(default)]
    erro: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endereco {
    pub rua: String,
    pub bairro: String,
    pub cidade: String,
    pub estado: String,
    pub pais: String,
}

impl Endereco {
    pub fn campos(&self) -> [(&'static str, &str); 5] {
        [
            ("rua", self.rua.as_str()),
            ("bairro", self.bairro.as_str()),
            ("cidade", self.cidade.as_str()),
            ("estado", self.estado.as_str()),
            ("pais", self.pais.as_str()),
        ]
    }
}

/// Only a complete CEP is worth a lookup.
pub fn clean_cep(cep: &str) -> Option<String> {
    let limpo = digits(cep);

    (limpo.len() == 8).then_some(limpo)
}

pub async fn lookup_cep(client: &reqwest::Client, cep: &str) -> Option<Endereco> {
    let limpo = clean_cep(cep)?;

    let response = client
        .get(format!("https://viacep.com.br/ws/{limpo}/json/"))
        .send()
        .await
        .ok()?;
    let dados: ViaCepResponse = response.json().await.ok()?;

    if dados.erro {
        return None;
    }

    let estado = dados.uf.unwrap_or_default();
    let pais = if estado.is_empty() {
        String::new()
    } else {
        "Brasil".to_string()
    };

    Some(Endereco {
        rua: dados.logradouro.unwrap_or_default(),
        bairro: dados.bairro.unwrap_or_default(),
        cidade: dados.localidade.unwrap_or_default(),
        estado,
        pais,
    })
}

/// Saves each autofilled field; a failed field is logged and skipped so the
/// rest of the address still lands.
pub async fn autofill_address<T: FieldTransport>(transport: &T, user_id: &str, endereco: &Endereco) {
    for (campo, valor) in endereco.campos() {
        let payload = UpdatePayload {
            user_id: user_id.to_string(),
            valor: valor.to_string(),
            campo: campo.to_string(),
            tabela: "Perfil".to_string(),
        };

        if let Err(erro) = transport.save(payload).await {
            warn!("Erro ao salvar endereço ({campo}): {erro}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::field::SaveError;

    use super::*;

    #[test]
    fn test_clean_cep() {
        assert_eq!(clean_cep("01310-100").as_deref(), Some("01310100"));
        assert_eq!(clean_cep("01310"), None);
        assert_eq!(clean_cep(""), None);
    }

    #[derive(Default)]
    struct RecordingTransport {
        saved: Arc<Mutex<Vec<UpdatePayload>>>,
    }

    #[async_trait]
    impl FieldTransport for RecordingTransport {
        async fn save(&self, payload: UpdatePayload) -> Result<(), SaveError> {
            self.saved.lock().unwrap().push(payload);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_autofill_saves_every_field_as_perfil() {
        let transport = RecordingTransport::default();
        let endereco = Endereco {
            rua: "Avenida Paulista".into(),
            bairro: "Bela Vista".into(),
            cidade: "São Paulo".into(),
            estado: "SP".into(),
            pais: "Brasil".into(),
        };

        autofill_address(&transport, "u1", &endereco).await;

        let saved = transport.saved.lock().unwrap();
        assert_eq!(saved.len(), 5);
        assert!(saved.iter().all(|payload| payload.tabela == "Perfil"));
        assert_eq!(saved[0].campo, "rua");
        assert_eq!(saved[0].valor, "Avenida Paulista");
        assert_eq!(saved[4].campo, "pais");
        assert_eq!(saved[4].valor, "Brasil");
    }
}
