//! # Autosave field
//!
//! One instance per editable field. Keystrokes update the local value
//! through the field's display mask right away; the save itself waits for
//! an 800 ms quiet window. The response lands in a field-scoped message
//! that the next save attempt replaces.
//!
//! In-flight saves are never cancelled, only pending ones. Responses for
//! the same field may therefore arrive out of order; the last response to
//! arrive owns the message, never the value.
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::time::sleep;

use crate::{
    debounce::Debouncer,
    mask::{format_field, max_length, to_input_date},
};

pub const QUIET_WINDOW: Duration = Duration::from_millis(800);

const SAVING_LINGER: Duration = Duration::from_millis(300);

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UpdatePayload {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub valor: String,
    pub campo: String,
    pub tabela: String,
}

#[derive(Error, Debug)]
pub enum SaveError {
    /// Reason reported by the server's error channel.
    #[error("{0}")]
    Server(String),

    /// The request never completed.
    #[error("Erro de rede ao salvar.")]
    Network,
}

#[async_trait]
pub trait FieldTransport: Send + Sync + 'static {
    async fn save(&self, payload: UpdatePayload) -> Result<(), SaveError>;
}

/// POSTs payloads to `/api/updateBio`.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{base_url}/api/updateBio"),
        }
    }
}

#[async_trait]
impl FieldTransport for HttpTransport {
    async fn save(&self, payload: UpdatePayload) -> Result<(), SaveError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|_| SaveError::Network)?;

        if response.status().is_success() {
            return Ok(());
        }

        let corpo: serde_json::Value = response.json().await.map_err(|_| SaveError::Network)?;
        let motivo = corpo
            .get("error")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("Erro desconhecido")
            .to_string();

        Err(SaveError::Server(motivo))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Textarea,
    Number,
    Email,
    Password,
    Select,
    Date,
}

#[derive(Default)]
struct FieldState {
    valor: String,
    message: Option<String>,
    message_rev: u64,
    saving: bool,
}

pub struct AutosaveField<T: FieldTransport> {
    user_id: String,
    label: String,
    campo: String,
    tabela: String,
    tipo: InputKind,
    transport: Arc<T>,
    state: Arc<Mutex<FieldState>>,
    debouncer: Debouncer,
}

impl<T: FieldTransport> AutosaveField<T> {
    pub fn new(
        transport: Arc<T>,
        user_id: &str,
        valor_inicial: &str,
        label: &str,
        campo: &str,
        tabela: &str,
        tipo: InputKind,
    ) -> Self {
        let state = FieldState {
            valor: initial_value(valor_inicial, tipo),
            ..FieldState::default()
        };

        Self {
            user_id: user_id.to_string(),
            label: label.to_string(),
            campo: campo.to_string(),
            tabela: tabela.to_string(),
            tipo,
            transport,
            state: Arc::new(Mutex::new(state)),
            debouncer: Debouncer::new(QUIET_WINDOW),
        }
    }

    pub fn value(&self) -> String {
        self.state.lock().unwrap().valor.clone()
    }

    /// Current message plus its revision; the revision bumps on every set so
    /// an identical message still re-triggers the entrance animation.
    pub fn message(&self) -> Option<(String, u64)> {
        let state = self.state.lock().unwrap();

        state
            .message
            .as_ref()
            .map(|texto| (texto.clone(), state.message_rev))
    }

    pub fn is_saving(&self) -> bool {
        self.state.lock().unwrap().saving
    }

    /// Parent reload pushed a fresh value; unsaved local edits lose.
    pub fn sync_initial(&self, valor_inicial: &str) {
        self.state.lock().unwrap().valor = initial_value(valor_inicial, self.tipo);
    }

    /// One keystroke: mask, immediate local update, debounced save.
    pub fn input(&mut self, texto: &str) {
        let texto: String = match max_length(&self.campo) {
            Some(max) => texto.chars().take(max).collect(),
            None => texto.to_string(),
        };

        let formatado = if self.tipo == InputKind::Date {
            texto
        } else {
            format_field(&texto, &self.campo)
        };

        self.state.lock().unwrap().valor = formatado.clone();

        let payload = UpdatePayload {
            user_id: self.user_id.clone(),
            valor: formatado,
            campo: self.campo.clone(),
            tabela: self.tabela.clone(),
        };

        self.debouncer.call(save_task(
            self.transport.clone(),
            self.state.clone(),
            self.label.clone(),
            payload,
        ));
    }
}

fn initial_value(valor_inicial: &str, tipo: InputKind) -> String {
    if tipo == InputKind::Date {
        to_input_date(valor_inicial)
    } else {
        valor_inicial.to_string()
    }
}

async fn save_task<T: FieldTransport>(
    transport: Arc<T>,
    state: Arc<Mutex<FieldState>>,
    label: String,
    payload: UpdatePayload,
) {
    state.lock().unwrap().saving = true;

    let resultado = transport.save(payload).await;

    let texto = match resultado {
        Ok(()) => format!("{label} atualizado."),
        Err(SaveError::Server(motivo)) => format!("Erro: {motivo}"),
        Err(SaveError::Network) => SaveError::Network.to_string(),
    };

    {
        let mut state = state.lock().unwrap();
        state.message = Some(texto);
        state.message_rev += 1;
    }

    sleep(SAVING_LINGER).await;
    state.lock().unwrap().saving = false;
}

#[cfg(test)]
mod tests {
    use tokio::time::advance;

    use super::*;

    #[derive(Default)]
    struct RecordingTransport {
        saved: Mutex<Vec<UpdatePayload>>,
        fail_with: Mutex<Option<SaveError>>,
    }

    #[async_trait]
    impl FieldTransport for RecordingTransport {
        async fn save(&self, payload: UpdatePayload) -> Result<(), SaveError> {
            self.saved.lock().unwrap().push(payload);

            match self.fail_with.lock().unwrap().take() {
                Some(erro) => Err(erro),
                None => Ok(()),
            }
        }
    }

    async fn drain() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_typing_saves_once_with_last_value() {
        let transport = Arc::new(RecordingTransport::default());
        let mut campo = AutosaveField::new(
            transport.clone(),
            "u1",
            "",
            "Telefone",
            "telefone",
            "Pessoal",
            InputKind::Text,
        );

        for digitos in ["1", "11", "119", "1199999999", "11999999999"] {
            campo.input(digitos);
            advance(Duration::from_millis(100)).await;
        }

        assert_eq!(campo.value(), "(11) 9 9999-9999");
        assert!(transport.saved.lock().unwrap().is_empty());

        advance(Duration::from_millis(900)).await;
        drain().await;

        let saved = transport.saved.lock().unwrap().clone();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].valor, "(11) 9 9999-9999");
        assert_eq!(saved[0].campo, "telefone");
        assert_eq!(saved[0].tabela, "Pessoal");

        advance(Duration::from_millis(400)).await;
        drain().await;

        let (mensagem, rev) = campo.message().unwrap();
        assert_eq!(mensagem, "Telefone atualizado.");
        assert_eq!(rev, 1);
        assert!(!campo.is_saving());
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_is_surfaced_inline() {
        let transport = Arc::new(RecordingTransport::default());
        *transport.fail_with.lock().unwrap() = Some(SaveError::Server("Tabela inválida.".into()));

        let mut campo = AutosaveField::new(
            transport.clone(),
            "u1",
            "",
            "Bio",
            "bio",
            "User",
            InputKind::Textarea,
        );

        campo.input("olá");
        advance(Duration::from_millis(1200)).await;
        drain().await;

        let (mensagem, _) = campo.message().unwrap();
        assert_eq!(mensagem, "Erro: Tabela inválida.");

        // Value is never rolled back on failure.
        assert_eq!(campo.value(), "olá");
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_message() {
        let transport = Arc::new(RecordingTransport::default());
        *transport.fail_with.lock().unwrap() = Some(SaveError::Network);

        let mut campo = AutosaveField::new(
            transport.clone(),
            "u1",
            "",
            "Nome",
            "name",
            "User",
            InputKind::Text,
        );

        campo.input("Maria");
        advance(Duration::from_millis(1200)).await;
        drain().await;

        let (mensagem, _) = campo.message().unwrap();
        assert_eq!(mensagem, "Erro de rede ao salvar.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_refresh_overwrites_local_edit() {
        let transport = Arc::new(RecordingTransport::default());
        let mut campo = AutosaveField::new(
            transport.clone(),
            "u1",
            "Maria",
            "Nome",
            "name",
            "User",
            InputKind::Text,
        );

        campo.input("Mar");
        campo.sync_initial("Maria Silva");

        assert_eq!(campo.value(), "Maria Silva");
    }

    #[tokio::test(start_paused = true)]
    async fn test_date_initial_value_is_input_native() {
        let transport = Arc::new(RecordingTransport::default());
        let campo = AutosaveField::new(
            transport,
            "u1",
            "1990-05-04T00:00:00+00:00",
            "Nascimento",
            "dataNascimento",
            "User",
            InputKind::Date,
        );

        assert_eq!(campo.value(), "1990-05-04");
    }
}
