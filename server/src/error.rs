use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{store::StoreError, upload::UploadError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Parâmetros inválidos: {0} devem ser strings ou booleanos.")]
    InvalidParams(String),

    #[error("Tabela inválida.")]
    InvalidTable,

    #[error("Identificador de usuário vazio.")]
    EmptyUserId,

    #[error("O campo \"{campo}\" não é permitido na tabela \"{tabela}\".")]
    FieldNotAllowed { campo: String, tabela: &'static str },

    #[error("Valor \"{0}\" não é um número válido.")]
    NumberExpected(String),

    #[error("Valor \"{0}\" não é um booleano válido.")]
    BooleanExpected(String),

    #[error("Valor \"{0}\" não é uma data válida.")]
    DateExpected(String),

    // Static defect: a whitelisted field is missing from the type table.
    #[error("Tipo esperado não definido para o campo \"{campo}\" na tabela \"{tabela}\".")]
    MissingFieldType { campo: String, tabela: &'static str },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Não autenticado")]
    Unauthenticated,

    #[error("Post não encontrado")]
    PostNotFound,

    #[error("Título e conteúdo são obrigatórios")]
    MissingTitleOrContent,

    #[error("Malformed payload")]
    MalformedPayload,

    #[error("No valid image uploaded")]
    NoValidImage,

    #[error("Unsupported file type")]
    UnsupportedMedia,

    #[error("Image exceeds the 5 MB limit")]
    ImageTooLarge,

    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidParams(_)
            | AppError::InvalidTable
            | AppError::EmptyUserId
            | AppError::FieldNotAllowed { .. }
            | AppError::NumberExpected(_)
            | AppError::BooleanExpected(_)
            | AppError::DateExpected(_)
            | AppError::MissingTitleOrContent
            | AppError::NoValidImage
            | AppError::MalformedPayload => StatusCode::BAD_REQUEST,

            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::PostNotFound => StatusCode::NOT_FOUND,
            AppError::UnsupportedMedia => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::ImageTooLarge => StatusCode::PAYLOAD_TOO_LARGE,

            AppError::MissingFieldType { .. } | AppError::Store(_) | AppError::Upload(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!("Erro ao processar requisição: {self}");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
