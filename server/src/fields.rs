//! # Generic field updates
//!
//! The profile screens edit one field at a time. Every edit funnels through
//! [`update_field`], which checks the target against a static whitelist,
//! coerces the raw text to the type the field expects, and writes exactly
//! that one field — creating the record on first write, updating it after.
//!
//! The whitelist and the type table are plain `match` data. Any field not
//! listed is rejected before the store is touched; a whitelisted field with
//! no type entry is a programming mistake and aborts with its own error.
use chrono::{DateTime, NaiveTime, Utc};

use crate::{error::AppError, store::FieldStore};

/// Placeholder persisted instead of an empty string, so a field the user
/// explicitly cleared can be told apart from one that was never set.
pub const SENTINEL: &str = "Vazio";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    User,
    Perfil,
    Pessoal,
}

impl RecordKind {
    pub fn from_name(nome: &str) -> Option<Self> {
        match nome {
            "User" => Some(RecordKind::User),
            "Perfil" => Some(RecordKind::Perfil),
            "Pessoal" => Some(RecordKind::Pessoal),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RecordKind::User => "User",
            RecordKind::Perfil => "Perfil",
            RecordKind::Pessoal => "Pessoal",
        }
    }

    /// `User` records are keyed by their own id, the others by the foreign
    /// `userId`.
    pub fn key_field(self) -> &'static str {
        match self {
            RecordKind::User => "id",
            RecordKind::Perfil | RecordKind::Pessoal => "userId",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Num,
    Bool,
    Date,
}

pub fn allowed_fields(tabela: RecordKind) -> &'static [&'static str] {
    match tabela {
        RecordKind::User => &[
            "name",
            "email",
            "emailVerified",
            "image",
            "bio",
            "banner",
            "uncao",
            "uncaoVerified",
            "dataNascimento",
            "genero",
            "cpf",
            "rg",
        ],
        RecordKind::Perfil => &[
            "rua",
            "numero",
            "referencia",
            "bairro",
            "cidade",
            "estado",
            "pais",
            "cep",
        ],
        RecordKind::Pessoal => &["telefone", "celular"],
    }
}

pub fn expected_type(tabela: RecordKind, campo: &str) -> Option<FieldType> {
    let tipo = match (tabela, campo) {
        (RecordKind::User, "emailVerified" | "dataNascimento") => FieldType::Date,
        (RecordKind::User, "uncaoVerified") => FieldType::Bool,
        (
            RecordKind::User,
            "name" | "email" | "image" | "bio" | "banner" | "uncao" | "genero" | "cpf" | "rg",
        ) => FieldType::Str,
        (
            RecordKind::Perfil,
            "rua" | "numero" | "referencia" | "bairro" | "cidade" | "estado" | "pais" | "cep",
        ) => FieldType::Str,
        (RecordKind::Pessoal, "telefone" | "celular") => FieldType::Str,
        _ => return None,
    };

    Some(tipo)
}

/// Value as it arrives from the wire: always text, except booleans which the
/// transport may pass through natively.
#[derive(Clone, Debug)]
pub enum RawValue {
    Text(String),
    Flag(bool),
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Str(String),
    Num(f64),
    Bool(bool),
    Date(DateTime<Utc>),
}

impl FieldValue {
    /// Canonical text encoding persisted by the store.
    pub fn encode(self) -> String {
        match self {
            FieldValue::Str(texto) => texto,
            FieldValue::Num(numero) => format!("{numero}"),
            FieldValue::Bool(flag) => flag.to_string(),
            FieldValue::Date(data) => data.to_rfc3339(),
        }
    }
}

pub fn coerce(valor: RawValue, tipo: FieldType) -> Result<FieldValue, AppError> {
    match (tipo, valor) {
        (FieldType::Str, RawValue::Text(texto)) => {
            if texto.is_empty() {
                Ok(FieldValue::Str(SENTINEL.to_string()))
            } else {
                Ok(FieldValue::Str(texto))
            }
        }

        (FieldType::Num, RawValue::Text(texto)) => texto
            .parse::<f64>()
            .map(FieldValue::Num)
            .map_err(|_| AppError::NumberExpected(texto)),

        (FieldType::Bool, RawValue::Flag(flag)) => Ok(FieldValue::Bool(flag)),
        (FieldType::Bool, RawValue::Text(texto)) => match texto.as_str() {
            "true" => Ok(FieldValue::Bool(true)),
            "false" => Ok(FieldValue::Bool(false)),
            _ => Err(AppError::BooleanExpected(texto)),
        },

        (FieldType::Date, RawValue::Text(texto)) => parse_date(&texto)
            .map(FieldValue::Date)
            .ok_or(AppError::DateExpected(texto)),

        // String fields take whatever the transport sent, text-encoded.
        (FieldType::Str, RawValue::Flag(flag)) => Ok(FieldValue::Str(flag.to_string())),
        (FieldType::Num, RawValue::Flag(flag)) => Err(AppError::NumberExpected(flag.to_string())),
        (FieldType::Date, RawValue::Flag(flag)) => Err(AppError::DateExpected(flag.to_string())),
    }
}

fn parse_date(texto: &str) -> Option<DateTime<Utc>> {
    if let Ok(instante) = DateTime::parse_from_rfc3339(texto) {
        return Some(instante.with_timezone(&Utc));
    }

    // Date inputs submit the input-native `YYYY-MM-DD` shape.
    chrono::NaiveDate::parse_from_str(texto, "%Y-%m-%d")
        .ok()
        .map(|data| data.and_time(NaiveTime::MIN).and_utc())
}

/// Outcome of a single accepted field write.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldUpdate {
    pub campo: String,
    pub valor: String,
    pub created: bool,
}

/// Validates, coerces and persists one field of one record.
///
/// Exactly one read and at most one write reach the store. The absent-record
/// path creates the record with only its key field and the target field; the
/// narrow read-then-write race this leaves open is accepted for
/// single-editor-per-record usage.
pub async fn update_field<S: FieldStore>(
    store: &S,
    tabela: RecordKind,
    campo: &str,
    valor: RawValue,
    user_id: &str,
) -> Result<FieldUpdate, AppError> {
    if user_id.is_empty() {
        return Err(AppError::EmptyUserId);
    }

    if !allowed_fields(tabela).contains(&campo) {
        return Err(AppError::FieldNotAllowed {
            campo: campo.to_string(),
            tabela: tabela.name(),
        });
    }

    let Some(tipo) = expected_type(tabela, campo) else {
        return Err(AppError::MissingFieldType {
            campo: campo.to_string(),
            tabela: tabela.name(),
        });
    };

    let persistido = coerce(valor, tipo)?.encode();

    if store.exists(tabela, user_id).await? {
        store.update(tabela, user_id, campo, &persistido).await?;

        Ok(FieldUpdate {
            campo: campo.to_string(),
            valor: persistido,
            created: false,
        })
    } else {
        store.create(tabela, user_id, campo, &persistido).await?;

        Ok(FieldUpdate {
            campo: campo.to_string(),
            valor: persistido,
            created: true,
        })
    }
}
