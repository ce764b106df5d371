//! # Record store
//!
//! Subject records live in Redis hashes, one hash per user and record kind:
//!
//! - `user:<id>` — account fields (name, email, bio, banner, ...)
//! - `perfil:<id>` — address fields, keyed by the foreign `userId`
//! - `pessoal:<id>` — phone fields, keyed by the foreign `userId`
//!
//! Every value is stored in its canonical text encoding (see
//! [`crate::fields::FieldValue`]). A record is created lazily by the first
//! accepted field write and holds only its key field plus whatever fields
//! have been written since.
use std::collections::HashMap;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use thiserror::Error;

use crate::fields::RecordKind;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Erro interno ao atualizar ou criar valor no banco de dados.")]
    Redis(#[from] redis::RedisError),

    #[error("Registro corrompido no banco de dados.")]
    Corrupt(#[from] serde_json::Error),
}

#[async_trait]
pub trait FieldStore: Send + Sync {
    async fn exists(&self, kind: RecordKind, user_id: &str) -> Result<bool, StoreError>;

    /// Creates the record holding only its key field and the target field.
    async fn create(
        &self,
        kind: RecordKind,
        user_id: &str,
        campo: &str,
        valor: &str,
    ) -> Result<(), StoreError>;

    /// Overwrites the target field on an existing record.
    async fn update(
        &self,
        kind: RecordKind,
        user_id: &str,
        campo: &str,
        valor: &str,
    ) -> Result<(), StoreError>;

    async fn fetch(
        &self,
        kind: RecordKind,
        user_id: &str,
    ) -> Result<Option<HashMap<String, String>>, StoreError>;
}

fn record_key(kind: RecordKind, user_id: &str) -> String {
    let prefix = match kind {
        RecordKind::User => "user",
        RecordKind::Perfil => "perfil",
        RecordKind::Pessoal => "pessoal",
    };

    format!("{prefix}:{user_id}")
}

#[derive(Clone)]
pub struct RedisFieldStore {
    connection: ConnectionManager,
}

impl RedisFieldStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl FieldStore for RedisFieldStore {
    async fn exists(&self, kind: RecordKind, user_id: &str) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();

        let existe: bool = connection.exists(record_key(kind, user_id)).await?;
        Ok(existe)
    }

    async fn create(
        &self,
        kind: RecordKind,
        user_id: &str,
        campo: &str,
        valor: &str,
    ) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();

        let _: () = connection
            .hset_multiple(
                record_key(kind, user_id),
                &[(kind.key_field(), user_id), (campo, valor)],
            )
            .await?;

        Ok(())
    }

    async fn update(
        &self,
        kind: RecordKind,
        user_id: &str,
        campo: &str,
        valor: &str,
    ) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();

        let _: () = connection
            .hset(record_key(kind, user_id), campo, valor)
            .await?;

        Ok(())
    }

    async fn fetch(
        &self,
        kind: RecordKind,
        user_id: &str,
    ) -> Result<Option<HashMap<String, String>>, StoreError> {
        let mut connection = self.connection.clone();

        let campos: HashMap<String, String> =
            connection.hgetall(record_key(kind, user_id)).await?;

        Ok((!campos.is_empty()).then_some(campos))
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::sync::Mutex;

    use super::*;

    /// Hash-map stand-in for the Redis adapter, used by unit tests.
    #[derive(Default)]
    pub struct MemoryFieldStore {
        records: Mutex<HashMap<(RecordKind, String), HashMap<String, String>>>,
    }

    impl MemoryFieldStore {
        pub fn record_count(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl FieldStore for MemoryFieldStore {
        async fn exists(&self, kind: RecordKind, user_id: &str) -> Result<bool, StoreError> {
            let records = self.records.lock().unwrap();

            Ok(records.contains_key(&(kind, user_id.to_string())))
        }

        async fn create(
            &self,
            kind: RecordKind,
            user_id: &str,
            campo: &str,
            valor: &str,
        ) -> Result<(), StoreError> {
            let mut records = self.records.lock().unwrap();

            let mut campos = HashMap::new();
            campos.insert(kind.key_field().to_string(), user_id.to_string());
            campos.insert(campo.to_string(), valor.to_string());

            records.insert((kind, user_id.to_string()), campos);
            Ok(())
        }

        async fn update(
            &self,
            kind: RecordKind,
            user_id: &str,
            campo: &str,
            valor: &str,
        ) -> Result<(), StoreError> {
            let mut records = self.records.lock().unwrap();

            records
                .entry((kind, user_id.to_string()))
                .or_default()
                .insert(campo.to_string(), valor.to_string());

            Ok(())
        }

        async fn fetch(
            &self,
            kind: RecordKind,
            user_id: &str,
        ) -> Result<Option<HashMap<String, String>>, StoreError> {
            let records = self.records.lock().unwrap();

            Ok(records.get(&(kind, user_id.to_string())).cloned())
        }
    }
}
