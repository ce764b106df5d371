//! Financial contribution rows. The server only stores and lists them;
//! every dashboard aggregation happens client-side over the fetched list.
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, aio::ConnectionManager};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

const FINANCES_INDEX: &str = "finances:index";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentido {
    Entrada,
    Saida,
    Mensal,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finance {
    pub id: String,
    pub user_id: String,
    pub sentido: Sentido,
    pub criado_em: Option<DateTime<Utc>>,
    /// Kept loose on purpose: legacy rows carry either a number or a
    /// formatted string like `"R$ 1.234,56"`. Parsing is the dashboard's job.
    pub valor: serde_json::Value,
}

#[derive(Deserialize)]
pub struct NewFinance {
    pub sentido: Sentido,
    pub valor: serde_json::Value,
}

#[derive(Clone)]
pub struct FinanceStore {
    connection: ConnectionManager,
}

impl FinanceStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    fn key(id: &str) -> String {
        format!("finance:{id}")
    }

    pub async fn save(&self, lancamento: &Finance) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let documento = serde_json::to_string(lancamento)?;

        let score = lancamento
            .criado_em
            .map(|instante| instante.timestamp_millis())
            .unwrap_or(0);

        let _: () = connection.set(Self::key(&lancamento.id), documento).await?;
        let _: () = connection.zadd(FINANCES_INDEX, &lancamento.id, score).await?;

        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Finance>, StoreError> {
        let mut connection = self.connection.clone();

        let ids: Vec<String> = connection.zrevrange(FINANCES_INDEX, 0, -1).await?;

        let mut lancamentos = Vec::with_capacity(ids.len());
        for id in ids {
            let documento: Option<String> = connection.get(Self::key(&id)).await?;

            if let Some(doc) = documento {
                lancamentos.push(serde_json::from_str(&doc)?);
            }
        }

        Ok(lancamentos)
    }
}
