//! Contribution dashboard math. The backend hands over the raw list; every
//! widget sums and filters here.
use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentido {
    Entrada,
    Saida,
    Mensal,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finance {
    pub id: String,
    pub user_id: String,
    pub sentido: Sentido,
    pub criado_em: Option<DateTime<Utc>>,
    pub valor: Value,
}

pub async fn fetch_finances(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<Vec<Finance>, reqwest::Error> {
    client
        .get(format!("{base_url}/api/finances"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

/// Legacy rows carry `"R$ 1.234,56"`-style strings next to plain numbers;
/// anything unparseable counts as zero.
pub fn parse_amount(valor: &Value) -> f64 {
    match valor {
        Value::Number(numero) => numero.as_f64().unwrap_or(0.0),
        Value::String(texto) => {
            let limpo: String = texto
                .replace(char::is_whitespace, "")
                .replace('.', "")
                .replacen(',', ".", 1)
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();

            limpo.parse().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

/// Net balance for one user: ENTRADA adds, SAIDA subtracts, MENSAL is
/// tracked separately and ignored here.
pub fn total_for_user(lancamentos: &[Finance], user_id: &str) -> f64 {
    lancamentos
        .iter()
        .filter(|item| item.user_id == user_id)
        .fold(0.0, |acumulado, item| match item.sentido {
            Sentido::Entrada => acumulado + parse_amount(&item.valor),
            Sentido::Saida => acumulado - parse_amount(&item.valor),
            Sentido::Mensal => acumulado,
        })
}

pub fn entries_today(lancamentos: &[Finance], hoje: DateTime<Utc>) -> f64 {
    lancamentos
        .iter()
        .filter(|item| item.sentido == Sentido::Entrada)
        .filter(|item| {
            item.criado_em
                .is_some_and(|data| data.date_naive() == hoje.date_naive())
        })
        .map(|item| parse_amount(&item.valor))
        .sum()
}

pub fn monthly_total(lancamentos: &[Finance], hoje: DateTime<Utc>) -> f64 {
    lancamentos
        .iter()
        .filter(|item| item.sentido == Sentido::Mensal)
        .filter(|item| {
            item.criado_em
                .is_some_and(|data| data.year() == hoje.year() && data.month() == hoje.month())
        })
        .map(|item| parse_amount(&item.valor))
        .sum()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn lancamento(user: &str, sentido: Sentido, valor: Value, criado_em: &str) -> Finance {
        Finance {
            id: "f1".into(),
            user_id: user.into(),
            sentido,
            criado_em: criado_em.parse().ok(),
            valor,
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(&json!(12.5)), 12.5);
        assert_eq!(parse_amount(&json!("R$ 1.234,56")), 1234.56);
        assert_eq!(parse_amount(&json!("1234.56")), 1234.56);
        assert_eq!(parse_amount(&json!("abc")), 0.0);
        assert_eq!(parse_amount(&json!(null)), 0.0);
    }

    #[test]
    fn test_total_for_user_nets_entries_against_exits() {
        let lancamentos = vec![
            lancamento("u1", Sentido::Entrada, json!(100), "2026-08-07T10:00:00Z"),
            lancamento("u1", Sentido::Saida, json!("30"), "2026-08-07T11:00:00Z"),
            lancamento("u1", Sentido::Mensal, json!(999), "2026-08-07T11:00:00Z"),
            lancamento("u2", Sentido::Entrada, json!(500), "2026-08-07T12:00:00Z"),
        ];

        assert_eq!(total_for_user(&lancamentos, "u1"), 70.0);
    }

    #[test]
    fn test_entries_today_ignores_other_days() {
        let hoje: DateTime<Utc> = "2026-08-07T15:00:00Z".parse().unwrap();
        let lancamentos = vec![
            lancamento("u1", Sentido::Entrada, json!(10), "2026-08-07T01:00:00Z"),
            lancamento("u1", Sentido::Entrada, json!(20), "2026-08-06T23:00:00Z"),
            lancamento("u1", Sentido::Saida, json!(5), "2026-08-07T02:00:00Z"),
        ];

        assert_eq!(entries_today(&lancamentos, hoje), 10.0);
    }

    #[test]
    fn test_monthly_total_matches_month_and_year() {
        let hoje: DateTime<Utc> = "2026-08-07T15:00:00Z".parse().unwrap();
        let lancamentos = vec![
            lancamento("u1", Sentido::Mensal, json!(50), "2026-08-01T00:00:00Z"),
            lancamento("u1", Sentido::Mensal, json!(50), "2026-07-31T00:00:00Z"),
            lancamento("u1", Sentido::Mensal, json!(50), "2025-08-01T00:00:00Z"),
        ];

        assert_eq!(monthly_total(&lancamentos, hoje), 50.0);
    }
}
