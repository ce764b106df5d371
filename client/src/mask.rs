//! Display masks applied on every keystroke. Each mask works over the
//! digits of the input and only takes effect once the digit count matches
//! the document shape; until then the bare digits are shown.
use chrono::{DateTime, NaiveDate};
use regex::Regex;

pub fn digits(valor: &str) -> String {
    Regex::new(r"\D").unwrap().replace_all(valor, "").into_owned()
}

fn group(apenas_num: &str, pattern: &str, replacement: &str) -> String {
    Regex::new(pattern)
        .unwrap()
        .replace(apenas_num, replacement)
        .into_owned()
}

pub fn format_field(valor: &str, campo: &str) -> String {
    let apenas_num = digits(valor);

    match campo {
        "cpf" => group(&apenas_num, r"^(\d{3})(\d{3})(\d{3})(\d{2})$", "$1.$2.$3-$4"),
        "cnpj" => group(
            &apenas_num,
            r"^(\d{2})(\d{3})(\d{3})(\d{4})(\d{2})$",
            "$1.$2.$3/$4-$5",
        ),
        "rg" => group(&apenas_num, r"^(\d{2})(\d{3})(\d{3})$", "$1.$2.$3"),
        "telefone" | "celular" => group(&apenas_num, r"^(\d{2})(\d)(\d{4})(\d{4})$", "($1) $2 $3-$4"),
        "cep" => group(&apenas_num, r"^(\d{5})(\d{3})$", "$1-$2"),
        "dataNascimento" | "date" => {
            // The date mask falls back to the raw input, not the digits.
            match Regex::new(r"^(\d{4})(\d{2})(\d{2})$")
                .unwrap()
                .captures(&apenas_num)
            {
                Some(grupos) => format!("{}/{}/{}", &grupos[3], &grupos[2], &grupos[1]),
                None => valor.to_string(),
            }
        }
        _ => valor.to_string(),
    }
}

/// Stored dates arrive as RFC 3339; date inputs want `YYYY-MM-DD`.
/// Unparseable input clears the field.
pub fn to_input_date(data: &str) -> String {
    if let Ok(instante) = DateTime::parse_from_rfc3339(data) {
        return instante.date_naive().format("%Y-%m-%d").to_string();
    }

    if NaiveDate::parse_from_str(data, "%Y-%m-%d").is_ok() {
        return data.to_string();
    }

    String::new()
}

/// Input length cap per field, counted over what the user may type.
pub fn max_length(campo: &str) -> Option<usize> {
    match campo {
        "dataNascimento" => Some(8),
        "cpf" => Some(11),
        "cep" => Some(9),
        "cnpj" => Some(18),
        "rg" => Some(9),
        "telefone" => Some(11),
        "celular" => Some(11),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpf_and_cnpj() {
        assert_eq!(format_field("52998224725", "cpf"), "529.982.247-25");
        assert_eq!(format_field("11444777000161", "cnpj"), "11.444.777/0001-61");
    }

    #[test]
    fn test_phone_and_cep() {
        assert_eq!(format_field("11999999999", "telefone"), "(11) 9 9999-9999");
        assert_eq!(format_field("11988888888", "celular"), "(11) 9 8888-8888");
        assert_eq!(format_field("01310100", "cep"), "01310-100");
    }

    #[test]
    fn test_partial_input_shows_bare_digits() {
        assert_eq!(format_field("(11) 9 99", "telefone"), "11999");
        assert_eq!(format_field("529.98", "cpf"), "52998");
    }

    #[test]
    fn test_date_mask() {
        assert_eq!(format_field("19900504", "dataNascimento"), "04/05/1990");
        assert_eq!(format_field("1990-05", "date"), "1990-05");
    }

    #[test]
    fn test_free_text_passthrough() {
        assert_eq!(format_field("Rua das Flores, 12", "rua"), "Rua das Flores, 12");
        assert_eq!(format_field("", "bio"), "");
    }

    #[test]
    fn test_to_input_date() {
        assert_eq!(to_input_date("1990-05-04T00:00:00+00:00"), "1990-05-04");
        assert_eq!(to_input_date("1990-05-04"), "1990-05-04");
        assert_eq!(to_input_date("ontem"), "");
    }

    #[test]
    fn test_max_length() {
        assert_eq!(max_length("cpf"), Some(11));
        assert_eq!(max_length("bio"), None);
    }
}
