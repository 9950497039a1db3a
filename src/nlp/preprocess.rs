use crate::error::{Nl2SqlError, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Normalize raw user text before analysis.
///
/// Drops inverted punctuation, unifies typographic quotes, collapses
/// whitespace and strips trailing sentence punctuation.
pub fn preprocess(text: &str) -> Result<String> {
    let replaced: String = text
        .chars()
        .filter(|c| !matches!(c, '¿' | '¡'))
        .map(|c| match c {
            '“' | '”' | '«' | '»' => '"',
            '‘' | '’' => '\'',
            other => other,
        })
        .collect();

    let collapsed = WHITESPACE.replace_all(replaced.trim(), " ");
    let cleaned = collapsed
        .trim_end_matches(|c: char| matches!(c, '.' | '?' | '!' | ';') || c.is_whitespace())
        .to_string();

    if cleaned.is_empty() {
        return Err(Nl2SqlError::EmptyInput);
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_question_marks() {
        let out = preprocess("¿Cuál es el promedio de edad de los usuarios?").unwrap();
        assert_eq!(out, "Cuál es el promedio de edad de los usuarios");
    }

    #[test]
    fn test_collapses_whitespace_and_quotes() {
        let out = preprocess("  Mostrar   usuarios con nombre “Ana”  ").unwrap();
        assert_eq!(out, "Mostrar usuarios con nombre \"Ana\"");
    }

    #[test]
    fn test_keeps_email_dots() {
        let out = preprocess("Actualizar el correo a ana@mail.com.").unwrap();
        assert_eq!(out, "Actualizar el correo a ana@mail.com");
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(matches!(preprocess("  ¿? "), Err(Nl2SqlError::EmptyInput)));
    }
}
