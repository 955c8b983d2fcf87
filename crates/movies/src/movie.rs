use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de};

use reelpipe_core::{DomainError, DomainResult};

/// Movie identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub u64);

impl MovieId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for MovieId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for MovieId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::invalid_id(s));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| DomainError::invalid_id(s))
    }
}

/// A stored movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub name: String,
    pub year: u32,
    pub rating: f64,
}

/// Raw request body for create/update.
///
/// Missing fields default to empty/zero so validation can report them.
/// Numbers may arrive as JSON numbers or numeric strings (`"1995"`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MovieInput {
    pub name: String,
    #[serde(deserialize_with = "number_or_string")]
    pub year: u32,
    #[serde(deserialize_with = "number_or_string")]
    pub rating: f64,
}

/// A validated movie payload (every field present and non-zero).
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovie {
    pub name: String,
    pub year: u32,
    pub rating: f64,
}

impl MovieInput {
    pub fn from_json(value: &serde_json::Value) -> DomainResult<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| DomainError::validation(format!("malformed movie: {e}")))
    }

    pub fn validate(self) -> DomainResult<NewMovie> {
        if self.name.trim().is_empty() || self.year == 0 || self.rating == 0.0 {
            return Err(DomainError::validation("name, year and rating are required"));
        }
        Ok(NewMovie {
            name: self.name,
            year: self.year,
            rating: self.rating,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString<T> {
    Number(T),
    Text(String),
}

fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr + Default,
{
    match NumberOrString::<T>::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) if s.trim().is_empty() => Ok(T::default()),
        NumberOrString::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected a number, got {s:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_numbers_and_numeric_strings() {
        let a = MovieInput::from_json(&json!({"name": "Terminal", "year": 1995, "rating": 9.0})).unwrap();
        let b = MovieInput::from_json(&json!({"name": "Terminal", "year": "1995", "rating": "9.0"})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.validate().unwrap().year, 1995);
    }

    #[test]
    fn missing_field_fails_validation() {
        let input = MovieInput::from_json(&json!({"name": "Paul alian", "rating": "8.5"})).unwrap();
        assert_eq!(input.year, 0);
        assert!(matches!(input.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn zero_and_empty_fail_validation() {
        for body in [
            json!({"name": "", "year": 1999, "rating": 8.1}),
            json!({"name": "X", "year": 0, "rating": 8.1}),
            json!({"name": "X", "year": 1999, "rating": 0}),
        ] {
            let input = MovieInput::from_json(&body).unwrap();
            assert!(input.validate().is_err(), "{body} should be invalid");
        }
    }

    #[test]
    fn non_numeric_string_is_malformed() {
        let err = MovieInput::from_json(&json!({"name": "X", "year": "soon", "rating": 1})).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn movie_id_parsing() {
        assert_eq!("102".parse::<MovieId>(), Ok(MovieId(102)));
        assert!("".parse::<MovieId>().is_err());
        assert!("-1".parse::<MovieId>().is_err());
        assert!("10a".parse::<MovieId>().is_err());
    }
}
