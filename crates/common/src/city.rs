use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Cities where pickup points may be registered.
///
/// The canonical (stored and serialized) form is the Russian name; English
/// names are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum City {
    Moscow,
    SaintPetersburg,
    Kazan,
}

impl City {
    /// Every city on the allow-list.
    pub const ALL: [City; 3] = [City::Moscow, City::SaintPetersburg, City::Kazan];

    /// Returns the canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            City::Moscow => "Москва",
            City::SaintPetersburg => "Санкт-Петербург",
            City::Kazan => "Казань",
        }
    }

    fn english_name(&self) -> &'static str {
        match self {
            City::Moscow => "Moscow",
            City::SaintPetersburg => "Saint Petersburg",
            City::Kazan => "Kazan",
        }
    }
}

impl std::fmt::Display for City {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("city is not available for registration: {0}")]
pub struct CityNotAllowed(pub String);

impl std::str::FromStr for City {
    type Err = CityNotAllowed;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        City::ALL
            .into_iter()
            .find(|city| city.as_str() == name || city.english_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| CityNotAllowed(s.to_string()))
    }
}

impl Serialize for City {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for City {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_russian_and_english_names() {
        assert_eq!("Москва".parse::<City>().unwrap(), City::Moscow);
        assert_eq!("Moscow".parse::<City>().unwrap(), City::Moscow);
        assert_eq!("saint petersburg".parse::<City>().unwrap(), City::SaintPetersburg);
        assert_eq!("Казань".parse::<City>().unwrap(), City::Kazan);
    }

    #[test]
    fn rejects_cities_outside_allow_list() {
        let err = "Novosibirsk".parse::<City>().unwrap_err();
        assert_eq!(err.0, "Novosibirsk");
        assert!("".parse::<City>().is_err());
    }

    #[test]
    fn serializes_canonical_name() {
        let json = serde_json::to_string(&City::Kazan).unwrap();
        assert_eq!(json, "\"Казань\"");
        let city: City = serde_json::from_str("\"Kazan\"").unwrap();
        assert_eq!(city, City::Kazan);
    }
}
