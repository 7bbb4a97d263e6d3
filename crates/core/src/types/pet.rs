//! Pet kinds used by the catalog and by pet records.

use serde::{Deserialize, Serialize};

/// Kind of animal a product targets, or a pet belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "petshop.pet_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PetType {
    Dog,
    Cat,
    Bird,
    Fish,
    Rodent,
    Reptile,
    Other,
}

impl PetType {
    /// All kinds, in display order.
    pub const ALL: [Self; 7] = [
        Self::Dog,
        Self::Cat,
        Self::Bird,
        Self::Fish,
        Self::Rodent,
        Self::Reptile,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dog => "dog",
            Self::Cat => "cat",
            Self::Bird => "bird",
            Self::Fish => "fish",
            Self::Rodent => "rodent",
            Self::Reptile => "reptile",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for PetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("invalid pet type: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_round_trips_display() {
        for kind in PetType::ALL {
            assert_eq!(kind.to_string().parse::<PetType>().unwrap(), kind);
        }
        assert!("dragon".parse::<PetType>().is_err());
    }
}
