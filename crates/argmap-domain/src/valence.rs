//! Valence - the dialectical direction of an edge

use std::fmt;

/// Relation of a child claim towards the parent premise it targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Valence {
    /// The child supports its target
    Pro,

    /// The child attacks its target
    Con,
}

impl Valence {
    /// Both valences, in the order the builder processes them
    pub const ALL: [Valence; 2] = [Valence::Pro, Valence::Con];

    /// Storage form of the valence (`"PRO"` / `"CON"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Valence::Pro => "PRO",
            Valence::Con => "CON",
        }
    }

    /// Parse the storage form; case-insensitive, surrounding whitespace ignored
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PRO" => Some(Valence::Pro),
            "CON" => Some(Valence::Con),
            _ => None,
        }
    }

    /// The other valence
    pub fn opposite(&self) -> Self {
        match self {
            Valence::Pro => Valence::Con,
            Valence::Con => Valence::Pro,
        }
    }

    /// Phrase used when describing an argument's direction in prose
    pub fn relation_phrase(&self) -> &'static str {
        match self {
            Valence::Pro => "in support of",
            Valence::Con => "against",
        }
    }
}

impl fmt::Display for Valence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Valence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid valence: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valence_storage_form() {
        assert_eq!(Valence::Pro.as_str(), "PRO");
        assert_eq!(Valence::Con.to_string(), "CON");
        assert_eq!("pro".parse::<Valence>(), Ok(Valence::Pro));
        assert_eq!(" CON ".parse::<Valence>(), Ok(Valence::Con));
    }

    #[test]
    fn test_valence_rejects_unknown() {
        assert!("neutral".parse::<Valence>().is_err());
        assert!("".parse::<Valence>().is_err());
    }

    #[test]
    fn test_valence_opposite() {
        assert_eq!(Valence::Pro.opposite(), Valence::Con);
        assert_eq!(Valence::Con.opposite(), Valence::Pro);
    }
}
