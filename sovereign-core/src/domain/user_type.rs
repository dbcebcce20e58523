//! User type and sensitivity level

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::result::Error;

/// Who the export is for. Selects the template and the access rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Journalist,
    Researcher,
    Ngo,
    Developer,
    Government,
}

impl UserType {
    pub const ALL: [UserType; 5] = [
        UserType::Journalist,
        UserType::Researcher,
        UserType::Ngo,
        UserType::Developer,
        UserType::Government,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Journalist => "journalist",
            UserType::Researcher => "researcher",
            UserType::Ngo => "ngo",
            UserType::Developer => "developer",
            UserType::Government => "government",
        }
    }

    /// Government exports need an explicit permission flag on every call
    pub fn requires_permission(&self) -> bool {
        matches!(self, UserType::Government)
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "journalist" => Ok(UserType::Journalist),
            "researcher" => Ok(UserType::Researcher),
            "ngo" => Ok(UserType::Ngo),
            "developer" => Ok(UserType::Developer),
            "government" => Ok(UserType::Government),
            other => Err(Error::invalid_input(format!("unknown user type '{}'", other))),
        }
    }
}

/// How much care a record needs before it leaves the toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityLevel {
    Public,
    Sensitive,
    Restricted,
}

impl SensitivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensitivityLevel::Public => "public",
            SensitivityLevel::Sensitive => "sensitive",
            SensitivityLevel::Restricted => "restricted",
        }
    }
}

impl fmt::Display for SensitivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_type() {
        assert_eq!("Journalist".parse::<UserType>().unwrap(), UserType::Journalist);
        assert_eq!(" ngo ".parse::<UserType>().unwrap(), UserType::Ngo);
        let err = "spy".parse::<UserType>().unwrap_err();
        assert!(matches!(err, Error::InvalidInputKind(_)));
    }

    #[test]
    fn test_round_trip_names() {
        for user_type in UserType::ALL {
            assert_eq!(user_type.as_str().parse::<UserType>().unwrap(), user_type);
        }
    }

    #[test]
    fn test_sensitivity_ordering() {
        assert!(SensitivityLevel::Public < SensitivityLevel::Sensitive);
        assert!(SensitivityLevel::Sensitive < SensitivityLevel::Restricted);
        assert_eq!(
            SensitivityLevel::Public.max(SensitivityLevel::Restricted),
            SensitivityLevel::Restricted
        );
    }
}
