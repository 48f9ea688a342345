use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Backend environment the SDK talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Environment {
    Dev,
    Beta,
    Rc,
    #[default]
    Prod,
}

/// Build flavor baked in at compile time (`TRUVIDEO_FLAVOR=dev cargo build`).
const BUILD_FLAVOR: Option<&str> = option_env!("TRUVIDEO_FLAVOR");

impl Environment {
    /// Resolve from the build flavor. Unknown or missing flavors fall back to PROD.
    pub fn from_build() -> Self {
        Self::from_flavor(BUILD_FLAVOR.unwrap_or(""))
    }

    pub fn from_flavor(flavor: &str) -> Self {
        flavor.parse().unwrap_or(Environment::Prod)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "DEV",
            Environment::Beta => "BETA",
            Environment::Rc => "RC",
            Environment::Prod => "PROD",
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "beta" => Ok(Environment::Beta),
            "rc" => Ok(Environment::Rc),
            "prod" => Ok(Environment::Prod),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flavor_mapping() {
        assert_eq!(Environment::from_flavor("dev"), Environment::Dev);
        assert_eq!(Environment::from_flavor("BETA"), Environment::Beta);
        assert_eq!(Environment::from_flavor(" rc "), Environment::Rc);
        assert_eq!(Environment::from_flavor("prod"), Environment::Prod);
        assert_eq!(Environment::from_flavor("staging"), Environment::Prod);
        assert_eq!(Environment::from_flavor(""), Environment::Prod);
    }

    #[test]
    fn display_is_uppercase() {
        assert_eq!(Environment::Rc.to_string(), "RC");
        assert_eq!(serde_json::to_string(&Environment::Dev).unwrap(), "\"DEV\"");
        let parsed: Environment = serde_json::from_str("\"BETA\"").unwrap();
        assert_eq!(parsed, Environment::Beta);
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!("qa".parse::<Environment>().is_err());
    }
}
