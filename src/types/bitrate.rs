use std::{fmt::Display, str::FromStr};

use serde::{de, Deserialize, Deserializer};

/// An audio bitrate in kbit/s, written "128K"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitrate(u16);

impl Default for Bitrate {
    fn default() -> Self {
        Self(128)
    }
}

impl FromStr for Bitrate {
    type Err = Box<dyn std::error::Error + Sync + Send>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(num_prefix) = s.trim().to_lowercase().strip_suffix('k') {
            Ok(Self(num_prefix.parse()?))
        } else {
            Err(Box::from("Bitrate does not end with 'K'"))
        }
    }
}

impl Display for Bitrate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}K", self.0)
    }
}

impl<'de> Deserialize<'de> for Bitrate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kilobits() {
        assert_eq!("192k".parse::<Bitrate>().unwrap().to_string(), "192K");
        assert!("192".parse::<Bitrate>().is_err());
        assert!("fastK".parse::<Bitrate>().is_err());
    }
}
