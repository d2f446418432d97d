use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bar frequency of a price series. Each frequency is stored in its own CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub const ALL: [Frequency; 3] = [Frequency::Daily, Frequency::Weekly, Frequency::Monthly];

    pub fn parse(value: &str) -> Result<Self, String> {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "daily" | "1d" | "1day" | "day" => Ok(Frequency::Daily),
            "weekly" | "1w" | "1week" | "week" => Ok(Frequency::Weekly),
            "monthly" | "1mo" | "1month" | "month" => Ok(Frequency::Monthly),
            _ => Err(format!("unsupported frequency: {value}")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Frequency::parse(s)
    }
}
