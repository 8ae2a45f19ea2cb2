//! Country and application catalog models
//!
//! Countries define the numbering plans numbers are rented in; applications
//! are the services a verification SMS is expected from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Country entity
///
/// A country a disposable number can be rented in. `phone_code` is the
/// international dialing prefix used when generating numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    /// External numeric identifier (stable across systems)
    pub id: i32,

    /// Display name
    pub title: String,

    /// ISO country code (uppercase)
    pub code: String,

    /// International dialing prefix without the leading plus
    pub phone_code: String,

    /// Flag emoji or asset reference
    pub flag: Option<String>,

    /// Billing currency for this country (ISO 4217)
    pub currency: String,

    /// Whether numbers can currently be rented here
    pub is_active: bool,

    /// Sort priority (higher = listed first)
    pub priority: i32,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Application category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppCategory {
    Social,
    Messaging,
    Marketplace,
    Exchange,
    Gaming,
    #[default]
    Other,
}

impl fmt::Display for AppCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppCategory::Social => write!(f, "social"),
            AppCategory::Messaging => write!(f, "messaging"),
            AppCategory::Marketplace => write!(f, "marketplace"),
            AppCategory::Exchange => write!(f, "exchange"),
            AppCategory::Gaming => write!(f, "gaming"),
            AppCategory::Other => write!(f, "other"),
        }
    }
}

impl AppCategory {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "social" => Some(AppCategory::Social),
            "messaging" => Some(AppCategory::Messaging),
            "marketplace" => Some(AppCategory::Marketplace),
            "exchange" => Some(AppCategory::Exchange),
            "gaming" => Some(AppCategory::Gaming),
            "other" => Some(AppCategory::Other),
            _ => None,
        }
    }
}

/// Application entity
///
/// A service (Telegram, WhatsApp, ...) a rented number receives a
/// verification SMS for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    /// External numeric identifier
    pub id: i32,

    /// Display name
    pub name: String,

    /// Short code (lowercase, unique)
    pub code: String,

    /// Category for catalog grouping
    pub category: AppCategory,

    /// Icon asset reference
    pub icon: Option<String>,

    /// Whether this application is currently offered
    pub is_active: bool,

    /// Sort priority (higher = listed first)
    pub priority: i32,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for Country {
    fn default() -> Self {
        Self {
            id: 0,
            title: String::new(),
            code: String::new(),
            phone_code: String::new(),
            flag: None,
            currency: "USD".to_string(),
            is_active: true,
            priority: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

impl Default for Application {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            code: String::new(),
            category: AppCategory::Other,
            icon: None,
            is_active: true,
            priority: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
