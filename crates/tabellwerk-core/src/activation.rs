// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Soft activation reminder.
//
// Earlier releases stored a `license.json` of the form
// `{"license_key": "...", "expiry": "YYYY-MM-DD"}`. The file is still read and
// written in that shape so existing installs keep their state, but it only
// drives a reminder banner. Nothing is locked behind it.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{load_json, save_json};
use crate::error::Result;

pub const ACTIVATION_FILE: &str = "license.json";

/// Number of days a newly recorded key stays current.
const ACTIVATION_DAYS: u64 = 365;

/// Persisted activation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRecord {
    pub license_key: String,
    #[serde(with = "ymd")]
    pub expiry: NaiveDate,
}

/// What the UI should show for the activation banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationStatus {
    /// No record on disk.
    Missing,
    Active { days_left: i64 },
    Expired,
}

impl ActivationRecord {
    /// Record a key entered today.
    pub fn new(license_key: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            license_key: license_key.into(),
            expiry: today
                .checked_add_days(chrono::Days::new(ACTIVATION_DAYS))
                .unwrap_or(NaiveDate::MAX),
        }
    }

    pub fn load(dir: &Path) -> Option<Self> {
        load_json(&dir.join(ACTIVATION_FILE))
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        save_json(&dir.join(ACTIVATION_FILE), self)
    }

    pub fn status(&self, today: NaiveDate) -> ActivationStatus {
        if today > self.expiry {
            ActivationStatus::Expired
        } else {
            ActivationStatus::Active {
                days_left: (self.expiry - today).num_days(),
            }
        }
    }
}

/// Status for the record stored in `dir`, if any.
pub fn activation_status(dir: &Path, today: NaiveDate) -> ActivationStatus {
    ActivationRecord::load(dir)
        .map(|record| record.status(today))
        .unwrap_or(ActivationStatus::Missing)
}

mod ymd {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDate::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
