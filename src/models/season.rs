// src/models/season.rs

//! Broadcast season (year + quarter).

use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::error::{AppError, Result};

/// A broadcast season, e.g. fall 2025 (`202504`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Season {
    pub year: i32,
    /// 1 = winter, 2 = spring, 3 = summer, 4 = fall
    pub quarter: u8,
}

impl Season {
    /// Season containing the given date.
    pub fn from_date(date: NaiveDate) -> Self {
        let quarter = match date.month() {
            1..=3 => 1,
            4..=6 => 2,
            7..=9 => 3,
            _ => 4,
        };
        Self {
            year: date.year(),
            quarter,
        }
    }

    /// Parse a `YYYYQQ` code such as `202504`.
    pub fn parse_code(code: &str) -> Result<Self> {
        let code = code.trim();
        let invalid = || AppError::config(format!("Invalid season code '{code}' (expected YYYYQQ)"));

        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = code[..4].parse().map_err(|_| invalid())?;
        let quarter: u8 = code[4..].parse().map_err(|_| invalid())?;
        if !(1..=4).contains(&quarter) {
            return Err(invalid());
        }
        Ok(Self { year, quarter })
    }

    /// Code used by the lineup API.
    pub fn code(&self) -> String {
        format!("{}{:02}", self.year, self.quarter)
    }

    /// Slug used by the secondary feed file name.
    pub fn slug(&self) -> &'static str {
        match self.quarter {
            1 => "winter",
            2 => "spring",
            3 => "summer",
            _ => "fall",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.slug(), self.year)
    }
}
