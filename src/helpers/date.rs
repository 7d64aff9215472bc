//! Date helper functions

use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, Locale};
use chrono_tz::Tz;

use crate::config::SiteConfig;

/// Resolve a BCP 47 style tag ("pt-BR", "en_US") to a chrono locale
pub fn parse_locale(tag: &str) -> Result<Locale> {
    match tag.replace('_', "-").as_str() {
        "pt-BR" => Ok(Locale::pt_BR),
        "pt-PT" => Ok(Locale::pt_PT),
        "en-US" => Ok(Locale::en_US),
        "en-GB" => Ok(Locale::en_GB),
        "es-ES" => Ok(Locale::es_ES),
        "fr-FR" => Ok(Locale::fr_FR),
        "de-DE" => Ok(Locale::de_DE),
        _ => Err(anyhow!("Unsupported locale: {}", tag)),
    }
}

/// Resolve an IANA time zone name
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| anyhow!("Unknown timezone {}: {}", name, e))
}

/// Formats publication timestamps for display
///
/// Holds the parsed locale, zone and pattern so the raw timestamp can be
/// formatted any number of times with the same result.
#[derive(Debug, Clone)]
pub struct DateFormatter {
    locale: Locale,
    timezone: Tz,
    pattern: String,
}

impl DateFormatter {
    /// Build a formatter from the site configuration
    pub fn new(config: &SiteConfig) -> Result<Self> {
        Ok(Self {
            locale: parse_locale(&config.locale)?,
            timezone: parse_timezone(&config.timezone)?,
            pattern: date_fns_to_chrono_format(&config.date_format),
        })
    }

    /// Format a timestamp in the configured zone and locale
    ///
    /// # Examples
    /// ```ignore
    /// formatter.format(&date) // -> "25 mar 2021"
    /// ```
    pub fn format(&self, date: &DateTime<FixedOffset>) -> String {
        date.with_timezone(&self.timezone)
            .format_localized(&self.pattern, self.locale)
            .to_string()
    }

    /// Format an optional timestamp; unpublished documents render empty
    pub fn format_opt(&self, date: Option<&DateTime<FixedOffset>>) -> String {
        date.map(|d| self.format(d)).unwrap_or_default()
    }
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml(date: &DateTime<FixedOffset>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// `datetime` attribute for an optional timestamp
pub fn date_xml_opt(date: Option<&DateTime<FixedOffset>>) -> String {
    date.map(date_xml).unwrap_or_default()
}

/// Convert a date-fns format string to chrono format
///
/// Letters repeat to pick a width (`d`/`dd`, `M`..`MMMM`); text between
/// single quotes is literal and `''` is an escaped quote.
fn date_fns_to_chrono_format(format: &str) -> String {
    let chars: Vec<char> = format.chars().collect();
    let mut result = String::with_capacity(format.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                result.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        result.push('\'');
                        i += 2;
                        continue;
                    }
                    break;
                }
                push_literal(&mut result, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        let token = match (c, run) {
            ('y', 2) => Some("%y"),
            ('y', _) => Some("%Y"),
            ('M', 1) => Some("%-m"),
            ('M', 2) => Some("%m"),
            ('M', 3) => Some("%b"),
            ('M', _) => Some("%B"),
            ('d', 1) => Some("%-d"),
            ('d', _) => Some("%d"),
            ('H', 1) => Some("%-H"),
            ('H', _) => Some("%H"),
            ('h', 1) => Some("%-I"),
            ('h', _) => Some("%I"),
            ('m', 1) => Some("%-M"),
            ('m', _) => Some("%M"),
            ('s', 1) => Some("%-S"),
            ('s', _) => Some("%S"),
            ('E', 1..=3) => Some("%a"),
            ('E', _) => Some("%A"),
            ('a', _) => Some("%p"),
            _ => None,
        };

        match token {
            Some(token) => result.push_str(token),
            None => {
                for _ in 0..run {
                    push_literal(&mut result, c);
                }
            }
        }
        i += run;
    }

    result
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}
