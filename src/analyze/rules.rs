//! Declarative alert rules (loaded from `config/rules.json` or `config/rules.toml`).
//!
//! Each rule is bound to one source and tests one payload record:
//! - `magnitude_above`:    match if magnitude > value
//! - `magnitude_at_least`: match if magnitude >= value
//! - `magnitude_at_most`:  match if magnitude <= value
//! - `title_contains_any`: match if ANY phrase appears in the title
//! - `ignore_case`:        compare titles case-insensitively (default: false)
//!
//! All present conditions must hold. A condition on a field the record does
//! not carry (e.g. a `null` magnitude) never holds.
//!
//! When a rule matches, `then` gives the severity plus minijinja templates for
//! the subject and body. Templates see `title`, `url`, `place`, `mag` and `source`.

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::analyze::Severity;
use crate::error::RuleError;
use crate::ingest::types::{RecordFields, SourceId};

const ENV_PATH: &str = "ALERT_RULES_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub applies_to: SourceId,
    #[serde(default)]
    pub when: When,
    pub then: Then,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct When {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnitude_above: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnitude_at_least: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnitude_at_most: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_contains_any: Option<Vec<String>>,
    #[serde(default)]
    pub ignore_case: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Then {
    pub severity: Severity,
    pub subject: String,
    pub body: String,
}

impl Default for RuleSet {
    /// The stock rule set: quake magnitude bands, GDACS hazard keywords and
    /// "disaster" headlines from ReliefWeb and NewsAPI.
    fn default() -> Self {
        let disaster_headline = |name: &str, source: SourceId| Rule {
            name: name.into(),
            applies_to: source,
            when: When {
                title_contains_any: Some(vec!["disaster".into()]),
                ignore_case: true,
                ..When::default()
            },
            then: Then {
                severity: Severity::Urgent,
                subject: "Disaster Alert: {{ title }}".into(),
                body: "Details: {{ url }}".into(),
            },
        };

        Self {
            rules: vec![
                Rule {
                    name: "quake-urgent".into(),
                    applies_to: SourceId::Seismic,
                    when: When {
                        magnitude_above: Some(5.0),
                        ..When::default()
                    },
                    then: Then {
                        severity: Severity::Urgent,
                        subject: "Urgent: Earthquake Alert".into(),
                        body: "An earthquake of magnitude {{ mag }} has been detected at {{ place }}."
                            .into(),
                    },
                },
                Rule {
                    name: "quake-mild".into(),
                    applies_to: SourceId::Seismic,
                    when: When {
                        magnitude_at_least: Some(3.0),
                        magnitude_at_most: Some(5.0),
                        ..When::default()
                    },
                    then: Then {
                        severity: Severity::Warning,
                        subject: "Mild Earthquake Warning".into(),
                        body: "A mild earthquake of magnitude {{ mag }} has been detected at {{ place }}."
                            .into(),
                    },
                },
                Rule {
                    name: "gdacs-hazard".into(),
                    applies_to: SourceId::DisasterFeed,
                    when: When {
                        title_contains_any: Some(vec![
                            "Tsunami".into(),
                            "Flood".into(),
                            "Cyclone".into(),
                        ]),
                        ignore_case: false,
                        ..When::default()
                    },
                    then: Then {
                        severity: Severity::Urgent,
                        subject: "Urgent: {{ title }}".into(),
                        body: "Disaster Alert: {{ title }}\nDetails: {{ url }}".into(),
                    },
                },
                disaster_headline("reliefweb-disaster", SourceId::HumanitarianReport),
                disaster_headline("news-disaster", SourceId::NewsSearch),
            ],
        }
    }
}

impl RuleSet {
    /// Reject rules whose conditions can never see the field they test.
    pub fn validate(&self) -> Result<(), RuleError> {
        for r in &self.rules {
            let w = &r.when;
            let has_mag = w.magnitude_above.is_some()
                || w.magnitude_at_least.is_some()
                || w.magnitude_at_most.is_some();
            let invalid = |message: &str| RuleError::Invalid {
                rule: r.name.clone(),
                source_id: r.applies_to,
                message: message.to_string(),
            };
            if has_mag && r.applies_to != SourceId::Seismic {
                return Err(invalid("magnitude conditions only apply to seismic records"));
            }
            if w.title_contains_any.is_some() && r.applies_to == SourceId::Seismic {
                return Err(invalid("seismic records carry no title"));
            }
        }
        Ok(())
    }

    /// Rules bound to `source`, in configured order.
    pub fn for_source(&self, source: SourceId) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |r| r.applies_to == source)
    }
}

/// Load rules from an explicit path. Supports JSON or TOML (by extension).
pub fn load_rules_from(path: &Path) -> Result<RuleSet, RuleError> {
    let content = fs::read_to_string(path).map_err(|source| RuleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if ext == "toml" {
        toml::from_str(&content).map_err(|e| RuleError::Parse(e.to_string()))
    } else {
        serde_json::from_str(&content).map_err(|e| RuleError::Parse(e.to_string()))
    }
}

/// Load rules using env var + fallbacks:
/// 1) $ALERT_RULES_PATH
/// 2) config/rules.json
/// 3) config/rules.toml
/// 4) built-in defaults
pub fn load_rules_default() -> Result<RuleSet, RuleError> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        return load_rules_from(&pb);
    }
    for candidate in ["config/rules.json", "config/rules.toml"] {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return load_rules_from(&p);
        }
    }
    Ok(RuleSet::default())
}

pub(crate) fn matches_when(rec: &RecordFields<'_>, w: &When) -> bool {
    if let Some(min) = w.magnitude_above {
        if !rec.magnitude.is_some_and(|m| m > min) {
            return false;
        }
    }
    if let Some(min) = w.magnitude_at_least {
        if !rec.magnitude.is_some_and(|m| m >= min) {
            return false;
        }
    }
    if let Some(max) = w.magnitude_at_most {
        if !rec.magnitude.is_some_and(|m| m <= max) {
            return false;
        }
    }
    if let Some(phrases) = &w.title_contains_any {
        let Some(title) = rec.title else {
            return false;
        };
        if !phrases.iter().any(|p| contains(title, p, w.ignore_case)) {
            return false;
        }
    }
    true
}

fn contains(text: &str, pat: &str, ignore_case: bool) -> bool {
    if ignore_case {
        text.to_lowercase().contains(&pat.to_lowercase())
    } else {
        text.contains(pat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn quake(m: Option<f64>) -> RecordFields<'static> {
        RecordFields {
            magnitude: m,
            place: Some("Somewhere"),
            ..RecordFields::default()
        }
    }

    fn titled(t: &'static str) -> RecordFields<'static> {
        RecordFields {
            title: Some(t),
            url: Some("https://x/1"),
            ..RecordFields::default()
        }
    }

    #[test]
    fn magnitude_bounds_are_strict_and_inclusive_as_configured() {
        let rs = RuleSet::default();
        let urgent = &rs.rules[0].when;
        let mild = &rs.rules[1].when;

        assert!(!matches_when(&quake(Some(5.0)), urgent));
        assert!(matches_when(&quake(Some(5.01)), urgent));
        assert!(matches_when(&quake(Some(5.0)), mild));
        assert!(matches_when(&quake(Some(3.0)), mild));
        assert!(!matches_when(&quake(Some(2.99)), mild));
        assert!(!matches_when(&quake(None), mild));
    }

    #[test]
    fn gdacs_keywords_are_case_sensitive() {
        let w = &RuleSet::default().rules[2].when;
        assert!(matches_when(&titled("Red Tsunami alert"), w));
        assert!(!matches_when(&titled("red tsunami alert"), w));
        assert!(!matches_when(&titled("FLOOD"), w));
    }

    #[test]
    fn disaster_headlines_ignore_case() {
        let w = &RuleSet::default().rules[3].when;
        assert!(matches_when(&titled("DISASTER in the valley"), w));
        assert!(matches_when(&titled("Natural disasters report"), w));
        assert!(!matches_when(&titled("Weather outlook"), w));
    }

    #[test]
    fn empty_when_matches_everything() {
        assert!(matches_when(&titled("anything"), &When::default()));
    }

    #[test]
    fn default_rules_are_valid() {
        RuleSet::default().validate().unwrap();
    }

    #[test]
    fn magnitude_rule_on_news_is_rejected() {
        let mut rs = RuleSet::default();
        rs.rules[0].applies_to = SourceId::NewsSearch;
        assert!(matches!(rs.validate(), Err(RuleError::Invalid { .. })));
    }

    #[test]
    fn json_and_toml_files_load() {
        let dir = tempfile::tempdir().unwrap();

        let p_json = dir.path().join("rules.json");
        fs::write(&p_json, serde_json::to_string(&RuleSet::default()).unwrap()).unwrap();
        assert_eq!(load_rules_from(&p_json).unwrap(), RuleSet::default());

        let p_toml = dir.path().join("rules.toml");
        fs::write(
            &p_toml,
            r#"
[[rules]]
name = "volcano"
applies_to = "disaster_feed"
when = { title_contains_any = ["Volcano"] }
then = { severity = "warning", subject = "Volcano: {{ title }}", body = "{{ url }}" }
"#,
        )
        .unwrap();
        let rs = load_rules_from(&p_toml).unwrap();
        assert_eq!(rs.rules.len(), 1);
        assert_eq!(rs.rules[0].then.severity, Severity::Warning);
        assert!(!rs.rules[0].when.ignore_case);
    }

    #[serial]
    #[test]
    fn default_loader_prefers_env_then_falls_back_to_builtin() {
        let old = std::env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        std::env::set_current_dir(tmp.path()).unwrap();
        std::env::remove_var(ENV_PATH);

        assert_eq!(load_rules_default().unwrap(), RuleSet::default());

        let p = tmp.path().join("custom.json");
        fs::write(&p, r#"{"rules": []}"#).unwrap();
        std::env::set_var(ENV_PATH, p.display().to_string());
        assert!(load_rules_default().unwrap().rules.is_empty());
        std::env::remove_var(ENV_PATH);

        std::env::set_current_dir(&old).unwrap();
    }
}
