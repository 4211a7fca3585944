// src/analyze/mod.rs
//! Rule evaluation: turns a snapshot into alert events.

pub mod rules;

use minijinja::Environment;
use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::ingest::types::{RecordFields, SourceId};
use crate::snapshot::Snapshot;

pub use crate::analyze::rules::{load_rules_default, load_rules_from, Rule, RuleSet, Then, When};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Urgent,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Urgent => "urgent",
            Severity::Warning => "warning",
        }
    }
}

/// A notification candidate. Lives only for the run that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    pub severity: Severity,
    pub source_id: SourceId,
    pub subject: String,
    pub body: String,
    /// Name of the rule that fired.
    pub rule: String,
}

#[derive(Serialize)]
struct RecordContext<'a> {
    source: &'a str,
    title: &'a str,
    url: &'a str,
    place: &'a str,
    mag: String,
}

impl<'a> RecordContext<'a> {
    fn new(source: SourceId, rec: &RecordFields<'a>) -> Self {
        Self {
            source: source.as_str(),
            title: rec.title.unwrap_or_default(),
            url: rec.url.unwrap_or_default(),
            place: rec.place.unwrap_or("an unknown location"),
            mag: rec.magnitude.map(format_magnitude).unwrap_or_default(),
        }
    }
}

/// Render magnitudes the way the feeds publish them: `5.0`, not `5`.
pub fn format_magnitude(m: f64) -> String {
    if m.is_finite() && m.fract() == 0.0 {
        format!("{m:.1}")
    } else {
        format!("{m}")
    }
}

pub struct RuleEngine {
    rules: RuleSet,
    env: Environment<'static>,
}

impl RuleEngine {
    /// Validate rules and compile every template up front so a broken rule
    /// file fails at startup rather than mid-run.
    pub fn new(rules: RuleSet) -> Result<Self, RuleError> {
        rules.validate()?;
        let env = Environment::new();
        for r in &rules.rules {
            for src in [&r.then.subject, &r.then.body] {
                env.template_from_str(src).map_err(|e| RuleError::Template {
                    rule: r.name.clone(),
                    message: e.to_string(),
                })?;
            }
        }
        Ok(Self { rules, env })
    }

    /// Evaluate every available source in snapshot order, then every record in
    /// payload order. The first matching rule for a record wins. Sources that
    /// failed to fetch are skipped.
    pub fn evaluate(&self, snapshot: &Snapshot) -> Vec<AlertEvent> {
        let mut events = Vec::new();

        for result in snapshot.results() {
            let source = result.source_id;
            let Some(payload) = result.payload.as_ref().filter(|_| result.is_ok()) else {
                tracing::debug!(source = %source, "source unavailable, skipping rules");
                continue;
            };

            for rec in payload.records() {
                let Some(rule) = self
                    .rules
                    .for_source(source)
                    .find(|r| rules::matches_when(&rec, &r.when))
                else {
                    continue;
                };

                match self.render(rule, source, &rec) {
                    Ok(ev) => {
                        metrics::counter!(
                            "alerts_emitted_total",
                            "source" => source.as_str(),
                            "severity" => ev.severity.as_str()
                        )
                        .increment(1);
                        events.push(ev);
                    }
                    Err(e) => {
                        tracing::warn!(rule = %rule.name, source = %source, error = %e, "alert render failed");
                    }
                }
            }
        }

        events
    }

    fn render(
        &self,
        rule: &Rule,
        source: SourceId,
        rec: &RecordFields<'_>,
    ) -> Result<AlertEvent, minijinja::Error> {
        let ctx = RecordContext::new(source, rec);
        Ok(AlertEvent {
            severity: rule.then.severity,
            source_id: source,
            subject: self.env.render_str(&rule.then.subject, &ctx)?,
            body: self.env.render_str(&rule.then.body, &ctx)?,
            rule: rule.name.clone(),
        })
    }
}
