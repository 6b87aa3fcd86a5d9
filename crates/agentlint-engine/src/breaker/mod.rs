//! Per-rule circuit breaker.
//!
//! A rule whose ERROR findings keep firing in one session is progressively
//! degraded so a false positive cannot block an agent forever:
//!
//! | State      | Fire count                  | ERROR finding becomes |
//! |------------|-----------------------------|-----------------------|
//! | `Active`   | `< degraded_after`          | unchanged             |
//! | `Degraded` | `degraded_after..passive_after` | WARNING           |
//! | `Passive`  | `passive_after..open_after` | INFO                  |
//! | `Open`     | `>= open_after`             | dropped               |
//!
//! Records live in [`SessionState::circuit_breaker`]. Only ERROR findings
//! (after severity remapping) count. Findings from non-degradable rules, or
//! from rules whose breaker is disabled, are invisible to the breaker: they
//! pass through untouched and never create or update a record.
//!
//! A tracked rule that stays silent accumulates clean evaluations; after
//! `reset_after_clean` of them, or once more than `reset_after_minutes` have
//! passed since its last fire, its record drops straight back to `Active`.

mod config;

pub use config::CircuitBreakerConfig;

use std::collections::{HashMap, HashSet};

use agentlint_core::{
    CircuitBreakerRecord, CircuitState, Finding, PartialCircuitBreakerConfig, Rule, RuleSettings,
    SessionState, Severity, StateTransition, TransitionReason,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Degrades or suppresses findings from repeatedly firing rules.
///
/// Exemptions are per breaker: [`CircuitBreaker::new`] and `default()`
/// exempt nothing, so findings of non-degradable rules are only protected
/// once the breaker knows about them. Build it with
/// [`CircuitBreaker::for_rules`], or use [`crate::Engine`], which exempts
/// each rule as it is registered.
#[derive(Debug, Clone, Default)]
pub struct CircuitBreaker {
    global: PartialCircuitBreakerConfig,
    exempt: HashSet<String>,
}

impl CircuitBreaker {
    /// Breaker with the given global settings and no exempt rules.
    pub fn new(global: PartialCircuitBreakerConfig) -> Self {
        Self {
            global,
            exempt: HashSet::new(),
        }
    }

    /// Breaker that exempts every non-degradable rule in `rules`.
    pub fn for_rules(global: PartialCircuitBreakerConfig, rules: &[Box<dyn Rule>]) -> Self {
        let mut breaker = Self::new(global);
        for rule in rules.iter().filter(|r| r.non_degradable()) {
            breaker.exempt(rule.id());
        }
        breaker
    }

    /// Never degrade `rule_id`.
    pub fn exempt(&mut self, rule_id: impl Into<String>) {
        let _ = self.exempt.insert(rule_id.into());
    }

    /// Whether `rule_id` is exempt.
    #[must_use]
    pub fn is_exempt(&self, rule_id: &str) -> bool {
        self.exempt.contains(rule_id)
    }

    /// Global settings.
    #[must_use]
    pub fn global(&self) -> &PartialCircuitBreakerConfig {
        &self.global
    }

    /// Resolved settings for `rule_id`.
    #[must_use]
    pub fn config_for(
        &self,
        rule_id: &str,
        rule_config: &HashMap<String, RuleSettings>,
    ) -> CircuitBreakerConfig {
        let per_rule = rule_config
            .get(rule_id)
            .and_then(|settings| settings.circuit_breaker.as_ref());
        CircuitBreakerConfig::resolve(&self.global, per_rule)
    }

    /// Run the breaker over one evaluation's findings.
    ///
    /// Updates the records in `session` and returns the findings that
    /// survive, in input order, with degraded severities applied.
    pub fn apply(
        &self,
        findings: Vec<Finding>,
        session: &mut SessionState,
        rule_config: &HashMap<String, RuleSettings>,
        now: DateTime<Utc>,
    ) -> Vec<Finding> {
        let fired: HashSet<String> = findings
            .iter()
            .filter(|f| self.is_tracked(f, rule_config))
            .map(|f| f.rule_id.clone())
            .collect();

        for rule_id in &fired {
            if let Err(e) = self.config_for(rule_id, rule_config).validate() {
                warn!(
                    rule_id = %rule_id,
                    error = %e,
                    "circuit breaker misconfigured, using thresholds as given"
                );
            }
        }

        self.record_clean(&fired, session, rule_config, now);

        let mut out = Vec::with_capacity(findings.len());
        for finding in findings {
            if finding.severity != Severity::Error || !fired.contains(&finding.rule_id) {
                out.push(finding);
                continue;
            }

            let cfg = self.config_for(&finding.rule_id, rule_config);
            let record = session
                .circuit_breaker
                .entry(finding.rule_id.clone())
                .or_default();

            if has_expired(record, &cfg, now) {
                reset(record, &finding.rule_id, now);
            }
            let state = record_fire(record, &finding.rule_id, &cfg, now);
            let fire_count = record.fire_count;

            match state {
                CircuitState::Active => out.push(finding),
                CircuitState::Degraded => {
                    out.push(downgrade(finding, Severity::Warning, fire_count));
                }
                CircuitState::Passive => {
                    out.push(downgrade(finding, Severity::Info, fire_count));
                }
                CircuitState::Open => info!(
                    rule_id = %finding.rule_id,
                    fire_count,
                    "circuit breaker open, finding suppressed"
                ),
            }
        }
        out
    }

    fn is_tracked(&self, finding: &Finding, rule_config: &HashMap<String, RuleSettings>) -> bool {
        finding.severity == Severity::Error
            && !self.is_exempt(&finding.rule_id)
            && self.config_for(&finding.rule_id, rule_config).enabled
    }

    /// Clean-evaluation bookkeeping for tracked rules that did not fire.
    fn record_clean(
        &self,
        fired: &HashSet<String>,
        session: &mut SessionState,
        rule_config: &HashMap<String, RuleSettings>,
        now: DateTime<Utc>,
    ) {
        for (rule_id, record) in &mut session.circuit_breaker {
            if fired.contains(rule_id) || self.is_exempt(rule_id) {
                continue;
            }
            if record.fire_count == 0 && record.state == CircuitState::Active {
                continue;
            }
            let cfg = self.config_for(rule_id, rule_config);
            if !cfg.enabled {
                continue;
            }

            record.clean_count = record.clean_count.saturating_add(1);
            if record.clean_count >= cfg.reset_after_clean || has_expired(record, &cfg, now) {
                reset(record, rule_id, now);
            }
        }
    }
}

fn has_expired(
    record: &CircuitBreakerRecord,
    cfg: &CircuitBreakerConfig,
    now: DateTime<Utc>,
) -> bool {
    record
        .last_fire_ts
        .is_some_and(|last| now - last > cfg.reset_window())
}

/// Count one fire and recompute the state.
fn record_fire(
    record: &mut CircuitBreakerRecord,
    rule_id: &str,
    cfg: &CircuitBreakerConfig,
    now: DateTime<Utc>,
) -> CircuitState {
    record.fire_count = record.fire_count.saturating_add(1);
    record.clean_count = 0;
    if record.first_fire_ts.is_none() {
        record.first_fire_ts = Some(now);
    }
    record.last_fire_ts = Some(now);

    let next = cfg.state_for(record.fire_count);
    if next != record.state {
        info!(
            rule_id,
            from = %record.state,
            to = %next,
            fire_count = record.fire_count,
            "circuit breaker state changed"
        );
        record.transitions.push(StateTransition {
            from: record.state,
            to: next,
            at_count: record.fire_count,
            ts: now,
            reason: TransitionReason::FireCount,
        });
        record.state = next;
    }
    next
}

/// Zero the counters and return to `Active` in one step.
fn reset(record: &mut CircuitBreakerRecord, rule_id: &str, now: DateTime<Utc>) {
    let from = record.state;
    let at_count = record.fire_count;

    record.fire_count = 0;
    record.clean_count = 0;
    record.first_fire_ts = None;
    record.last_fire_ts = None;
    record.state = CircuitState::Active;

    if from != CircuitState::Active {
        record.transitions.push(StateTransition {
            from,
            to: CircuitState::Active,
            at_count,
            ts: now,
            reason: TransitionReason::Reset,
        });
        info!(rule_id, from = %from, "circuit breaker reset to active");
    } else {
        debug!(rule_id, "circuit breaker counters reset");
    }
}

/// Lower an ERROR finding to `severity`, noting the breaker in the message.
fn downgrade(mut finding: Finding, severity: Severity, fire_count: u32) -> Finding {
    finding.message = format!(
        "[Circuit breaker: fired {fire_count}x, degraded from {} to {severity}] {}",
        finding.severity, finding.message
    );
    finding.severity = severity;
    finding
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
