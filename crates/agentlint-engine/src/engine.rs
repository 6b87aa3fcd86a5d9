//! Evaluation orchestrator.
//!
//! Holds the registered rules and runs the full pipeline for one event:
//! activation filter, rule predicates, severity remapping, circuit breaker.

use agentlint_core::{EvaluationContext, Finding, Rule, SessionState, Severity};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::breaker::CircuitBreaker;
use crate::config::EngineConfig;
use crate::filter::active_rules;
use crate::severity::remap_all;

/// Outcome of one evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationResult {
    /// Findings that survived the circuit breaker, in rule registration order.
    pub findings: Vec<Finding>,
    /// Number of rules that passed the activation filter and ran.
    pub rules_evaluated: usize,
}

impl EvaluationResult {
    /// Whether any ERROR finding remains.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.findings.iter().any(Finding::is_blocking)
    }

    /// Findings at `severity`.
    pub fn at(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    /// Number of findings at `severity`.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.at(severity).count()
    }
}

/// The guardrail engine.
pub struct Engine {
    rules: Vec<Box<dyn Rule>>,
    config: EngineConfig,
    breaker: CircuitBreaker,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("rules", &self.rules.len())
            .field("active_packs", &self.config.active_packs)
            .field("severity_mode", &self.config.severity_mode)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Engine with no rules.
    pub fn new(config: EngineConfig) -> Self {
        let breaker = CircuitBreaker::new(config.circuit_breaker.clone());
        Self {
            rules: Vec::new(),
            config,
            breaker,
        }
    }

    /// Engine with `rules` registered in iteration order.
    pub fn with_rules(config: EngineConfig, rules: impl IntoIterator<Item = Box<dyn Rule>>) -> Self {
        let mut engine = Self::new(config);
        for rule in rules {
            let _ = engine.register_rule(rule);
        }
        debug!(rule_count = engine.rules.len(), "engine initialized");
        engine
    }

    /// Register a rule. Returns `false` (and keeps the first) when a rule
    /// with the same ID is already registered.
    pub fn register_rule(&mut self, rule: Box<dyn Rule>) -> bool {
        if self.rules.iter().any(|r| r.id() == rule.id()) {
            warn!(rule_id = rule.id(), "duplicate rule id, keeping the first registration");
            return false;
        }
        if rule.non_degradable() {
            self.breaker.exempt(rule.id());
        }
        debug!(rule_id = rule.id(), pack = rule.pack(), "rule registered");
        self.rules.push(rule);
        true
    }

    /// Registered rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The circuit breaker.
    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Rules that would run for `ctx`.
    #[must_use]
    pub fn active_rules(&self, ctx: &EvaluationContext) -> Vec<&dyn Rule> {
        active_rules(&self.rules, &self.config, ctx.event)
    }

    /// Evaluate `ctx` at the current time.
    pub fn evaluate(&self, ctx: &EvaluationContext, session: &mut SessionState) -> EvaluationResult {
        self.evaluate_at(ctx, session, Utc::now())
    }

    /// Evaluate `ctx` with an explicit clock reading for the circuit breaker.
    pub fn evaluate_at(
        &self,
        ctx: &EvaluationContext,
        session: &mut SessionState,
        now: DateTime<Utc>,
    ) -> EvaluationResult {
        let active = self.active_rules(ctx);
        let rules_evaluated = active.len();

        let mut findings = Vec::new();
        for rule in active {
            let produced = rule.evaluate(ctx, session);
            if !produced.is_empty() {
                debug!(rule_id = rule.id(), count = produced.len(), "rule fired");
            }
            findings.extend(produced);
        }

        remap_all(&mut findings, self.config.severity_mode);

        // Per-call rule config wins; fall back to the engine's own.
        let rule_config = if ctx.rule_config.is_empty() {
            &self.config.rules
        } else {
            &ctx.rule_config
        };
        let findings = self.breaker.apply(findings, session, rule_config, now);

        debug!(
            event = %ctx.event,
            rules_evaluated,
            findings = findings.len(),
            "evaluation complete"
        );
        EvaluationResult {
            findings,
            rules_evaluated,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
