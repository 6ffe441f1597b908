//! Alert dispatch: maintenance gate, cooldown, delivery.

use std::time::Duration;

use tokio::time::Instant;

use crate::alerting::cooldown::CooldownTable;
use crate::alerting::maintenance::MaintenanceGate;
use crate::alerting::types::{AlertCandidate, AlertPayload};
use crate::alerting::webhook::{DeliveryError, WebhookClient};
use crate::config::{AlertConfig, WebhookConfig};
use crate::observability::metrics;

/// What happened to a candidate.
#[derive(Debug)]
pub enum DispatchOutcome {
    Delivered { attempts: u32 },
    /// Dropped because the maintenance marker exists.
    Maintenance,
    /// Dropped because the same type was delivered recently.
    CoolingDown { remaining: Duration },
    /// Dropped without a delivery attempt because the last attempt for
    /// this type failed recently.
    HeldOff { remaining: Duration },
    /// Delivery gave up; the cooldown table is untouched.
    Failed(DeliveryError),
}

impl DispatchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Delivered { .. } => "delivered",
            DispatchOutcome::Maintenance => "maintenance",
            DispatchOutcome::CoolingDown { .. } => "cooldown",
            DispatchOutcome::HeldOff { .. } => "held_off",
            DispatchOutcome::Failed(_) => "failed",
        }
    }
}

/// Owns the cooldown table and the webhook client.
///
/// `holdoffs` records the end of the last failed delivery per type. It
/// bounds how often a dead endpoint can stall the loop and never touches
/// `cooldowns`.
pub struct Dispatcher {
    webhook: WebhookClient,
    gate: MaintenanceGate,
    cooldowns: CooldownTable,
    holdoffs: CooldownTable,
}

impl Dispatcher {
    pub fn new(webhook: &WebhookConfig, alerts: &AlertConfig) -> Result<Self, DeliveryError> {
        Ok(Self {
            webhook: WebhookClient::new(webhook)?,
            gate: MaintenanceGate::new(&alerts.maintenance_flag),
            cooldowns: CooldownTable::new(Duration::from_secs(alerts.cooldown_secs)),
            holdoffs: CooldownTable::new(Duration::from_secs(alerts.failure_holdoff_secs)),
        })
    }

    pub fn cooldowns(&self) -> &CooldownTable {
        &self.cooldowns
    }

    pub fn holdoffs(&self) -> &CooldownTable {
        &self.holdoffs
    }

    pub fn gate(&self) -> &MaintenanceGate {
        &self.gate
    }

    /// Gate, rate-limit and deliver one candidate. Never fails the caller.
    pub async fn dispatch(&mut self, candidate: &AlertCandidate) -> DispatchOutcome {
        let kind = candidate.kind();
        let message = candidate.message();

        let outcome = if self.gate.is_active() {
            tracing::info!(alert = %kind, message = %message, "Maintenance mode active; suppressing alert");
            DispatchOutcome::Maintenance
        } else {
            let now = Instant::now();
            if let Some(remaining) = self.cooldowns.remaining(kind, now) {
                tracing::debug!(alert = %kind, remaining = ?remaining, "Alert in cooldown; dropping");
                DispatchOutcome::CoolingDown { remaining }
            } else if let Some(remaining) = self.holdoffs.remaining(kind, now) {
                tracing::debug!(alert = %kind, remaining = ?remaining, "Webhook failed recently; skipping delivery");
                DispatchOutcome::HeldOff { remaining }
            } else {
                let payload = AlertPayload::from_candidate(candidate);
                match self.webhook.deliver(&payload).await {
                    Ok(attempts) => {
                        self.cooldowns.mark_sent(kind, now);
                        tracing::info!(alert = %kind, alert_id = %payload.id, attempts, message = %message, "Sent alert");
                        DispatchOutcome::Delivered { attempts }
                    }
                    Err(e) => {
                        self.holdoffs.mark_sent(kind, Instant::now());
                        tracing::error!(alert = %kind, alert_id = %payload.id, error = %e, message = %message, "Failed to send alert");
                        DispatchOutcome::Failed(e)
                    }
                }
            }
        };

        metrics::record_alert(kind, outcome.label());
        outcome
    }
}
