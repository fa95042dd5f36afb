//! The draft model and saga stage ordering.

use chrono::{DateTime, Utc};
use common::{AppointmentId, ClientId, InvoiceId};
use serde::{Deserialize, Serialize};

use crate::form::FormData;
use crate::{DraftId, DraftStoreError};

/// A step of the creation saga.
///
/// Variants are declared in pipeline order, so `Ord` follows the saga:
/// ```text
/// Client ──► Appointment ──► Products ──► Invoice ──► Payment ──► Completed
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Client,
    Appointment,
    Products,
    Invoice,
    Payment,
    /// Terminal: the payment stage succeeded.
    Completed,
}

impl Stage {
    /// The stages a caller can advance through, in order.
    pub const PIPELINE: [Stage; 5] = [
        Stage::Client,
        Stage::Appointment,
        Stage::Products,
        Stage::Invoice,
        Stage::Payment,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Client => "client",
            Stage::Appointment => "appointment",
            Stage::Products => "products",
            Stage::Invoice => "invoice",
            Stage::Payment => "payment",
            Stage::Completed => "completed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = DraftStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Stage::Client),
            "appointment" => Ok(Stage::Appointment),
            "products" => Ok(Stage::Products),
            "invoice" => Ok(Stage::Invoice),
            "payment" => Ok(Stage::Payment),
            "completed" => Ok(Stage::Completed),
            other => Err(DraftStoreError::UnknownStage(other.to_string())),
        }
    }
}

/// Resumable snapshot of one creation saga run.
///
/// `stage` is the highest stage successfully persisted, not the screen the
/// user is looking at. It never moves backwards, and `client_id` is never
/// replaced once set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: DraftId,
    pub stage: Stage,
    pub client_id: Option<ClientId>,
    pub appointment_id: Option<AppointmentId>,
    pub invoice_id: Option<InvoiceId>,
    pub form_data: FormData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Draft {
    /// Starts a draft that has not persisted any stage yet.
    pub fn new(form_data: FormData) -> Self {
        let now = Utc::now();
        Self {
            id: DraftId::new(),
            stage: Stage::Client,
            client_id: None,
            appointment_id: None,
            invoice_id: None,
            form_data,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Records that `stage` has been persisted. Never lowers the stage.
    pub fn mark_persisted(&mut self, stage: Stage) {
        self.stage = self.stage.max(stage);
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering_follows_pipeline() {
        assert!(Stage::Client < Stage::Appointment);
        assert!(Stage::Appointment < Stage::Products);
        assert!(Stage::Products < Stage::Invoice);
        assert!(Stage::Invoice < Stage::Payment);
        assert!(Stage::Payment < Stage::Completed);
    }

    #[test]
    fn test_stage_round_trips_through_str() {
        for stage in Stage::PIPELINE.into_iter().chain([Stage::Completed]) {
            assert_eq!(stage.as_str().parse::<Stage>().unwrap(), stage);
        }
        assert!("shipping".parse::<Stage>().is_err());
    }

    #[test]
    fn test_mark_persisted_never_regresses() {
        let mut draft = Draft::new(FormData::default());
        draft.mark_persisted(Stage::Invoice);
        draft.mark_persisted(Stage::Appointment);
        assert_eq!(draft.stage, Stage::Invoice);
        assert!(!draft.is_completed());

        draft.mark_persisted(Stage::Completed);
        assert!(draft.is_completed());
    }

    #[test]
    fn test_stage_serializes_lowercase() {
        let json = serde_json::to_string(&Stage::Products).unwrap();
        assert_eq!(json, "\"products\"");
    }
}
