//! Wizard state machine: which step the client is on and whether the form
//! has been handed off for submission.

use serde::{Deserialize, Serialize};

/// The five ordered steps of the onboarding form.
///
/// Progresses linearly: Contact → BrandIdentity → Strategy →
/// DigitalEcosystem → Closeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Contact,
    BrandIdentity,
    Strategy,
    DigitalEcosystem,
    Closeout,
}

/// Total number of steps in the wizard.
pub const TOTAL_STEPS: u8 = 5;

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        Self::Contact,
        Self::BrandIdentity,
        Self::Strategy,
        Self::DigitalEcosystem,
        Self::Closeout,
    ];

    /// Convert a 1-based step number.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Contact),
            2 => Some(Self::BrandIdentity),
            3 => Some(Self::Strategy),
            4 => Some(Self::DigitalEcosystem),
            5 => Some(Self::Closeout),
            _ => None,
        }
    }

    /// 1-based step number.
    pub fn number(self) -> u8 {
        match self {
            Self::Contact => 1,
            Self::BrandIdentity => 2,
            Self::Strategy => 3,
            Self::DigitalEcosystem => 4,
            Self::Closeout => 5,
        }
    }

    /// Card title shown for the step.
    pub fn label(self) -> &'static str {
        match self {
            Self::Contact => "Datos de Identificación",
            Self::BrandIdentity => "ADN de Marca",
            Self::Strategy => "Estrategia y Objetivos",
            Self::DigitalEcosystem => "Ecosistema Digital",
            Self::Closeout => "Cierre Operativo",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn prev(self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }

    pub fn is_last(self) -> bool {
        self == Self::Closeout
    }

    /// Progress bar value, 20..=100.
    pub fn progress_percent(self) -> u8 {
        let percent = u16::from(self.number()) * 100 / u16::from(TOTAL_STEPS);
        u8::try_from(percent).unwrap_or(100)
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Contact => "contact",
            Self::BrandIdentity => "brand_identity",
            Self::Strategy => "strategy",
            Self::DigitalEcosystem => "digital_ecosystem",
            Self::Closeout => "closeout",
        };
        write!(f, "{s}")
    }
}

/// Where the wizard currently is.
///
/// `Failed` is not terminal: it keeps the record and permits another
/// `confirm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "step", rename_all = "snake_case")]
pub enum WizardState {
    Step(WizardStep),
    Submitting,
    Submitted,
    Failed,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::Step(WizardStep::Contact)
    }
}

impl WizardState {
    /// The step being edited, if any. `Failed` reports the closing step.
    pub fn step(&self) -> Option<WizardStep> {
        match self {
            Self::Step(step) => Some(*step),
            Self::Failed => Some(WizardStep::Closeout),
            Self::Submitting | Self::Submitted => None,
        }
    }

    /// Whether the record may still be edited.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Step(_) | Self::Failed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted)
    }
}

impl std::fmt::Display for WizardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Step(step) => write!(f, "step {} ({step})", step.number()),
            Self::Submitting => write!(f, "submitting"),
            Self::Submitted => write!(f, "submitted"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_round_trip() {
        for step in WizardStep::ALL {
            assert_eq!(WizardStep::from_number(step.number()), Some(step));
        }
        assert_eq!(WizardStep::from_number(0), None);
        assert_eq!(WizardStep::from_number(6), None);
    }

    #[test]
    fn next_walks_all_steps() {
        let mut current = WizardStep::Contact;
        let mut visited = vec![current];
        while let Some(next) = current.next() {
            visited.push(next);
            current = next;
        }
        assert_eq!(visited, WizardStep::ALL.to_vec());
        assert!(current.is_last());
    }

    #[test]
    fn prev_stops_at_first_step() {
        assert_eq!(WizardStep::Contact.prev(), None);
        assert_eq!(WizardStep::Closeout.prev(), Some(WizardStep::DigitalEcosystem));
    }

    #[test]
    fn progress_percent() {
        assert_eq!(WizardStep::Contact.progress_percent(), 20);
        assert_eq!(WizardStep::Strategy.progress_percent(), 60);
        assert_eq!(WizardStep::Closeout.progress_percent(), 100);

        let all: Vec<u8> = WizardStep::ALL.into_iter().map(WizardStep::progress_percent).collect();
        assert_eq!(all, [20, 40, 60, 80, 100]);
    }

    #[test]
    fn display_matches_serde() {
        for step in WizardStep::ALL {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{step}\""), json);
        }
    }

    #[test]
    fn default_state_is_first_step() {
        assert_eq!(WizardState::default(), WizardState::Step(WizardStep::Contact));
    }

    #[test]
    fn state_serializes_with_status_tag() {
        let json = serde_json::to_value(WizardState::Step(WizardStep::Strategy)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "step", "step": "strategy"}));

        let json = serde_json::to_value(WizardState::Submitting).unwrap();
        assert_eq!(json, serde_json::json!({"status": "submitting"}));
    }

    #[test]
    fn editability() {
        assert!(WizardState::Step(WizardStep::Contact).is_editable());
        assert!(WizardState::Failed.is_editable());
        assert!(!WizardState::Submitting.is_editable());
        assert!(!WizardState::Submitted.is_editable());
        assert!(WizardState::Submitted.is_terminal());
        assert!(!WizardState::Failed.is_terminal());
    }
}
