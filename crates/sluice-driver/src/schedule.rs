//! The per-date action schedule.

use crate::error::UnknownActionError;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Interventions the driver can execute.
///
/// Operation selectors resolve to a capability when the action is
/// scheduled; an unresolvable selector never enters the schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    /// Irrigate the field at `(x, y)` with a given depth and amount.
    /// Arguments: `x, y, depth, amount`.
    Irrigate,
}

impl Capability {
    /// Resolve an operation selector.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "irrigate" => Some(Self::Irrigate),
            _ => None,
        }
    }

    /// The selector this capability answers to.
    pub fn name(self) -> &'static str {
        match self {
            Self::Irrigate => "irrigate",
        }
    }
}

/// One scheduled intervention: a resolved capability and its
/// positional arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct Action {
    capability: Capability,
    args: Vec<f64>,
}

impl Action {
    /// The capability to invoke.
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// The positional arguments, as scheduled.
    pub fn args(&self) -> &[f64] {
        &self.args
    }
}

/// A date-keyed multimap of pending actions.
///
/// Actions for one date keep their insertion order. An action is
/// consumed (removed) the first time its date is reached; the data
/// structure cannot re-trigger it even if the date were revisited.
#[derive(Clone, Debug, Default)]
pub struct Schedule {
    entries: BTreeMap<NaiveDate, Vec<Action>>,
}

impl Schedule {
    /// An empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action for `date`.
    ///
    /// Fails fast if `name` does not resolve to a capability: the error
    /// surfaces here, at schedule time, never during the run.
    pub fn add(
        &mut self,
        date: NaiveDate,
        name: &str,
        args: Vec<f64>,
    ) -> Result<(), UnknownActionError> {
        let capability = Capability::from_name(name).ok_or_else(|| UnknownActionError {
            name: name.to_string(),
        })?;
        self.entries
            .entry(date)
            .or_default()
            .push(Action { capability, args });
        Ok(())
    }

    /// Remove and return the actions pending for `date`, in insertion
    /// order. Subsequent calls for the same date return nothing.
    pub fn take(&mut self, date: NaiveDate) -> Vec<Action> {
        self.entries.remove(&date).unwrap_or_default()
    }

    /// Total number of pending actions across all dates.
    pub fn pending(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Whether any actions are pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
