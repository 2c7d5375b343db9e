//! A registered field and its per-field engine operations.

use crate::config::FieldConfig;
use crate::error::FieldOpError;
use sluice_core::{CellCoord, EngineFieldId, WireValue};
use sluice_session::Session;

/// One simulated field: its configuration plus the engine-assigned
/// identifier.
///
/// The identifier is unset until registration succeeds and immutable
/// afterward. All engine addressing goes through the field's name (for
/// `get` path expressions) or its identifier (for `do` commands).
#[derive(Clone, Debug, PartialEq)]
pub struct FieldNode {
    config: FieldConfig,
    engine_id: Option<EngineFieldId>,
}

impl FieldNode {
    pub(crate) fn new(config: FieldConfig) -> Self {
        Self {
            config,
            engine_id: None,
        }
    }

    /// The configuration this field was built from.
    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// The field's name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The grid cell this field occupies.
    pub fn coord(&self) -> CellCoord {
        self.config.coord()
    }

    /// The engine-assigned identifier, if registration has happened.
    pub fn engine_id(&self) -> Option<EngineFieldId> {
        self.engine_id
    }

    /// Store the engine-assigned identifier. Set exactly once.
    pub(crate) fn assign_id(&mut self, id: EngineFieldId) {
        debug_assert!(
            self.engine_id.is_none(),
            "field {:?} already has an engine id",
            self.config.name
        );
        self.engine_id = Some(id);
    }

    /// Path expression for this field's runoff accumulator.
    pub fn runoff_path(&self) -> String {
        format!("[{}].Soil.Runoff", self.config.name)
    }

    /// Path expression for one soil layer's volumetric water content.
    /// Layers are addressed 1-based, matching the engine's indexing.
    pub fn vwc_path(&self, layer: u32) -> String {
        format!("[{}].Soil.Water.Volumetric({layer})", self.config.name)
    }

    /// Query this field's runoff scalar for the current step.
    pub fn runoff(&self, session: &mut Session) -> Result<f64, FieldOpError> {
        let path = self.runoff_path();
        let value = session.get(&path)?;
        numeric(&path, &value)
    }

    /// Query volumetric water content for each of `layers` soil layers,
    /// one `get` per layer. The layer count is a configuration input;
    /// it is not discovered from the engine.
    pub fn vwc(&self, session: &mut Session, layers: u32) -> Result<Vec<f64>, FieldOpError> {
        let mut readings = Vec::with_capacity(layers as usize);
        for layer in 1..=layers {
            let path = self.vwc_path(layer);
            let value = session.get(&path)?;
            readings.push(numeric(&path, &value)?);
        }
        Ok(readings)
    }

    /// Send this field an irrigation amount (a runoff share arriving
    /// from a neighbour).
    pub fn apply_irrigation(
        &self,
        session: &mut Session,
        amount: f64,
    ) -> Result<(), FieldOpError> {
        let id = self.require_id()?;
        session.do_command(
            "applyIrrigation",
            &[
                WireValue::from("amount"),
                WireValue::Float(amount),
                WireValue::from("field"),
                WireValue::Int(id.0 as i64),
            ],
        )?;
        Ok(())
    }

    /// Irrigate this field as a scheduled intervention, carrying the
    /// application depth alongside the amount.
    pub fn irrigate(
        &self,
        session: &mut Session,
        depth: f64,
        amount: f64,
    ) -> Result<(), FieldOpError> {
        let id = self.require_id()?;
        session.do_command(
            "applyIrrigation",
            &[
                WireValue::from("amount"),
                WireValue::Float(amount),
                WireValue::from("depth"),
                WireValue::Float(depth),
                WireValue::from("field"),
                WireValue::Int(id.0 as i64),
            ],
        )?;
        Ok(())
    }

    fn require_id(&self) -> Result<EngineFieldId, FieldOpError> {
        self.engine_id.ok_or_else(|| FieldOpError::Unregistered {
            name: self.config.name.clone(),
        })
    }
}

/// Interpret an engine reading as a float.
fn numeric(path: &str, value: &WireValue) -> Result<f64, FieldOpError> {
    value.as_f64().ok_or_else(|| FieldOpError::NotNumeric {
        path: path.to_string(),
        got: value.type_name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> FieldNode {
        FieldNode::new(FieldConfig {
            name: "north".to_string(),
            x: 0,
            y: 0,
            z: 0.0,
            sw: 0.2,
            radius: 1.0,
        })
    }

    #[test]
    fn paths_embed_the_field_name() {
        let node = node();
        assert_eq!(node.runoff_path(), "[north].Soil.Runoff");
        assert_eq!(node.vwc_path(3), "[north].Soil.Water.Volumetric(3)");
    }

    #[test]
    fn identifier_starts_unset() {
        let mut node = node();
        assert_eq!(node.engine_id(), None);
        node.assign_id(EngineFieldId(5));
        assert_eq!(node.engine_id(), Some(EngineFieldId(5)));
    }
}
