//! The typed field configuration record.

use sluice_core::CellCoord;

/// Radius used when a configuration record leaves it blank.
pub const DEFAULT_RADIUS: f64 = 1.0;

/// Declarative configuration for one field, as read from the
/// configuration CSV.
///
/// All fields are validated at parse time; by the time a `FieldConfig`
/// exists its values are well-formed (finite floats, non-negative
/// integer coordinates, non-empty name).
#[derive(Clone, Debug, PartialEq)]
pub struct FieldConfig {
    /// Human-readable name, unique within a run.
    pub name: String,
    /// Grid column.
    pub x: u32,
    /// Grid row.
    pub y: u32,
    /// Elevation. Informational only; the driver never interprets it.
    pub z: f64,
    /// Initial soil water content. Used only at field creation.
    pub sw: f64,
    /// Field radius; the registration area is derived from it.
    pub radius: f64,
}

impl FieldConfig {
    /// The grid cell this field occupies.
    pub fn coord(&self) -> CellCoord {
        CellCoord::new(self.x, self.y)
    }

    /// Registration area: the square of side `2 · radius`.
    pub fn area(&self) -> f64 {
        (self.radius * 2.0) * (self.radius * 2.0)
    }

    /// The `"Key,Value"` attribute pairs sent to the engine in the
    /// `field` registration command, in a fixed order.
    pub fn registration_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("Name".to_string(), self.name.clone()),
            ("X".to_string(), self.x.to_string()),
            ("Y".to_string(), self.y.to_string()),
            ("Z".to_string(), self.z.to_string()),
            ("Area".to_string(), self.area().to_string()),
            ("SW".to_string(), self.sw.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FieldConfig {
        FieldConfig {
            name: "paddock-1".to_string(),
            x: 2,
            y: 3,
            z: 11.5,
            sw: 0.25,
            radius: 1.5,
        }
    }

    #[test]
    fn area_is_squared_diameter() {
        assert_eq!(config().area(), 9.0);
    }

    #[test]
    fn registration_pairs_are_ordered() {
        let pairs = config().registration_pairs();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Name", "X", "Y", "Z", "Area", "SW"]);
        assert_eq!(pairs[0].1, "paddock-1");
        assert_eq!(pairs[4].1, "9");
    }
}
