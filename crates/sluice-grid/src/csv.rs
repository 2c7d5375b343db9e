//! The field-configuration CSV schema.
//!
//! Header row required; columns `Name, Radius, SW, X, Y, Z` in any
//! order, all values as decimal strings. `Radius` cells may be empty
//! (the default radius applies). Unknown columns are rejected at parse
//! time rather than carried along untyped.
//!
//! No quoting or escaping: field names must not contain the separator.
//! [`write_csv`] emits the canonical column order, so a written file
//! parses back to identical records.

use crate::config::{FieldConfig, DEFAULT_RADIUS};
use crate::error::ConfigError;

/// The schema's column names, in canonical write order.
pub const COLUMNS: [&str; 6] = ["Name", "Radius", "SW", "X", "Y", "Z"];

/// Parse configuration records from CSV text.
pub fn parse_csv(text: &str) -> Result<Vec<FieldConfig>, ConfigError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (_, header) = lines.next().ok_or(ConfigError::MissingHeader)?;
    let names: Vec<&str> = header.split(',').map(str::trim).collect();
    for (i, name) in names.iter().enumerate() {
        if !COLUMNS.contains(name) {
            return Err(ConfigError::UnknownColumn {
                column: (*name).to_string(),
            });
        }
        if names[..i].contains(name) {
            return Err(ConfigError::DuplicateColumn {
                column: (*name).to_string(),
            });
        }
    }
    let mut index = [0usize; 6];
    for (slot, column) in index.iter_mut().zip(COLUMNS) {
        *slot = names
            .iter()
            .position(|n| *n == column)
            .ok_or_else(|| ConfigError::MissingColumn {
                column: column.to_string(),
            })?;
    }
    let [name_at, radius_at, sw_at, x_at, y_at, z_at] = index;

    let mut configs = Vec::new();
    for (line, row) in lines {
        let cells: Vec<&str> = row.split(',').map(str::trim).collect();
        if cells.len() != names.len() {
            return Err(ConfigError::RowLength {
                line,
                expected: names.len(),
                got: cells.len(),
            });
        }
        let name = cells[name_at];
        if name.is_empty() {
            return Err(invalid(line, "Name", name));
        }
        let radius = match cells[radius_at] {
            "" => DEFAULT_RADIUS,
            text => parse_float(text)
                .filter(|r| *r > 0.0)
                .ok_or_else(|| invalid(line, "Radius", text))?,
        };
        let sw = parse_float(cells[sw_at])
            .filter(|v| *v >= 0.0)
            .ok_or_else(|| invalid(line, "SW", cells[sw_at]))?;
        let x = parse_coord(cells[x_at]).ok_or_else(|| invalid(line, "X", cells[x_at]))?;
        let y = parse_coord(cells[y_at]).ok_or_else(|| invalid(line, "Y", cells[y_at]))?;
        let z = parse_float(cells[z_at]).ok_or_else(|| invalid(line, "Z", cells[z_at]))?;
        configs.push(FieldConfig {
            name: name.to_string(),
            x,
            y,
            z,
            sw,
            radius,
        });
    }
    Ok(configs)
}

/// Render configuration records in the canonical schema.
///
/// Fails with [`ConfigError::BadName`] for names the schema cannot
/// carry (separator or line-break characters).
pub fn write_csv(configs: &[FieldConfig]) -> Result<String, ConfigError> {
    let mut out = String::new();
    out.push_str(&COLUMNS.join(","));
    out.push('\n');
    for config in configs {
        if config.name.contains(',') || config.name.contains('\n') || config.name.is_empty() {
            return Err(ConfigError::BadName {
                name: config.name.clone(),
            });
        }
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            config.name, config.radius, config.sw, config.x, config.y, config.z
        ));
    }
    Ok(out)
}

/// A finite float from a decimal string.
fn parse_float(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A non-negative integer grid coordinate. Decimal renderings of
/// integers (`"1.0"`) are accepted; fractional values are not.
fn parse_coord(text: &str) -> Option<u32> {
    let value = parse_float(text)?;
    if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return None;
    }
    Some(value as u32)
}

fn invalid(line: usize, column: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        line,
        column: column.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sluice_core::CellCoord;

    const SAMPLE: &str = "\
Name,Radius,SW,X,Y,Z
north,1.0,0.2,0,0,3.5
south,2.5,0.3,1.0,0,4
east,,0.25,0,1,0
";

    #[test]
    fn parses_the_sample() {
        let configs = parse_csv(SAMPLE).unwrap();
        assert_eq!(configs.len(), 3);
        assert_eq!(configs[0].name, "north");
        assert_eq!(configs[1].coord(), CellCoord::new(1, 0));
        assert_eq!(configs[1].z, 4.0);
        // Empty radius cell takes the default.
        assert_eq!(configs[2].radius, DEFAULT_RADIUS);
    }

    #[test]
    fn header_order_is_free() {
        let text = "X,Y,Name,Z,SW,Radius\n3,4,west,0,0.1,2\n";
        let configs = parse_csv(text).unwrap();
        assert_eq!(configs[0].name, "west");
        assert_eq!(configs[0].coord(), CellCoord::new(3, 4));
        assert_eq!(configs[0].radius, 2.0);
    }

    #[test]
    fn empty_input_is_missing_header() {
        assert_eq!(parse_csv(""), Err(ConfigError::MissingHeader));
        assert_eq!(parse_csv("\n\n"), Err(ConfigError::MissingHeader));
    }

    #[test]
    fn unknown_column_is_rejected() {
        let text = "Name,Radius,SW,X,Y,Z,Bird\nduck,1,0.1,0,0,0,quack\n";
        assert_eq!(
            parse_csv(text),
            Err(ConfigError::UnknownColumn {
                column: "Bird".to_string()
            })
        );
    }

    #[test]
    fn missing_column_is_rejected() {
        let text = "Name,Radius,SW,X,Y\nduck,1,0.1,0,0\n";
        assert_eq!(
            parse_csv(text),
            Err(ConfigError::MissingColumn {
                column: "Z".to_string()
            })
        );
    }

    #[test]
    fn short_row_is_rejected() {
        let text = "Name,Radius,SW,X,Y,Z\nduck,1,0.1,0,0\n";
        assert!(matches!(
            parse_csv(text),
            Err(ConfigError::RowLength { line: 2, .. })
        ));
    }

    #[test]
    fn fractional_coordinate_is_rejected() {
        let text = "Name,Radius,SW,X,Y,Z\nduck,1,0.1,0.5,0,0\n";
        assert_eq!(
            parse_csv(text),
            Err(ConfigError::InvalidValue {
                line: 2,
                column: "X".to_string(),
                value: "0.5".to_string(),
            })
        );
    }

    #[test]
    fn negative_and_non_numeric_values_are_rejected() {
        for (row, column) in [
            ("duck,-1,0.1,0,0,0", "Radius"),
            ("duck,1,-0.1,0,0,0", "SW"),
            ("duck,1,0.1,-1,0,0", "X"),
            ("duck,1,0.1,0,west,0", "Y"),
            ("duck,1,0.1,0,0,tall", "Z"),
        ] {
            let text = format!("Name,Radius,SW,X,Y,Z\n{row}\n");
            match parse_csv(&text) {
                Err(ConfigError::InvalidValue { column: c, .. }) => assert_eq!(c, column),
                other => panic!("expected InvalidValue for {column}, got {other:?}"),
            }
        }
    }

    #[test]
    fn write_then_parse_reproduces_records() {
        let configs = parse_csv(SAMPLE).unwrap();
        let text = write_csv(&configs).unwrap();
        assert_eq!(parse_csv(&text).unwrap(), configs);
    }

    #[test]
    fn write_rejects_unrepresentable_names() {
        let mut configs = parse_csv(SAMPLE).unwrap();
        configs[0].name = "north,west".to_string();
        assert!(matches!(
            write_csv(&configs),
            Err(ConfigError::BadName { .. })
        ));
    }

    // ── Property tests ──────────────────────────────────────────

    fn arb_config() -> impl Strategy<Value = FieldConfig> {
        (
            "[a-zA-Z][a-zA-Z0-9_-]{0,11}",
            0u32..64,
            0u32..64,
            -1000.0f64..1000.0,
            0.0f64..1.0,
            0.1f64..50.0,
        )
            .prop_map(|(name, x, y, z, sw, radius)| FieldConfig {
                name,
                x,
                y,
                z,
                sw,
                radius,
            })
    }

    proptest! {
        #[test]
        fn csv_roundtrip(configs in prop::collection::vec(arb_config(), 0..12)) {
            let text = write_csv(&configs).unwrap();
            prop_assert_eq!(parse_csv(&text).unwrap(), configs);
        }
    }
}
