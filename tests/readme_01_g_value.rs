//! README example: 1. Compute a g-value

use eprtools::{field_from_g_value, g_value, FieldUnit, MagneticField};

#[test]
fn g_value_of_a_resonance_line() {
    // a line at 343.3 mT recorded at 9.63 GHz
    let g = g_value(0.3433, 9.63e9).unwrap();
    assert!((g - 2.003).abs() < 2e-3, "g = {g}");

    // the same reading typed the way `eprtools gvalue` accepts it
    let field: MagneticField = "3433G".parse().unwrap();
    assert_eq!(field.unit, FieldUnit::Gauss);
    assert_eq!(field.g_value(9.63e9).unwrap(), g);
}

#[test]
fn resonant_field_of_free_electron() {
    let tesla = field_from_g_value(2.0023, 9.48314e9).unwrap();
    assert!((tesla - 0.33839).abs() < 1e-5, "B = {tesla}");
}
