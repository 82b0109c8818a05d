//! Integration tests: g-values of well known EPR standards at common bands.

use eprtools::{
    convert_all, field_from_g_value, fields_from_g_values, g_value, g_values, EprError,
    FieldUnit, Spectrum,
};

/// Helper: assert float equality within tolerance
fn assert_approx(actual: f64, expected: f64, tol: f64, msg: &str) {
    assert!(
        (actual - expected).abs() < tol,
        "{msg}: expected {expected:.5}, got {actual:.5}"
    );
}

/// DPPH (g = 2.0036) resonates near 338 mT at X-band and near 1.2 T at Q/W-band.
#[test]
fn dpph_standard_across_bands() {
    let g_dpph = 2.0036;

    let x_band = field_from_g_value(g_dpph, 9.5e9).unwrap();
    assert_approx(x_band, 0.33876, 1e-4, "X-band DPPH field");

    let q_band = field_from_g_value(g_dpph, 34.0e9).unwrap();
    assert_approx(q_band, 1.2124, 1e-3, "Q-band DPPH field");

    // field scales linearly with frequency at fixed g
    assert_approx(q_band / x_band, 34.0 / 9.5, 1e-12, "Field ratio");
}

/// Axial Cu(II): g_parallel ≈ 2.25 sits at lower field than g_perpendicular ≈ 2.05.
#[test]
fn copper_axial_g_tensor() {
    let freq = 9.48314e9;
    let fields = fields_from_g_values(&[2.25, 2.05], freq).unwrap();
    assert!(fields[0] < fields[1]);

    let gauss = convert_all(&fields, FieldUnit::Tesla, FieldUnit::Gauss);
    assert_approx(gauss[0], 3011.4, 1.0, "g_parallel field (G)");
    assert_approx(gauss[1], 3305.2, 1.0, "g_perpendicular field (G)");

    let back = g_values(&fields, freq).unwrap();
    assert_approx(back[0], 2.25, 1e-12, "g_parallel round trip");
    assert_approx(back[1], 2.05, 1e-12, "g_perpendicular round trip");
}

/// A sweep that starts at 0 G cannot be mapped to g-values as a whole.
#[test]
fn sweep_from_zero_field_is_explicit() {
    let sweep_gauss = [0.0, 1000.0, 2000.0];
    let tesla = convert_all(&sweep_gauss, FieldUnit::Gauss, FieldUnit::Tesla);
    match g_values(&tesla, 9.48e9) {
        Err(EprError::AtElement { index, .. }) => assert_eq!(index, 0),
        other => panic!("expected a singularity at index 0, got {other:?}"),
    }
    assert!(matches!(g_value(0.0, 9.48e9), Err(EprError::ZeroField)));
}

/// The radical fixture crosses zero at its centre field, 3385 G.
#[test]
fn radical_fixture_centre() {
    let spectrum = Spectrum::from_bruker_ascii(std::path::Path::new("files/radical.txt")).unwrap();
    assert_eq!(spectrum.unit, FieldUnit::Gauss);
    assert_eq!(spectrum.len(), 81);
    assert_eq!(spectrum.field_range_in(FieldUnit::Gauss), Some((3345.0, 3425.0)));

    let centre = spectrum
        .measurements
        .iter()
        .find(|m| m.field == 3385.0)
        .unwrap();
    assert_eq!(centre.intensity, 0.0);

    let g = g_value(0.3385, 9.48314e9).unwrap();
    assert_approx(g, 2.00162, 1e-5, "Radical g-value");
}
