use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::error::EprError;
use crate::spectrum::{min_max, MultiSpectrum, Spectrum};
use crate::units::{field_from_g_value, g_value, FieldUnit};

/// Trace colours, cycled when a plot has more series than entries.
pub const RAINBOW: [&str; 20] = [
    "#e71d43", "#ff0000", "#ff3700", "#ff6e00", "#ffa500", "#ffc300", "#ffe100", "#ffff00",
    "#aad500", "#55aa00", "#008000", "#005555", "#002baa", "#0000ff", "#1900d5", "#3200ac",
    "#4b0082", "#812ba6", "#b857ca", "#d03a87",
];

const WIDTH: f64 = 900.0;
const HEIGHT: f64 = 540.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 80.0;
const MARGIN_BOTTOM: f64 = 60.0;
const TICK_COUNT: usize = 8;
const TICK_LENGTH: f64 = 6.0;

/// One line on the plot. Fields are kept in Tesla so any axis unit can be drawn.
#[derive(Clone, Debug)]
pub struct Series {
    pub label: String,
    pub fields_tesla: Vec<f64>,
    pub intensities: Vec<f64>,
}

impl From<&Spectrum> for Series {
    fn from(spectrum: &Spectrum) -> Series {
        Series {
            label: spectrum.name.clone(),
            fields_tesla: spectrum.fields_in(FieldUnit::Tesla),
            intensities: spectrum.intensities(),
        }
    }
}

impl MultiSpectrum {
    pub fn series(&self) -> Vec<Series> {
        let fields_tesla = self.fields_in(FieldUnit::Tesla);
        self.traces
            .iter()
            .map(|trace| Series {
                label: trace.name.clone(),
                fields_tesla: fields_tesla.clone(),
                intensities: trace.intensities.clone(),
            })
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct SpectrumPlot {
    pub title: String,
    pub frequency_hz: f64,
    pub unit: FieldUnit, // unit of the bottom axis
    pub series: Vec<Series>,
    pub g_markers: Vec<f64>, // vertical reference lines, as g-values
}

/// Axis ticks on a 1-2-5 grid covering `[min, max]`.
pub fn nice_ticks(min: f64, max: f64, count: usize) -> Vec<f64> {
    let span = max - min;
    if !span.is_finite() || span <= 0.0 || count == 0 {
        return vec![min];
    }
    let step = nice_step(span / count as f64);
    let first = (min / step).ceil() as i64;
    let last = (max / step + 1e-9).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized < 1.5 {
        1.0
    } else if normalized < 3.0 {
        2.0
    } else if normalized < 7.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn format_tick(value: f64, ticks: &[f64]) -> String {
    let step = match ticks {
        [a, b, ..] => (b - a).abs(),
        _ => return format!("{}", value),
    };
    let decimals = (-step.log10().floor()).max(0.0) as usize;
    format!("{:.*}", decimals, value)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// widen a degenerate range so a single point still gets an axis
fn padded(range: (f64, f64), pad_fraction: f64) -> (f64, f64) {
    let (lo, hi) = range;
    if hi - lo <= 0.0 {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * pad_fraction;
    (lo - pad, hi + pad)
}

struct Frame {
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl Frame {
    fn x(&self, value: f64) -> f64 {
        let (lo, hi) = self.x_range;
        MARGIN_LEFT + (value - lo) / (hi - lo) * (WIDTH - MARGIN_LEFT - MARGIN_RIGHT)
    }

    fn y(&self, value: f64) -> f64 {
        let (lo, hi) = self.y_range;
        HEIGHT - MARGIN_BOTTOM - (value - lo) / (hi - lo) * (HEIGHT - MARGIN_TOP - MARGIN_BOTTOM)
    }

    fn contains_x(&self, value: f64) -> bool {
        value >= self.x_range.0 && value <= self.x_range.1
    }
}

/// g-value label for a field tick; blank where the field is zero.
fn g_label(field: f64, unit: FieldUnit, frequency_hz: f64) -> Result<String, EprError> {
    match g_value(unit.to_tesla(field), frequency_hz) {
        Ok(g) => Ok(format!("{:.3}", g)),
        Err(EprError::ZeroField) => Ok(String::new()),
        Err(e) => Err(e),
    }
}

pub fn render_html<W: Write>(plot: &SpectrumPlot, out: &mut W) -> Result<(), EprError> {
    let unit = plot.unit;
    let fields: Vec<Vec<f64>> = plot
        .series
        .iter()
        .map(|s| crate::units::convert_all(&s.fields_tesla, FieldUnit::Tesla, unit))
        .collect();
    let all_fields: Vec<f64> = fields.iter().flatten().copied().collect();
    let all_intensities: Vec<f64> = plot
        .series
        .iter()
        .flat_map(|s| s.intensities.iter().copied())
        .collect();

    let x_range = min_max(&all_fields).ok_or_else(|| EprError::EmptySpectrum(plot.title.clone()))?;
    let y_range = min_max(&all_intensities).ok_or_else(|| EprError::EmptySpectrum(plot.title.clone()))?;
    let frame = Frame {
        x_range: if x_range.1 > x_range.0 { x_range } else { padded(x_range, 0.0) },
        y_range: padded(y_range, 0.05),
    };
    debug!("plot frame x {:?} {} y {:?}", frame.x_range, unit, frame.y_range);

    let left = MARGIN_LEFT;
    let right = WIDTH - MARGIN_RIGHT;
    let top = MARGIN_TOP;
    let bottom = HEIGHT - MARGIN_BOTTOM;

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html>")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"utf-8\">")?;
    writeln!(out, "<title>{}</title>", escape(&plot.title))?;
    writeln!(out, "<style>")?;
    writeln!(out, "body {{ font-family: sans-serif; }}")?;
    writeln!(out, "svg text {{ font-size: 12px; }}")?;
    writeln!(out, ".axis-label {{ font-size: 14px; }}")?;
    writeln!(out, "table {{ border-collapse: collapse; }}")?;
    writeln!(
        out,
        "th, td {{ border: 1px solid #ddd; padding: 6px; text-align: left; }}"
    )?;
    writeln!(out, "</style>")?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, "<h1>{}</h1>", escape(&plot.title))?;
    writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">",
        WIDTH, HEIGHT, WIDTH, HEIGHT
    )?;
    writeln!(
        out,
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"none\" stroke=\"black\" stroke-width=\"1.25\"/>",
        left,
        top,
        right - left,
        bottom - top
    )?;

    // field axis (bottom) and g-value axis (top) share the same tick positions
    let x_ticks = nice_ticks(frame.x_range.0, frame.x_range.1, TICK_COUNT);
    writeln!(out, "<g class=\"field-axis\">")?;
    for &tick in x_ticks.iter().filter(|&&t| frame.contains_x(t)) {
        let x = frame.x(tick);
        writeln!(
            out,
            "<line x1=\"{x:.2}\" y1=\"{top:.2}\" x2=\"{x:.2}\" y2=\"{bottom:.2}\" stroke=\"grey\" stroke-width=\"0.3\" stroke-dasharray=\"4 2\"/>"
        )?;
        writeln!(
            out,
            "<line x1=\"{x:.2}\" y1=\"{bottom:.2}\" x2=\"{x:.2}\" y2=\"{:.2}\" stroke=\"black\"/>",
            bottom - TICK_LENGTH
        )?;
        writeln!(
            out,
            "<text x=\"{x:.2}\" y=\"{:.2}\" text-anchor=\"middle\">{}</text>",
            bottom + 18.0,
            format_tick(tick, &x_ticks)
        )?;
    }
    writeln!(
        out,
        "<text class=\"axis-label\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\">Magnetic field ({})</text>",
        (left + right) / 2.0,
        HEIGHT - 15.0,
        unit
    )?;
    writeln!(out, "</g>")?;

    writeln!(out, "<g class=\"g-axis\">")?;
    for &tick in x_ticks.iter().filter(|&&t| frame.contains_x(t)) {
        let x = frame.x(tick);
        writeln!(
            out,
            "<line x1=\"{x:.2}\" y1=\"{top:.2}\" x2=\"{x:.2}\" y2=\"{:.2}\" stroke=\"black\"/>",
            top + TICK_LENGTH
        )?;
        writeln!(
            out,
            "<text x=\"{x:.2}\" y=\"{:.2}\" text-anchor=\"middle\">{}</text>",
            top - 8.0,
            g_label(tick, unit, plot.frequency_hz)?
        )?;
    }
    writeln!(
        out,
        "<text class=\"axis-label\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\">g-value</text>",
        (left + right) / 2.0,
        top - 35.0
    )?;
    writeln!(out, "</g>")?;

    // intensity is in arbitrary units, so the y axis carries ticks but no labels
    writeln!(out, "<g class=\"intensity-axis\">")?;
    let y_ticks = nice_ticks(frame.y_range.0, frame.y_range.1, 6);
    for &tick in &y_ticks {
        let y = frame.y(tick);
        writeln!(
            out,
            "<line x1=\"{left:.2}\" y1=\"{y:.2}\" x2=\"{right:.2}\" y2=\"{y:.2}\" stroke=\"grey\" stroke-width=\"0.3\" stroke-dasharray=\"4 2\"/>"
        )?;
        writeln!(
            out,
            "<line x1=\"{left:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{y:.2}\" stroke=\"black\"/>",
            left + TICK_LENGTH
        )?;
        writeln!(
            out,
            "<line x1=\"{:.2}\" y1=\"{y:.2}\" x2=\"{right:.2}\" y2=\"{y:.2}\" stroke=\"black\"/>",
            right - TICK_LENGTH
        )?;
    }
    writeln!(
        out,
        "<text class=\"axis-label\" x=\"20\" y=\"{:.2}\" text-anchor=\"middle\" transform=\"rotate(-90 20 {:.2})\">EPR signal intensity (a.u.)</text>",
        (top + bottom) / 2.0,
        (top + bottom) / 2.0
    )?;
    writeln!(out, "</g>")?;

    for (i, (series, xs)) in plot.series.iter().zip(&fields).enumerate() {
        let colour = RAINBOW[i % RAINBOW.len()];
        let points: Vec<String> = xs
            .iter()
            .zip(&series.intensities)
            .map(|(&x, &y)| format!("{:.2},{:.2}", frame.x(x), frame.y(y)))
            .collect();
        writeln!(
            out,
            "<polyline class=\"trace\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.2\" points=\"{}\"><title>{}</title></polyline>",
            colour,
            points.join(" "),
            escape(&series.label)
        )?;
    }

    for &g in &plot.g_markers {
        let field = unit.from_tesla(field_from_g_value(g, plot.frequency_hz)?);
        if !frame.contains_x(field) {
            debug!("g = {} marker at {} {} is outside the plot", g, field, unit);
            continue;
        }
        let x = frame.x(field);
        writeln!(
            out,
            "<line class=\"g-marker\" x1=\"{x:.2}\" y1=\"{top:.2}\" x2=\"{x:.2}\" y2=\"{bottom:.2}\" stroke=\"red\" stroke-width=\"0.8\" stroke-dasharray=\"6 3 2 3\"/>"
        )?;
        writeln!(
            out,
            "<text x=\"{:.2}\" y=\"{:.2}\" fill=\"red\">g = {}</text>",
            x + 4.0,
            top + 20.0,
            g
        )?;
    }

    if plot.series.len() > 1 {
        writeln!(out, "<g class=\"legend\">")?;
        for (i, series) in plot.series.iter().enumerate() {
            let y = top + 20.0 + i as f64 * 16.0;
            let x = right - 160.0;
            writeln!(
                out,
                "<line x1=\"{x:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{y:.2}\" stroke=\"{}\" stroke-width=\"2\"/>",
                x + 20.0,
                RAINBOW[i % RAINBOW.len()]
            )?;
            writeln!(
                out,
                "<text x=\"{:.2}\" y=\"{:.2}\">{}</text>",
                x + 26.0,
                y + 4.0,
                escape(&series.label)
            )?;
        }
        writeln!(out, "</g>")?;
    }

    writeln!(out, "</svg>")?;

    writeln!(out, "<h2>Acquisition</h2>")?;
    writeln!(out, "<table>")?;
    writeln!(out, "<tr><th>Parameter</th><th>Value</th><th>Unit</th></tr>")?;
    writeln!(
        out,
        "<tr><td>Microwave frequency</td><td>{:.5}</td><td>GHz</td></tr>",
        plot.frequency_hz / crate::constants::HZ_PER_GHZ
    )?;
    writeln!(
        out,
        "<tr><td>Field range</td><td>{} to {}</td><td>{}</td></tr>",
        x_range.0, x_range.1, unit
    )?;
    writeln!(out, "<tr><td>Traces</td><td>{}</td><td></td></tr>", plot.series.len())?;
    writeln!(out, "</table>")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;

    Ok(())
}

pub fn generate_html_plot(plot: &SpectrumPlot, output_path: &Path) -> Result<(), EprError> {
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    render_html(plot, &mut writer)?;
    writer.flush()?;
    info!("Plot for {} written to {}", plot.title, output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::Measurement;

    fn sample_plot() -> SpectrumPlot {
        let spectrum = Spectrum::new(
            "radical",
            FieldUnit::Gauss,
            (0..=40)
                .map(|i| Measurement {
                    field: 3300.0 + 5.0 * i as f64,
                    intensity: ((i as f64) - 20.0).sin(),
                })
                .collect(),
        );
        SpectrumPlot {
            title: "radical".to_string(),
            frequency_hz: 9.48314e9,
            unit: FieldUnit::MilliTesla,
            series: vec![Series::from(&spectrum)],
            g_markers: vec![2.0023],
        }
    }

    fn render(plot: &SpectrumPlot) -> String {
        let mut out = Vec::new();
        render_html(plot, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn ticks_on_one_two_five_grid() {
        assert_eq!(nice_ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(nice_ticks(330.0, 350.0, 4), vec![330.0, 335.0, 340.0, 345.0, 350.0]);
        assert_eq!(nice_ticks(1.0, 1.0, 4), vec![1.0]);
        assert!(nice_ticks(330.0, 350.0, 8).contains(&340.0));
    }

    #[test]
    fn both_axes_rendered() {
        let html = render(&sample_plot());
        assert!(html.contains("Magnetic field (mT)"));
        assert!(html.contains("g-value"));
        assert!(html.contains("EPR signal intensity"));
        // 340 mT is a tick for a 330-350 mT sweep; its top label is the g-value there
        let g = g_value(FieldUnit::MilliTesla.to_tesla(340.0), 9.48314e9).unwrap();
        assert!(html.contains(&format!(">{:.3}<", g)), "{html}");
        assert_eq!(html.matches("class=\"trace\"").count(), 1);
        assert!(!html.contains("class=\"legend\""));
    }

    #[test]
    fn marker_inside_range() {
        let html = render(&sample_plot());
        assert!(html.contains("class=\"g-marker\""));
        assert!(html.contains("g = 2.0023"));
    }

    #[test]
    fn marker_outside_range_skipped() {
        let mut plot = sample_plot();
        plot.g_markers = vec![4.3];
        let html = render(&plot);
        assert!(!html.contains("class=\"g-marker\""));
    }

    #[test]
    fn legend_for_several_traces() {
        let multi = MultiSpectrum::parse_csv("t", "Field,a,b\n330,1,2\n340,2,1\n").unwrap();
        let plot = SpectrumPlot {
            title: "t".to_string(),
            frequency_hz: 9.48e9,
            unit: FieldUnit::MilliTesla,
            series: multi.series(),
            g_markers: vec![],
        };
        let html = render(&plot);
        assert_eq!(html.matches("class=\"trace\"").count(), 2);
        assert!(html.contains("class=\"legend\""));
        assert!(html.contains(RAINBOW[1]));
    }

    #[test]
    fn zero_field_tick_has_blank_g_label() {
        assert_eq!(g_label(0.0, FieldUnit::Gauss, 9.48e9).unwrap(), "");
        assert_eq!(g_label(3385.0, FieldUnit::Gauss, 9.48e9).unwrap(), "2.001");
    }

    #[test]
    fn empty_plot_is_an_error() {
        let mut plot = sample_plot();
        plot.series.clear();
        let mut out = Vec::new();
        assert!(matches!(
            render_html(&plot, &mut out),
            Err(EprError::EmptySpectrum(_))
        ));
    }

    #[test]
    fn title_is_escaped() {
        let mut plot = sample_plot();
        plot.title = "Cu<II> & friends".to_string();
        let html = render(&plot);
        assert!(html.contains("Cu&lt;II&gt; &amp; friends"));
    }
}
