// Minimal SVG drawing helpers shared by the charts.
use chrono::NaiveDate;

pub const WIDTH: f64 = 960.0;
pub const HEIGHT: f64 = 480.0;
pub const PADDING: f64 = 48.0;

pub fn svg_header(title: &str) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}"><style>text{{font-family:Arial,sans-serif;font-size:11px;fill:#444}}</style><rect width="100%" height="100%" fill="#eaeaf2" /><text x="{cx:.2}" y="24" text-anchor="middle" font-size="15" fill="#222">{title}</text>"##,
        w = WIDTH,
        h = HEIGHT,
        cx = WIDTH / 2.0,
        title = escape(title)
    )
}

pub fn svg_footer() -> &'static str {
    "</svg>"
}

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Min/max of the finite values, padded by 5% so lines do not touch the frame.
pub fn extent<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<(f64, f64)> {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for v in values.into_iter().filter(|v| v.is_finite()) {
        min_v = min_v.min(*v);
        max_v = max_v.max(*v);
    }
    if !min_v.is_finite() {
        return None;
    }
    let pad = ((max_v - min_v) * 0.05).max(f64::EPSILON);
    Some((min_v - pad, max_v + pad))
}

pub fn scale_y(value: f64, min_v: f64, max_v: f64) -> f64 {
    if (max_v - min_v).abs() < f64::EPSILON {
        return HEIGHT / 2.0;
    }
    let inner = HEIGHT - 2.0 * PADDING;
    PADDING + (1.0 - (value - min_v) / (max_v - min_v)) * inner
}

pub fn x_positions(len: usize) -> Vec<f64> {
    let inner = WIDTH - 2.0 * PADDING;
    match len {
        0 => Vec::new(),
        1 => vec![PADDING + inner / 2.0],
        _ => (0..len)
            .map(|i| PADDING + inner * i as f64 / (len - 1) as f64)
            .collect(),
    }
}

/// Polyline through the defined points; gaps split the line into segments.
pub fn polyline(points: &[(f64, Option<f64>)], stroke: &str, width: f64, dash: bool) -> String {
    let dash = if dash { "6 4" } else { "0" };
    let mut out = String::new();
    for segment in points.split(|(_, y)| y.is_none()) {
        if segment.is_empty() {
            continue;
        }
        let coords = segment
            .iter()
            .filter_map(|(x, y)| y.map(|y| format!("{x:.2},{y:.2}")))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!(
            r#"<polyline fill="none" stroke="{stroke}" stroke-width="{width}" stroke-dasharray="{dash}" points="{coords}" />"#
        ));
    }
    out
}

pub fn line(x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, dash: bool) -> String {
    let dash = if dash { "6 4" } else { "0" };
    format!(
        r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{stroke}" stroke-width="1" stroke-dasharray="{dash}" />"#
    )
}

pub fn rect(x: f64, y: f64, w: f64, h: f64, fill: &str) -> String {
    format!(r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{fill}" />"#)
}

pub fn label(x: f64, y: f64, text: &str, anchor: &str) -> String {
    format!(
        r#"<text x="{x:.2}" y="{y:.2}" text-anchor="{anchor}">{}</text>"#,
        escape(text)
    )
}

/// Y-axis ticks at five evenly spaced values.
pub fn y_axis(min_v: f64, max_v: f64, decimals: usize) -> String {
    let mut out = line(PADDING, PADDING, PADDING, HEIGHT - PADDING, "#000", false);
    for step in 0..=4 {
        let value = min_v + (max_v - min_v) * step as f64 / 4.0;
        let y = scale_y(value, min_v, max_v);
        out.push_str(&line(PADDING, y, WIDTH - PADDING, y, "#ffffff", false));
        out.push_str(&label(PADDING - 6.0, y + 4.0, &format!("{:.*}", decimals, value), "end"));
    }
    out
}

/// Date axis with a label at the first row of every quarter.
pub fn time_axis(dates: &[NaiveDate], xs: &[f64]) -> String {
    use chrono::Datelike;

    let axis_y = HEIGHT - PADDING;
    let mut out = line(PADDING, axis_y, WIDTH - PADDING, axis_y, "#000", false);
    let mut last_quarter = None;
    for (date, x) in dates.iter().zip(xs) {
        let quarter = (date.year(), date.month0() / 3);
        if last_quarter != Some(quarter) {
            last_quarter = Some(quarter);
            out.push_str(&label(*x, axis_y + 16.0, &date.format("%Y-%m").to_string(), "middle"));
        }
    }
    out
}

pub fn legend(entries: &[(&str, &str)]) -> String {
    let mut out = String::new();
    let x = WIDTH - PADDING - 150.0;
    let mut y = PADDING + 14.0;
    for (text, color) in entries {
        out.push_str(&rect(x, y - 8.0, 14.0, 8.0, color));
        out.push_str(&label(x + 20.0, y, text, "start"));
        y += 16.0;
    }
    out
}
