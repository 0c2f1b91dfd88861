//! SVG document assembly for the phrase bar charts.

use crate::ChartPanel;
use std::fmt::Write;

pub(crate) const WIDTH: u32 = 1000;
pub(crate) const PANEL_HEIGHT: u32 = 520;
pub(crate) const FOOTER_HEIGHT: u32 = 28;

const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const TITLE_SPACE: f64 = 60.0;
const LABEL_SPACE: f64 = 170.0;
const COUNT_HEADROOM: f64 = 24.0;
const GRID_LINES: u64 = 4;

const Y_AXIS_LABEL: &str = "# of times phrase appeared in comments";
const X_AXIS_LABEL: &str = "Phrases";
const FONT_FAMILY: &str = "DejaVu Sans, Arial, Helvetica, sans-serif";

/// Cool-to-warm stops: blue, light grey, red.
const PALETTE: [(f64, f64, f64); 3] = [
    (59.0, 76.0, 192.0),
    (221.0, 221.0, 221.0),
    (180.0, 4.0, 38.0),
];

pub(crate) fn document_height(panels: usize, footer: bool) -> u32 {
    let footer = if footer { FOOTER_HEIGHT } else { 0 };
    PANEL_HEIGHT * panels as u32 + footer
}

pub(crate) fn build_document(panels: &[ChartPanel], footer: Option<&str>) -> String {
    let height = document_height(panels.len(), footer.is_some());
    let mut svg = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}">"#,
        w = WIDTH,
        h = height,
        font = FONT_FAMILY,
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);

    for (index, panel) in panels.iter().enumerate() {
        write_panel(&mut svg, panel, (index as u32 * PANEL_HEIGHT) as f64);
    }

    if let Some(text) = footer {
        let _ = writeln!(
            svg,
            r##"<text x="{}" y="{}" font-size="11" fill="#777777" text-anchor="end">{}</text>"##,
            WIDTH as f64 - MARGIN_RIGHT,
            height as f64 - 10.0,
            escape_xml(text)
        );
    }

    svg.push_str("</svg>\n");
    svg
}

fn write_panel(svg: &mut String, panel: &ChartPanel, top: f64) {
    let plot_left = MARGIN_LEFT;
    let plot_right = WIDTH as f64 - MARGIN_RIGHT;
    let plot_top = top + TITLE_SPACE;
    let plot_bottom = top + PANEL_HEIGHT as f64 - LABEL_SPACE;
    let plot_width = plot_right - plot_left;
    let plot_height = plot_bottom - plot_top;

    let _ = writeln!(svg, r#"<g class="panel">"#);
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" font-size="20" font-weight="bold" text-anchor="middle">{}</text>"#,
        WIDTH as f64 / 2.0,
        top + 36.0,
        escape_xml(&panel.title())
    );

    let max = panel.bars.iter().map(|(_, count)| *count).max().unwrap_or(0).max(1);
    let scale = (plot_height - COUNT_HEADROOM) / max as f64;

    // whitegrid backdrop
    for step in 0..=GRID_LINES {
        let value = max * step / GRID_LINES;
        let y = plot_bottom - value as f64 * scale;
        let _ = writeln!(
            svg,
            r##"<line x1="{plot_left}" y1="{y:.1}" x2="{plot_right}" y2="{y:.1}" stroke="#e5e5e5" stroke-width="1"/>"##
        );
        let _ = writeln!(
            svg,
            r##"<text x="{}" y="{:.1}" font-size="12" fill="#444444" text-anchor="end">{}</text>"##,
            plot_left - 8.0,
            y + 4.0,
            value
        );
    }

    let _ = writeln!(
        svg,
        r##"<line x1="{plot_left}" y1="{plot_bottom}" x2="{plot_right}" y2="{plot_bottom}" stroke="#333333" stroke-width="1"/>"##
    );

    let y_label_x = 28.0;
    let y_label_y = (plot_top + plot_bottom) / 2.0;
    let _ = writeln!(
        svg,
        r#"<text x="{x}" y="{y:.1}" font-size="13" text-anchor="middle" transform="rotate(-90 {x} {y:.1})">{}</text>"#,
        escape_xml(Y_AXIS_LABEL),
        x = y_label_x,
        y = y_label_y,
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" font-size="13" text-anchor="middle">{}</text>"#,
        (plot_left + plot_right) / 2.0,
        top + PANEL_HEIGHT as f64 - 12.0,
        X_AXIS_LABEL
    );

    if panel.bars.is_empty() {
        let _ = writeln!(
            svg,
            r##"<text x="{}" y="{:.1}" font-size="14" fill="#777777" text-anchor="middle">No phrases found</text>"##,
            (plot_left + plot_right) / 2.0,
            (plot_top + plot_bottom) / 2.0
        );
    }

    let slot = plot_width / panel.bars.len().max(1) as f64;
    let bar_width = slot * 0.7;
    for (index, (phrase, count)) in panel.bars.iter().enumerate() {
        let center = plot_left + slot * (index as f64 + 0.5);
        let bar_height = *count as f64 * scale;
        let bar_top = plot_bottom - bar_height;
        let (r, g, b) = palette_color(index, panel.bars.len());

        let _ = writeln!(
            svg,
            r#"<rect class="bar" x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="rgb({},{},{})"/>"#,
            center - bar_width / 2.0,
            bar_top,
            bar_width,
            bar_height,
            r,
            g,
            b
        );
        let _ = writeln!(
            svg,
            r#"<text class="count" x="{:.1}" y="{:.1}" font-size="12" text-anchor="middle">{}</text>"#,
            center,
            bar_top - 6.0,
            count
        );

        let label_y = plot_bottom + 14.0;
        let _ = writeln!(
            svg,
            r#"<text class="phrase" x="{x:.1}" y="{y:.1}" font-size="12" text-anchor="end" transform="rotate(-45 {x:.1} {y:.1})">{}</text>"#,
            escape_xml(phrase),
            x = center,
            y = label_y,
        );
    }

    let _ = writeln!(svg, "</g>");
}

/// Colour for bar `index` of `total`, spread evenly from cool to warm.
pub(crate) fn palette_color(index: usize, total: usize) -> (u8, u8, u8) {
    let t = if total <= 1 {
        0.5
    } else {
        index as f64 / (total - 1) as f64
    };

    let (from, to, local) = if t <= 0.5 {
        (PALETTE[0], PALETTE[1], t * 2.0)
    } else {
        (PALETTE[1], PALETTE[2], (t - 0.5) * 2.0)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * local).round() as u8;
    (mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

pub(crate) fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
