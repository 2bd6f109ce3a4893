//! Minimal SVG bar charts for the analytics stage. Charts are written as
//! `.svg` files, not PNG images.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::Result;

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 540.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 120.0;
const BAR_COLOR: &str = "#4c72b0";
const Y_TICKS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub orientation: Orientation,
    pub bars: Vec<(String, f64)>,
}

impl BarChart {
    pub fn vertical(title: &str, x_label: &str, y_label: &str, bars: Vec<(String, f64)>) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            orientation: Orientation::Vertical,
            bars,
        }
    }

    pub fn horizontal(title: &str, x_label: &str, y_label: &str, bars: Vec<(String, f64)>) -> Self {
        Self { orientation: Orientation::Horizontal, ..Self::vertical(title, x_label, y_label, bars) }
    }

    pub fn render(&self) -> String {
        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
            w = WIDTH,
            h = HEIGHT
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="30" text-anchor="middle" font-size="18" font-weight="bold">{}</text>"#,
            WIDTH / 2.0,
            escape(&self.title)
        );

        match self.orientation {
            Orientation::Vertical => self.render_vertical(&mut svg),
            Orientation::Horizontal => self.render_horizontal(&mut svg),
        }

        svg.push_str("</svg>\n");
        svg
    }

    fn max_value(&self) -> f64 {
        let max = self.bars.iter().map(|(_, v)| *v).fold(0.0, f64::max);
        if max > 0.0 {
            max
        } else {
            1.0
        }
    }

    fn render_vertical(&self, svg: &mut String) {
        let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let baseline = MARGIN_TOP + plot_h;
        let max = self.max_value();

        axes(svg, baseline);
        for i in 0..=Y_TICKS {
            let value = max * i as f64 / Y_TICKS as f64;
            let y = baseline - plot_h * i as f64 / Y_TICKS as f64;
            let _ = writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="11">{}</text>"#,
                MARGIN_LEFT - 6.0,
                y + 4.0,
                tick_label(value)
            );
        }

        if !self.bars.is_empty() {
            let slot = plot_w / self.bars.len() as f64;
            for (i, (label, value)) in self.bars.iter().enumerate() {
                let h = plot_h * value / max;
                let x = MARGIN_LEFT + slot * i as f64 + slot * 0.1;
                let _ = writeln!(
                    svg,
                    r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
                    x,
                    baseline - h,
                    slot * 0.8,
                    h,
                    BAR_COLOR
                );
                let cx = x + slot * 0.4;
                let _ = writeln!(
                    svg,
                    r#"<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end" transform="rotate(-45 {:.1} {:.1})">{}</text>"#,
                    cx,
                    baseline + 14.0,
                    cx,
                    baseline + 14.0,
                    escape(label)
                );
            }
        }

        self.axis_titles(svg);
    }

    fn render_horizontal(&self, svg: &mut String) {
        let left = MARGIN_LEFT + 80.0;
        let plot_w = WIDTH - left - MARGIN_RIGHT;
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let max = self.max_value();

        let _ = writeln!(
            svg,
            r#"<line x1="{l}" y1="{t}" x2="{l}" y2="{b}" stroke="black"/>"#,
            l = left,
            t = MARGIN_TOP,
            b = MARGIN_TOP + plot_h
        );

        if !self.bars.is_empty() {
            let slot = plot_h / self.bars.len() as f64;
            for (i, (label, value)) in self.bars.iter().enumerate() {
                let w = plot_w * value / max;
                let y = MARGIN_TOP + slot * i as f64 + slot * 0.1;
                let _ = writeln!(
                    svg,
                    r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
                    left,
                    y,
                    w,
                    slot * 0.8,
                    BAR_COLOR
                );
                let _ = writeln!(
                    svg,
                    r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="11">{}</text>"#,
                    left - 6.0,
                    y + slot * 0.4 + 4.0,
                    escape(label)
                );
                let _ = writeln!(
                    svg,
                    r#"<text x="{:.1}" y="{:.1}" font-size="11">{}</text>"#,
                    left + w + 4.0,
                    y + slot * 0.4 + 4.0,
                    tick_label(*value)
                );
            }
        }

        self.axis_titles(svg);
    }

    fn axis_titles(&self, svg: &mut String) {
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="13">{}</text>"#,
            WIDTH / 2.0,
            HEIGHT - 12.0,
            escape(&self.x_label)
        );
        let _ = writeln!(
            svg,
            r#"<text x="20" y="{y:.1}" text-anchor="middle" font-size="13" transform="rotate(-90 20 {y:.1})">{}</text>"#,
            escape(&self.y_label),
            y = HEIGHT / 2.0
        );
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render())?;
        Ok(())
    }
}

fn axes(svg: &mut String, baseline: f64) {
    let _ = writeln!(
        svg,
        r#"<line x1="{l}" y1="{t}" x2="{l}" y2="{b}" stroke="black"/>"#,
        l = MARGIN_LEFT,
        t = MARGIN_TOP,
        b = baseline
    );
    let _ = writeln!(
        svg,
        r#"<line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="black"/>"#,
        l = MARGIN_LEFT,
        r = WIDTH - MARGIN_RIGHT,
        b = baseline
    );
}

fn tick_label(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
