//! SVG charts for run comparisons and single file analyses.
//!
//! Every renderer takes a [ReportStyle] and returns the SVG document as a string. Writing it to
//! disk is left to the caller.

use super::ReportStyle;
use crate::model::{FileAnalysis, TimeWindow};
use chrono::DateTime;
use jtl_summary_model::RunSummary;

const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 80.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 70.0;
const Y_TICKS: usize = 5;
const HISTOGRAM_BINS: usize = 50;

#[derive(Clone, Copy)]
enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

/// Minimal SVG document builder
struct Svg {
    out: String,
    font_family: String,
}

impl Svg {
    fn new(width: f64, height: f64, style: &ReportStyle) -> Self {
        let mut out = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        );
        out.push('\n');
        let mut svg = Self {
            out,
            font_family: escape(&style.font_family),
        };
        svg.rect(0.0, 0.0, width, height, &style.background, 1.0);
        svg
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: &str, opacity: f64) {
        self.out.push_str(&format!(
            r#"<rect x="{x:.1}" y="{y:.1}" width="{:.1}" height="{:.1}" fill="{fill}" fill-opacity="{opacity}"/>"#,
            width.max(0.0),
            height.max(0.0)
        ));
        self.out.push('\n');
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), stroke: &str, width: f64, dashed: bool) {
        self.out.push_str(&format!(
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{stroke}" stroke-width="{width}"{}/>"#,
            from.0,
            from.1,
            to.0,
            to.1,
            dash(dashed)
        ));
        self.out.push('\n');
    }

    fn polyline(&mut self, points: &[(f64, f64)], stroke: &str, width: f64, dashed: bool) {
        if points.is_empty() {
            return;
        }
        let points = points
            .iter()
            .map(|(x, y)| format!("{x:.1},{y:.1}"))
            .collect::<Vec<_>>()
            .join(" ");
        self.out.push_str(&format!(
            r#"<polyline points="{points}" fill="none" stroke="{stroke}" stroke-width="{width}"{}/>"#,
            dash(dashed)
        ));
        self.out.push('\n');
    }

    fn circle(&mut self, center: (f64, f64), radius: f64, fill: &str) {
        self.out.push_str(&format!(
            r#"<circle cx="{:.1}" cy="{:.1}" r="{radius}" fill="{fill}"/>"#,
            center.0, center.1
        ));
        self.out.push('\n');
    }

    fn text(&mut self, at: (f64, f64), content: &str, size: f64, fill: &str, anchor: Anchor) {
        self.out.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" font-family="{}" font-size="{size}" fill="{fill}" text-anchor="{}">{}</text>"#,
            at.0,
            at.1,
            self.font_family,
            anchor.as_str(),
            escape(content)
        ));
        self.out.push('\n');
    }

    fn bold_text(&mut self, at: (f64, f64), content: &str, size: f64, fill: &str) {
        self.out.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" font-family="{}" font-size="{size}" font-weight="bold" fill="{fill}" text-anchor="middle">{}</text>"#,
            at.0,
            at.1,
            self.font_family,
            escape(content)
        ));
        self.out.push('\n');
    }

    fn vertical_text(&mut self, at: (f64, f64), content: &str, size: f64, fill: &str) {
        self.out.push_str(&format!(
            r#"<text x="{x:.1}" y="{y:.1}" font-family="{}" font-size="{size}" fill="{fill}" text-anchor="middle" transform="rotate(-90 {x:.1} {y:.1})">{}</text>"#,
            self.font_family,
            escape(content),
            x = at.0,
            y = at.1,
        ));
        self.out.push('\n');
    }

    fn finish(mut self) -> String {
        self.out.push_str("</svg>\n");
        self.out
    }
}

fn dash(dashed: bool) -> &'static str {
    if dashed {
        r#" stroke-dasharray="6 4""#
    } else {
        ""
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Round `value` up to 1, 2 or 5 times a power of ten, so axis ticks land on readable values.
fn nice_max(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 1.0;
    }

    let magnitude = 10f64.powf(value.log10().floor());
    let fraction = value / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };

    nice * magnitude
}

fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn format_time(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

/// The plotting area of a chart or dashboard panel
#[derive(Clone, Copy)]
struct Plot {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Plot {
    fn inside(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            left: x + MARGIN_LEFT,
            top: y + MARGIN_TOP,
            width: (width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0),
            height: (height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0),
        }
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    fn y_for(&self, value: f64, max: f64) -> f64 {
        self.bottom() - (value / max).clamp(0.0, 1.0) * self.height
    }

    fn x_for(&self, value: f64, min: f64, max: f64) -> f64 {
        if max > min {
            self.left + (value - min) / (max - min) * self.width
        } else {
            self.left + self.width / 2.0
        }
    }

    /// Horizontal band of the `index`-th of `count` categories
    fn band(&self, index: usize, count: usize) -> (f64, f64) {
        let band_width = self.width / count.max(1) as f64;
        (self.left + index as f64 * band_width, band_width)
    }

    fn band_center(&self, index: usize, count: usize) -> f64 {
        let (start, width) = self.band(index, count);
        start + width / 2.0
    }

    fn draw_axes(&self, svg: &mut Svg, style: &ReportStyle) {
        svg.line(
            (self.left, self.top),
            (self.left, self.bottom()),
            &style.axis,
            1.0,
            false,
        );
        svg.line(
            (self.left, self.bottom()),
            (self.right(), self.bottom()),
            &style.axis,
            1.0,
            false,
        );
    }

    /// Grid lines and tick labels for a value axis from 0 to `max`
    fn draw_y_ticks(&self, svg: &mut Svg, style: &ReportStyle, max: f64, right: bool, color: &str) {
        for i in 0..=Y_TICKS {
            let value = max * i as f64 / Y_TICKS as f64;
            let y = self.y_for(value, max);
            if !right {
                svg.line((self.left, y), (self.right(), y), &style.grid, 1.0, true);
                svg.text(
                    (self.left - 8.0, y + 4.0),
                    &format_tick(value),
                    style.label_size,
                    color,
                    Anchor::End,
                );
            } else {
                svg.text(
                    (self.right() + 8.0, y + 4.0),
                    &format_tick(value),
                    style.label_size,
                    color,
                    Anchor::Start,
                );
            }
        }
    }

    fn draw_titles(
        &self,
        svg: &mut Svg,
        style: &ReportStyle,
        title: &str,
        x_label: &str,
        y_label: &str,
    ) {
        svg.bold_text(
            (self.left + self.width / 2.0, self.top - 24.0),
            title,
            style.title_size,
            &style.axis,
        );
        svg.text(
            (self.left + self.width / 2.0, self.bottom() + 45.0),
            x_label,
            style.label_size + 2.0,
            &style.axis,
            Anchor::Middle,
        );
        svg.vertical_text(
            (self.left - 55.0, self.top + self.height / 2.0),
            y_label,
            style.label_size + 2.0,
            &style.axis,
        );
    }

    fn draw_legend(&self, svg: &mut Svg, style: &ReportStyle, entries: &[(&str, &str)]) {
        for (i, (color, label)) in entries.iter().enumerate() {
            let y = self.top + 12.0 + i as f64 * 18.0;
            svg.rect(self.left + 10.0, y - 9.0, 14.0, 10.0, color, 1.0);
            svg.text(
                (self.left + 30.0, y),
                label,
                style.label_size,
                &style.axis,
                Anchor::Start,
            );
        }
    }
}

/// Bar chart of the successful requests per run, with the expected success count as a dashed
/// reference line when one is configured.
pub fn render_success_chart(
    summaries: &[RunSummary],
    expected_success: Option<u64>,
    style: &ReportStyle,
) -> String {
    let (width, height) = (style.width as f64, style.height as f64);
    let mut svg = Svg::new(width, height, style);
    let plot = Plot::inside(0.0, 0.0, width, height);

    let highest = summaries.iter().map(|s| s.success_count).max().unwrap_or(0);
    let max = nice_max(
        (highest as f64 + 2.0)
            .max(5.0)
            .max(expected_success.map(|e| e as f64 + 1.0).unwrap_or(0.0)),
    );

    plot.draw_y_ticks(&mut svg, style, max, false, &style.axis);

    let count = summaries.len();
    for (i, summary) in summaries.iter().enumerate() {
        let (start, band_width) = plot.band(i, count);
        let value = summary.success_count as f64;
        let y = plot.y_for(value, max);
        svg.rect(
            start + band_width * 0.2,
            y,
            band_width * 0.6,
            plot.bottom() - y,
            &style.primary,
            1.0,
        );
        svg.bold_text(
            (start + band_width / 2.0, y - 6.0),
            &summary.success_count.to_string(),
            style.label_size,
            &style.axis,
        );
        svg.text(
            (start + band_width / 2.0, plot.bottom() + 20.0),
            &summary.run_name,
            style.label_size,
            &style.axis,
            Anchor::Middle,
        );
    }

    let mut legend = vec![(style.primary.as_str(), "Successful requests".to_string())];
    if let Some(expected) = expected_success {
        let y = plot.y_for(expected as f64, max);
        svg.line((plot.left, y), (plot.right(), y), &style.reference, 2.0, true);
        legend.push((
            style.reference.as_str(),
            format!("Expected success ({expected})"),
        ));
    }

    plot.draw_axes(&mut svg, style);
    plot.draw_titles(
        &mut svg,
        style,
        "Consistency: successful requests per run",
        "Run",
        "Successful requests (count)",
    );
    let legend = legend
        .iter()
        .map(|(color, label)| (*color, label.as_str()))
        .collect::<Vec<_>>();
    plot.draw_legend(&mut svg, style, &legend);

    svg.finish()
}

/// Throughput per run as bars, with the P95 latency per run as a line on a secondary axis.
pub fn render_scaling_chart(summaries: &[RunSummary], style: &ReportStyle) -> String {
    let (width, height) = (style.width as f64, style.height as f64);
    let mut svg = Svg::new(width, height, style);
    let plot = Plot::inside(0.0, 0.0, width, height);

    let tps_max = nice_max(
        summaries
            .iter()
            .map(|s| s.throughput_per_second)
            .fold(0.0, f64::max)
            * 1.1,
    );
    let latency_max = nice_max(
        summaries
            .iter()
            .map(|s| s.latency_p95_ms)
            .fold(0.0, f64::max)
            * 1.1,
    );

    plot.draw_y_ticks(&mut svg, style, tps_max, false, &style.primary);
    plot.draw_y_ticks(&mut svg, style, latency_max, true, &style.secondary);

    let count = summaries.len();
    let mut latency_points = Vec::with_capacity(count);
    for (i, summary) in summaries.iter().enumerate() {
        let (start, band_width) = plot.band(i, count);
        let center = plot.band_center(i, count);

        let y = plot.y_for(summary.throughput_per_second, tps_max);
        svg.rect(
            start + band_width * 0.2,
            y,
            band_width * 0.6,
            plot.bottom() - y,
            &style.primary,
            0.7,
        );
        svg.bold_text(
            (center, y - 6.0),
            &format!("{:.1}", summary.throughput_per_second),
            style.label_size,
            &style.primary,
        );
        svg.text(
            (center, plot.bottom() + 20.0),
            &summary.run_name,
            style.label_size,
            &style.axis,
            Anchor::Middle,
        );

        latency_points.push((center, plot.y_for(summary.latency_p95_ms, latency_max)));
    }

    svg.polyline(&latency_points, &style.secondary, 3.0, true);
    for (summary, point) in summaries.iter().zip(&latency_points) {
        svg.circle(*point, 5.0, &style.secondary);
        svg.text(
            (point.0, point.1 - 10.0),
            &format!("{:.0}", summary.latency_p95_ms),
            style.label_size,
            &style.secondary,
            Anchor::Middle,
        );
    }

    plot.draw_axes(&mut svg, style);
    plot.draw_titles(
        &mut svg,
        style,
        "Performance scaling: TPS vs. P95 latency",
        "Run",
        "Throughput (TPS)",
    );
    svg.vertical_text(
        (plot.right() + 60.0, plot.top + plot.height / 2.0),
        "95th percentile latency (ms)",
        style.label_size + 2.0,
        &style.secondary,
    );
    plot.draw_legend(
        &mut svg,
        style,
        &[
            (style.primary.as_str(), "Throughput (TPS)"),
            (style.secondary.as_str(), "95th percentile latency (ms)"),
        ],
    );

    svg.finish()
}

/// A horizontal reference line with its value in the legend
struct Reference<'a> {
    value: f64,
    color: &'a str,
    label: String,
}

/// Draw a time series panel of `value` per window.
#[allow(clippy::too_many_arguments)]
fn draw_timeline(
    svg: &mut Svg,
    style: &ReportStyle,
    plot: Plot,
    windows: &[TimeWindow],
    value: impl Fn(&TimeWindow) -> f64,
    color: &str,
    titles: (&str, &str),
    references: &[Reference],
) {
    let highest = windows
        .iter()
        .map(&value)
        .chain(references.iter().map(|r| r.value))
        .fold(0.0, f64::max);
    let max = nice_max(highest * 1.1);

    plot.draw_y_ticks(svg, style, max, false, &style.axis);

    let (first, last) = match (windows.first(), windows.last()) {
        (Some(first), Some(last)) => (first.start as f64, last.start as f64),
        _ => (0.0, 0.0),
    };
    let points = windows
        .iter()
        .map(|w| (plot.x_for(w.start as f64, first, last), plot.y_for(value(w), max)))
        .collect::<Vec<_>>();
    svg.polyline(&points, color, 2.0, false);

    for reference in references {
        let y = plot.y_for(reference.value, max);
        svg.line((plot.left, y), (plot.right(), y), reference.color, 2.0, true);
    }

    if let (Some(first_window), Some(last_window)) = (windows.first(), windows.last()) {
        svg.text(
            (plot.left, plot.bottom() + 20.0),
            &format_time(first_window.start),
            style.label_size,
            &style.axis,
            Anchor::Start,
        );
        svg.text(
            (plot.right(), plot.bottom() + 20.0),
            &format_time(last_window.start),
            style.label_size,
            &style.axis,
            Anchor::End,
        );
    }

    plot.draw_axes(svg, style);
    plot.draw_titles(svg, style, titles.0, "Time (UTC)", titles.1);
    let legend = references
        .iter()
        .map(|r| (r.color, r.label.as_str()))
        .collect::<Vec<_>>();
    plot.draw_legend(svg, style, &legend);
}

fn mean_of(windows: &[TimeWindow], value: impl Fn(&TimeWindow) -> f64) -> f64 {
    if windows.is_empty() {
        0.0
    } else {
        windows.iter().map(value).sum::<f64>() / windows.len() as f64
    }
}

fn draw_histogram(svg: &mut Svg, style: &ReportStyle, plot: Plot, analysis: &FileAnalysis) {
    let min = analysis.elapsed_ms.iter().copied().min().unwrap_or(0) as f64;
    let max = analysis.elapsed_ms.iter().copied().max().unwrap_or(0) as f64;
    let bin_width = ((max - min) / HISTOGRAM_BINS as f64).max(1.0);

    let mut bins = vec![0usize; HISTOGRAM_BINS];
    for elapsed in &analysis.elapsed_ms {
        let index = ((*elapsed as f64 - min) / bin_width) as usize;
        bins[index.min(HISTOGRAM_BINS - 1)] += 1;
    }

    let y_max = nice_max(bins.iter().copied().max().unwrap_or(0) as f64 * 1.1);
    let x_max = min + bin_width * HISTOGRAM_BINS as f64;
    plot.draw_y_ticks(svg, style, y_max, false, &style.axis);

    for (i, count) in bins.iter().enumerate() {
        let left = plot.x_for(min + i as f64 * bin_width, min, x_max);
        let right = plot.x_for(min + (i + 1) as f64 * bin_width, min, x_max);
        let y = plot.y_for(*count as f64, y_max);
        svg.rect(left, y, right - left, plot.bottom() - y, &style.histogram, 0.7);
    }

    let latency = &analysis.latency;
    let markers = [
        (latency.mean, style.error.as_str(), format!("Mean: {:.2} ms", latency.mean)),
        (latency.median, style.success.as_str(), format!("Median: {:.2} ms", latency.median)),
        (latency.p95, style.secondary.as_str(), format!("P95: {:.2} ms", latency.p95)),
    ];
    for (value, color, _) in &markers {
        let x = plot.x_for(*value, min, x_max);
        svg.line((x, plot.top), (x, plot.bottom()), color, 2.0, true);
    }

    svg.text(
        (plot.left, plot.bottom() + 20.0),
        &format_tick(min),
        style.label_size,
        &style.axis,
        Anchor::Start,
    );
    svg.text(
        (plot.right(), plot.bottom() + 20.0),
        &format_tick(x_max),
        style.label_size,
        &style.axis,
        Anchor::End,
    );

    plot.draw_axes(svg, style);
    plot.draw_titles(
        svg,
        style,
        "Response Time Distribution",
        "Response time (ms)",
        "Frequency",
    );
    let legend = markers
        .iter()
        .map(|(_, color, label)| (*color, label.as_str()))
        .collect::<Vec<_>>();
    plot.draw_legend(svg, style, &legend);
}

/// Four stacked panels for one result log: TPS, mean response time with the anomaly threshold,
/// error rate and the response time histogram.
pub fn render_dashboard_chart(
    analysis: &FileAnalysis,
    threshold_multiplier: f64,
    style: &ReportStyle,
) -> String {
    let width = style.width as f64;
    let panel_height = style.panel_height as f64;
    let mut svg = Svg::new(width, panel_height * 4.0, style);
    let panel = |index: usize| Plot::inside(0.0, panel_height * index as f64, width, panel_height);

    let seconds_per_window = analysis.throughput_window_seconds.max(1) as f64;
    let tps = |w: &TimeWindow| w.count as f64 / seconds_per_window;
    let mean_tps = mean_of(&analysis.throughput_timeline, tps);
    draw_timeline(
        &mut svg,
        style,
        panel(0),
        &analysis.throughput_timeline,
        tps,
        &style.primary,
        ("Transactions Per Second (TPS)", "TPS"),
        &[Reference {
            value: mean_tps,
            color: &style.reference,
            label: format!("Average: {mean_tps:.2} TPS"),
        }],
    );

    let occupied = analysis
        .timeline
        .iter()
        .filter(|w| w.count > 0)
        .cloned()
        .collect::<Vec<_>>();
    let mean_latency = mean_of(&occupied, |w| w.mean_latency_ms);
    let mut latency_references = vec![Reference {
        value: mean_latency,
        color: &style.reference,
        label: format!("Average: {mean_latency:.2} ms"),
    }];
    if analysis.anomaly_threshold_ms > 0.0 {
        latency_references.push(Reference {
            value: analysis.anomaly_threshold_ms,
            color: &style.secondary,
            label: format!(
                "Threshold ({threshold_multiplier}x avg): {:.2} ms",
                analysis.anomaly_threshold_ms
            ),
        });
    }
    draw_timeline(
        &mut svg,
        style,
        panel(1),
        &occupied,
        |w| w.mean_latency_ms,
        &style.success,
        (
            &format!(
                "Average Response Time ({}s windows)",
                analysis.timeline_window_seconds
            ),
            "Response time (ms)",
        ),
        &latency_references,
    );

    let mean_error_rate = mean_of(&occupied, |w| w.error_rate_pct);
    draw_timeline(
        &mut svg,
        style,
        panel(2),
        &occupied,
        |w| w.error_rate_pct,
        &style.error,
        ("Error Rate (%)", "Error rate (%)"),
        &[Reference {
            value: mean_error_rate,
            color: &style.secondary,
            label: format!("Average: {mean_error_rate:.2}%"),
        }],
    );

    draw_histogram(&mut svg, style, panel(3), analysis);

    svg.finish()
}
