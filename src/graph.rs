use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::PI;
use std::ops::Range;

use crate::ir::{AxisValue, BoxGroup, ChartData, ChartSpec, Comparison};
use crate::{OutputFormat, RenderOptions};

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Category10 colours, cycled for groups and series.
const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

fn palette(idx: usize) -> RGBColor {
    PALETTE[idx % PALETTE.len()]
}

// =============================================================================
// Entry points
// =============================================================================

/// Rasterise one chart in the requested output format.
pub fn render_chart(spec: &ChartSpec, options: &RenderOptions) -> Result<Vec<u8>> {
    render_with(options, spec)
}

/// Render a comparison: the canvas is split into the layout's panes and
/// each chart draws into its own.
pub fn render_comparison(comparison: &Comparison, options: &RenderOptions) -> Result<Vec<u8>> {
    render_with(options, comparison)
}

/// Something that can draw itself onto any plotters backend.
trait Paint {
    fn paint<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static;
}

impl Paint for ChartSpec {
    fn paint<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        draw_chart(root, self)
    }
}

impl Paint for Comparison {
    fn paint<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let panes = root.split_evenly((self.layout.rows, self.layout.cols));
        for (pane, spec) in panes.iter().zip([&self.left, &self.right]) {
            draw_chart(pane, spec)?;
        }
        Ok(())
    }
}

/// Set up a white canvas on the backend for `options.format`, paint onto it
/// and return the encoded bytes.
fn render_with<P: Paint>(options: &RenderOptions, item: &P) -> Result<Vec<u8>> {
    let (width, height) = (options.width, options.height);
    match options.format {
        OutputFormat::Png => {
            let mut buffer = vec![0u8; (width * height * 3) as usize];
            {
                let root = BitMapBackend::with_buffer(&mut buffer, (width, height))
                    .into_drawing_area();
                root.fill(&WHITE).context("Failed to fill background")?;
                item.paint(&root)?;
                root.present().context("Failed to present drawing")?;
            }
            encode_png(&buffer, width, height)
        }
        OutputFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
                root.fill(&WHITE).context("Failed to fill background")?;
                item.paint(&root)?;
                root.present().context("Failed to present drawing")?;
            }
            Ok(svg.into_bytes())
        }
    }
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(buffer, width, height, image::ColorType::Rgb8)
        .context("Failed to encode PNG")?;
    Ok(png_bytes)
}

// =============================================================================
// Per-kind drawing
// =============================================================================

fn draw_chart<DB>(area: &DrawingArea<DB, Shift>, spec: &ChartSpec) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    match &spec.data {
        ChartData::Line { points } => {
            let xs: Vec<&AxisValue> = points.iter().map(|(x, _)| x).collect();
            let (positions, labels) = axis_positions(&xs);
            let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
            let mut chart = cartesian(area, spec, padded_range(&positions, false), padded_range(&ys, false))?;
            draw_mesh(&mut chart, spec, labels.as_deref())?;

            let color = palette(0);
            let line: Vec<(f64, f64)> = positions.into_iter().zip(ys).collect();
            chart
                .draw_series(LineSeries::new(line.clone(), color.stroke_width(2)))
                .context("Failed to draw line series")?;
            chart
                .draw_series(line.iter().map(|&(x, y)| Circle::new((x, y), 3, color.filled())))
                .context("Failed to draw line markers")?;
        }
        ChartData::Bar { bars } => {
            let labels: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();
            let values: Vec<f64> = bars.iter().map(|b| b.value).collect();
            let mut chart = cartesian(area, spec, category_range(labels.len()), padded_range(&values, true))?;
            draw_mesh(&mut chart, spec, Some(labels.as_slice()))?;

            let color = palette(0);
            chart
                .draw_series(values.iter().enumerate().map(|(i, &v)| {
                    let x = i as f64;
                    Rectangle::new([(x - 0.4, 0.0), (x + 0.4, v)], color.filled())
                }))
                .context("Failed to draw bars")?;
        }
        ChartData::Pie { slices } => {
            let area = area
                .titled(&spec.title, ("sans-serif", 20))
                .context("Failed to draw title")?;
            let (w, h) = area.dim_in_pixel();
            let center = (w as i32 / 2, h as i32 / 2);
            let radius = w.min(h) as f64 * 0.38;

            let mut start = -PI / 2.0;
            for (i, slice) in slices.iter().enumerate() {
                let sweep = slice.fraction * 2.0 * PI;
                let end = start + sweep;
                area.draw(&Polygon::new(wedge_points(center, radius, start, end), palette(i).filled()))
                    .context("Failed to draw pie slice")?;

                let mid = start + sweep / 2.0;
                let label_at = (
                    center.0 + (radius * 1.12 * mid.cos()) as i32,
                    center.1 + (radius * 1.12 * mid.sin()) as i32,
                );
                let style = TextStyle::from(("sans-serif", 14).into_font())
                    .pos(Pos::new(HPos::Center, VPos::Center));
                area.draw(&Text::new(
                    format!("{} {:.1}%", slice.label, slice.fraction * 100.0),
                    label_at,
                    style,
                ))
                .context("Failed to draw pie label")?;
                start = end;
            }
        }
        ChartData::Scatter { groups, .. } => {
            let xs: Vec<&AxisValue> = groups.iter().flat_map(|g| g.points.iter().map(|(x, _)| x)).collect();
            let (positions, labels) = axis_positions(&xs);
            let ys: Vec<f64> = groups.iter().flat_map(|g| g.points.iter().map(|(_, y)| *y)).collect();
            let mut chart = cartesian(area, spec, padded_range(&positions, false), padded_range(&ys, false))?;
            draw_mesh(&mut chart, spec, labels.as_deref())?;

            let mut offset = 0;
            for (i, group) in groups.iter().enumerate() {
                let color = palette(i);
                let points: Vec<(f64, f64)> = positions[offset..offset + group.points.len()]
                    .iter()
                    .zip(&group.points)
                    .map(|(&x, (_, y))| (x, *y))
                    .collect();
                offset += group.points.len();

                let anno = chart
                    .draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))
                    .context("Failed to draw scatter group")?;
                if !group.key.is_empty() {
                    anno.label(group.key.clone())
                        .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
                }
            }
            if groups.len() > 1 {
                draw_legend(&mut chart)?;
            }
        }
        ChartData::Histogram { bins, density } => {
            let edges: Vec<f64> = bins.iter().flat_map(|b| [b.start, b.end]).collect();
            let heights: Vec<f64> = bins
                .iter()
                .map(|b| b.count as f64)
                .chain(density.iter().map(|(_, d)| *d))
                .collect();
            let x_range = match (edges.first(), edges.last()) {
                (Some(&lo), Some(&hi)) => lo..hi,
                _ => 0.0..1.0,
            };
            let mut chart = cartesian(area, spec, x_range, padded_range(&heights, true))?;
            draw_mesh(&mut chart, spec, None)?;

            let color = palette(0);
            chart
                .draw_series(bins.iter().map(|b| {
                    Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], color.mix(0.7).filled())
                }))
                .context("Failed to draw histogram bins")?;
            chart
                .draw_series(LineSeries::new(density.iter().copied(), palette(3).stroke_width(2)))
                .context("Failed to draw density curve")?;
        }
        ChartData::Box { boxes } => {
            let labels: Vec<String> = boxes.iter().map(|b| b.label.clone()).collect();
            let extent: Vec<f64> = boxes.iter().flat_map(|b| [b.summary.min, b.summary.max]).collect();
            let mut chart = cartesian(area, spec, category_range(labels.len()), padded_range(&extent, false))?;
            draw_mesh(&mut chart, spec, Some(labels.as_slice()))?;

            for (i, group) in boxes.iter().enumerate() {
                draw_box(&mut chart, i as f64, group, palette(i))?;
            }
        }
        ChartData::Heatmap { columns, matrix, annotations } => {
            let n = columns.len();
            let mut chart = cartesian(area, spec, category_range(n), category_range(n))?;
            // Row 0 at the top, like a printed matrix.
            let row_labels: Vec<String> = columns.iter().rev().cloned().collect();
            let x_formatter = |x: &f64| category_label(columns, *x);
            let y_formatter = |y: &f64| category_label(&row_labels, *y);
            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(n)
                .y_labels(n)
                .x_label_formatter(&x_formatter)
                .y_label_formatter(&y_formatter)
                .draw()
                .context("Failed to draw mesh")?;

            let cells = matrix.iter().enumerate().flat_map(|(i, row)| {
                row.iter().enumerate().map(move |(j, &r)| (i, j, r))
            });
            chart
                .draw_series(cells.clone().map(|(i, j, r)| {
                    let (x, y) = (j as f64, (n - 1 - i) as f64);
                    Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], correlation_color(r).filled())
                }))
                .context("Failed to draw heatmap cells")?;

            let style = TextStyle::from(("sans-serif", 14).into_font())
                .pos(Pos::new(HPos::Center, VPos::Center));
            chart
                .draw_series(cells.map(|(i, j, _)| {
                    let text = annotations
                        .get(i)
                        .and_then(|row| row.get(j))
                        .cloned()
                        .unwrap_or_default();
                    Text::new(text, (j as f64, (n - 1 - i) as f64), style.clone())
                }))
                .context("Failed to draw heatmap annotations")?;
        }
        ChartData::Trendline { points, fit, x_ticks } => {
            let xs: Vec<f64> = points.iter().map(|(x, _)| *x).collect();
            let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
            let x_range = padded_range(&xs, false);
            let mut chart = cartesian(area, spec, x_range.clone(), padded_range(&ys, false))?;

            match x_ticks {
                Some(ticks) => {
                    // Month ordinals start at 1.
                    let formatter = |x: &f64| category_label(ticks, *x - 1.0);
                    let mut mesh = chart.configure_mesh();
                    mesh.x_label_formatter(&formatter);
                    if let Some(label) = &spec.x_label {
                        mesh.x_desc(label);
                    }
                    if let Some(label) = &spec.y_label {
                        mesh.y_desc(label);
                    }
                    mesh.draw().context("Failed to draw mesh")?;
                }
                None => draw_mesh(&mut chart, spec, None)?,
            }

            let color = palette(0);
            chart
                .draw_series(points.iter().map(|&p| Circle::new(p, 4, color.filled())))
                .context("Failed to draw trend points")?;
            if let Some(fit) = fit {
                let line = [x_range.start, x_range.end].map(|x| (x, fit.at(x)));
                chart
                    .draw_series(LineSeries::new(line, palette(3).stroke_width(2)))
                    .context("Failed to draw trend line")?
                    .label(format!("y = {:.2}x + {:.2}", fit.slope, fit.intercept))
                    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], palette(3)));
                draw_legend(&mut chart)?;
            }
        }
        ChartData::MultiSeries { categories, series } => {
            let values: Vec<f64> = series.iter().flat_map(|s| s.values.iter().copied()).collect();
            let mut chart = cartesian(area, spec, category_range(categories.len()), padded_range(&values, false))?;
            draw_mesh(&mut chart, spec, Some(categories.as_slice()))?;

            for (i, s) in series.iter().enumerate() {
                let color = palette(i);
                let line: Vec<(f64, f64)> = s.values.iter().enumerate().map(|(j, &v)| (j as f64, v)).collect();
                chart
                    .draw_series(LineSeries::new(line.clone(), color.stroke_width(2)))
                    .context("Failed to draw series")?
                    .label(s.name.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
                chart
                    .draw_series(line.into_iter().map(|p| Circle::new(p, 3, color.filled())))
                    .context("Failed to draw series markers")?;
            }
            draw_legend(&mut chart)?;
        }
    }
    Ok(())
}

fn cartesian<'a, DB>(
    area: &'a DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    x_range: Range<f64>,
    y_range: Range<f64>,
) -> Result<Chart<'a, DB>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    ChartBuilder::on(area)
        .margin(10)
        .caption(&spec.title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)
        .context("Failed to build chart")
}

/// Draw axes and grid. With `labels`, x ticks at integer positions show
/// the matching category.
fn draw_mesh<DB>(chart: &mut Chart<'_, DB>, spec: &ChartSpec, labels: Option<&[String]>) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let formatter = |x: &f64| category_label(labels.unwrap_or(&[]), *x);
    let mut mesh = chart.configure_mesh();
    if let Some(labels) = labels {
        mesh.x_labels(labels.len()).x_label_formatter(&formatter);
    }
    if let Some(label) = &spec.x_label {
        mesh.x_desc(label);
    }
    if let Some(label) = &spec.y_label {
        mesh.y_desc(label);
    }
    mesh.draw().context("Failed to draw mesh")?;
    Ok(())
}

fn draw_legend<'a, DB>(chart: &mut Chart<'a, DB>) -> Result<()>
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
{
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .context("Failed to draw legend")?;
    Ok(())
}

fn draw_box<DB>(chart: &mut Chart<'_, DB>, x: f64, group: &BoxGroup, color: RGBColor) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let s = &group.summary;
    let stroke = BLACK.stroke_width(1);
    chart
        .draw_series(std::iter::once(Rectangle::new([(x - 0.3, s.q1), (x + 0.3, s.q3)], color.mix(0.6).filled())))
        .context("Failed to draw box")?;
    chart
        .draw_series(std::iter::once(Rectangle::new([(x - 0.3, s.q1), (x + 0.3, s.q3)], stroke)))
        .context("Failed to draw box outline")?;

    let segments = [
        vec![(x - 0.3, s.median), (x + 0.3, s.median)],
        vec![(x, s.q3), (x, s.upper_whisker)],
        vec![(x, s.q1), (x, s.lower_whisker)],
        vec![(x - 0.15, s.upper_whisker), (x + 0.15, s.upper_whisker)],
        vec![(x - 0.15, s.lower_whisker), (x + 0.15, s.lower_whisker)],
    ];
    chart
        .draw_series(segments.into_iter().map(|seg| PathElement::new(seg, BLACK.stroke_width(2))))
        .context("Failed to draw whiskers")?;
    chart
        .draw_series(s.outliers.iter().map(|&y| Circle::new((x, y), 3, BLACK.stroke_width(1))))
        .context("Failed to draw outliers")?;
    Ok(())
}

// =============================================================================
// Geometry helpers
// =============================================================================

/// Map x values to plot positions. All-numeric input keeps its values;
/// anything else becomes category indices in first-appearance order.
fn axis_positions(values: &[&AxisValue]) -> (Vec<f64>, Option<Vec<String>>) {
    let numeric: Option<Vec<f64>> = values
        .iter()
        .map(|v| match v {
            AxisValue::Number(n) => Some(*n),
            AxisValue::Category(_) => None,
        })
        .collect();
    if let Some(numbers) = numeric {
        return (numbers, None);
    }

    let mut labels: Vec<String> = Vec::new();
    let positions = values
        .iter()
        .map(|v| {
            let label = v.to_string();
            let idx = match labels.iter().position(|l| *l == label) {
                Some(idx) => idx,
                None => {
                    labels.push(label);
                    labels.len() - 1
                }
            };
            idx as f64
        })
        .collect();
    (positions, Some(labels))
}

/// Label for the tick at `x`, or empty when `x` is between categories.
fn category_label(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 0.01 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// Categories sit at integer positions with half a slot of room either side.
fn category_range(n: usize) -> Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

/// Data range with 5% padding; a single value gets one unit either side.
fn padded_range(values: &[f64], include_zero: bool) -> Range<f64> {
    let mut min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let mut max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if include_zero {
        min = min.min(0.0);
        max = max.max(0.0);
    }
    if min == max {
        return (min - 1.0)..(max + 1.0);
    }
    let padding = (max - min) * 0.05;
    let lo = if include_zero && min == 0.0 { 0.0 } else { min - padding };
    lo..(max + padding)
}

/// Pixel outline of a pie wedge from `start` to `end` radians.
fn wedge_points(center: (i32, i32), radius: f64, start: f64, end: f64) -> Vec<(i32, i32)> {
    let steps = (((end - start).abs() / (2.0 * PI)) * 90.0).ceil().max(1.0) as usize;
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for i in 0..=steps {
        let angle = start + (end - start) * i as f64 / steps as f64;
        points.push((
            center.0 + (radius * angle.cos()).round() as i32,
            center.1 + (radius * angle.sin()).round() as i32,
        ));
    }
    points
}

/// Diverging blue-white-red scale over `[-1, 1]`; grey for undefined.
fn correlation_color(r: f64) -> RGBColor {
    if r.is_nan() {
        return RGBColor(200, 200, 200);
    }
    let r = r.clamp(-1.0, 1.0);
    let target = if r >= 0.0 { PALETTE[3] } else { PALETTE[0] };
    let t = r.abs();
    let mix = |c: u8| (255.0 + (c as f64 - 255.0) * t).round() as u8;
    RGBColor(mix(target.0), mix(target.1), mix(target.2))
}
