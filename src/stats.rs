// Numeric helpers shared by the chart handlers

/// Linear-interpolated percentile of already sorted data.
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 { return 0.0; }
    if n == 1 { return sorted_data[0]; }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() { return 0.0; }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() { return None; }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}

/// Five-number summary plus Tukey whiskers and outliers.
#[derive(Debug, Clone, PartialEq)]
pub struct FiveNumber {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

pub fn five_number(values: &[f64]) -> Option<FiveNumber> {
    if values.is_empty() { return None; }
    let mut ys = values.to_vec();
    ys.sort_by(|a, b| a.total_cmp(b));

    let q1 = percentile(&ys, 0.25);
    let median = percentile(&ys, 0.50);
    let q3 = percentile(&ys, 0.75);
    let iqr = q3 - q1;

    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    // Whiskers: range of data within fences
    let lower_whisker = ys.iter().cloned().find(|&v| v >= lower_fence).unwrap_or(q1);
    let upper_whisker = ys.iter().rev().cloned().find(|&v| v <= upper_fence).unwrap_or(q3);
    let outliers = ys
        .iter()
        .cloned()
        .filter(|&v| v < lower_fence || v > upper_fence)
        .collect();

    Some(FiveNumber {
        min: ys[0],
        q1,
        median,
        q3,
        max: ys[ys.len() - 1],
        lower_whisker,
        upper_whisker,
        outliers,
    })
}

/// One histogram bin over `[start, end)`; the last bin also includes `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins spanning the data range. A constant sample gets a unit
/// wide range centred on its value.
pub fn histogram(values: &[f64], bin_count: usize) -> Vec<Bin> {
    let Some((min, max)) = min_max(values) else { return Vec::new(); };
    let bin_count = bin_count.max(1);
    let (lo, hi) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
    let width = (hi - lo) / bin_count as f64;

    let mut counts = vec![0usize; bin_count];
    for &v in values {
        let idx = ((v - lo) / width).floor() as usize;
        counts[idx.min(bin_count - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            start: lo + i as f64 * width,
            end: lo + (i + 1) as f64 * width,
            count,
        })
        .collect()
}

/// Silverman's rule of thumb for bandwidth selection
pub fn silverman_bandwidth(data: &[f64]) -> f64 {
    let n = data.len() as f64;
    if n < 2.0 { return 1.0; }

    let mean = mean(data);
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    // IQR-based estimate for robustness
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let iqr = percentile(&sorted, 0.75) - percentile(&sorted, 0.25);

    // Silverman's rule: h = 0.9 * min(std, IQR/1.34) * n^(-1/5)
    let scale = if iqr > 0.0 { std_dev.min(iqr / 1.34) } else { std_dev };
    if scale <= 0.0 { return 1.0; }
    0.9 * scale * n.powf(-0.2)
}

fn gaussian_kernel(u: f64) -> f64 {
    const SQRT_2PI: f64 = 2.5066282746310002;
    (-0.5 * u * u).exp() / SQRT_2PI
}

/// Gaussian KDE evaluated on an even grid over `[lo, hi]`.
/// Returns `(x, density)` pairs; the density integrates to one.
pub fn kde(data: &[f64], lo: f64, hi: f64, grid_points: usize) -> Vec<(f64, f64)> {
    if data.is_empty() || grid_points < 2 || hi <= lo { return Vec::new(); }
    let n = data.len() as f64;
    let bandwidth = silverman_bandwidth(data);
    let step = (hi - lo) / (grid_points - 1) as f64;

    (0..grid_points)
        .map(|i| {
            let x = lo + i as f64 * step;
            let d: f64 = data.iter().map(|&xi| gaussian_kernel((x - xi) / bandwidth)).sum();
            (x, d / (n * bandwidth))
        })
        .collect()
}

/// Least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Simple linear regression. `None` without at least two distinct x values.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    if xs.len() != ys.len() || xs.len() < 2 { return None; }

    let mx = mean(xs);
    let my = mean(ys);
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        sxx += (x - mx).powi(2);
        sxy += (x - mx) * (y - my);
    }

    // Degenerate relative to the magnitude of x.
    let scale: f64 = xs.iter().map(|&x| x * x).sum();
    if sxx <= f64::EPSILON * scale { return None; }

    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    Some(LinearFit { slope, intercept })
}

/// Pearson correlation; NaN when either side has no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 { return f64::NAN; }
    let mx = mean(xs);
    let my = mean(ys);
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 { return f64::NAN; }
    cov / (vx.sqrt() * vy.sqrt())
}
