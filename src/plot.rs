//! Terminal plot of a sweep with a logarithmic y-axis.
//!
//! The output is a fixed-size character grid, so it is deterministic and can be
//! checked with golden strings:
//! - measured points: `o`
//! - segments between consecutive points: `-`

/// Renders `(x, y)` pairs with `log10(y)` on the vertical axis.
///
/// Points with a non-positive or non-finite `y` cannot be placed on a log axis;
/// they are dropped and counted in the header.
pub fn render_semilogy(points: &[(f64, f64)], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let placed: Vec<(f64, f64)> = points
        .iter()
        .filter(|(x, y)| x.is_finite() && y.is_finite() && *y > 0.0)
        .map(|&(x, y)| (x, y.log10()))
        .collect();
    let skipped = points.len() - placed.len();

    let (x_min, x_max) = range(placed.iter().map(|p| p.0)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = range(placed.iter().map(|p| p.1)).unwrap_or((-1.0, 0.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let cells: Vec<(usize, usize)> = placed
        .iter()
        .map(|&(x, y)| {
            (
                map_x(x, x_min, x_max, width),
                map_y(y, y_min, y_max, height),
            )
        })
        .collect();

    for pair in cells.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        draw_line(&mut grid, x0, y0, x1, y1, '-');
    }
    for &(x, y) in &cells {
        grid[y][x] = 'o';
    }

    let mut out = format!(
        "Plot: beta=[{x_min:.3}, {x_max:.3}] | log10(diff)=[{y_min:.2}, {y_max:.2}]"
    );
    if skipped > 0 {
        out.push_str(&format!(" | {skipped} non-positive point(s) skipped"));
    }
    out.push('\n');
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !(min.is_finite() && max.is_finite()) {
        None
    } else if max > min {
        Some((min, max))
    } else {
        Some((min - 1.0, max + 1.0))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let pad = ((max - min).abs() * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top of the plot.
    (height as f64 - 1.0 - u * (height as f64 - 1.0)).round() as usize
}

/// Bresenham line; only blank cells are overwritten.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let (mut x, mut y) = (x0 as isize, y0 as isize);
    let (x1, y1) = (x1 as isize, y1 as isize);
    let dx = (x1 - x).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let dy = -(y1 - y).abs();
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        let cell = &mut grid[y as usize][x as usize];
        if *cell == ' ' {
            *cell = ch;
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
