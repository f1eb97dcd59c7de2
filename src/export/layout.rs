//! Force-directed layout and SVG rendering.
//!
//! Positions come from a seeded Fruchterman-Reingold simulation so the same
//! graph and seed always produce the same picture. Parallel links are drawn
//! as separate curves so each port label stays readable.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;

use quick_xml::escape::escape;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::LayoutView;
use crate::error::Result;
use crate::topology::Topology;

const MIN_DISTANCE: f64 = 0.01;
const PARALLEL_SPACING: f64 = 28.0;
const LABEL_FONT_SIZE: u32 = 10;
const NODE_FONT_SIZE: u32 = 12;
const TITLE: &str = "Network Connectivity Graph";

/// Layout and canvas configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub seed: u64,
    /// Optimal node distance; `None` uses `1/sqrt(n)`
    pub spring_k: Option<f64>,
    pub iterations: usize,
    pub width: u32,
    pub height: u32,
    pub node_radius: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            spring_k: Some(0.3),
            iterations: 50,
            width: 2000,
            height: 2000,
            node_radius: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Node positions, indexed like `view.devices`, scaled into `[-1, 1]`.
pub fn spring_layout(view: &LayoutView<'_>, config: &LayoutConfig) -> Vec<Point> {
    let n = view.devices.len();
    match n {
        0 => return Vec::new(),
        1 => return vec![Point::default()],
        _ => {}
    }

    // Parallel links pull harder; self-links exert no force
    let mut weight = vec![vec![0.0f64; n]; n];
    for labeled in &view.links {
        let (Some(a), Some(b)) = (
            view.index_of(&labeled.link.local.device),
            view.index_of(&labeled.link.remote.device),
        ) else {
            continue;
        };
        if a != b {
            weight[a][b] += 1.0;
            weight[b][a] += 1.0;
        }
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut pos: Vec<Point> = (0..n)
        .map(|_| Point {
            x: rng.r#gen::<f64>(),
            y: rng.r#gen::<f64>(),
        })
        .collect();

    let k = config.spring_k.unwrap_or_else(|| (1.0 / n as f64).sqrt());
    let (min_x, max_x, min_y, max_y) = bounds(&pos);
    let mut temperature = (max_x - min_x).max(max_y - min_y) * 0.1;
    let cooling = temperature / (config.iterations as f64 + 1.0);

    for _ in 0..config.iterations {
        let mut displacement = vec![Point::default(); n];

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let dx = pos[i].x - pos[j].x;
                let dy = pos[i].y - pos[j].y;
                let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                let force = k * k / (distance * distance) - weight[i][j] * distance / k;
                displacement[i].x += dx * force;
                displacement[i].y += dy * force;
            }
        }

        for (p, d) in pos.iter_mut().zip(&displacement) {
            let length = (d.x * d.x + d.y * d.y).sqrt().max(MIN_DISTANCE);
            p.x += d.x * temperature / length;
            p.y += d.y * temperature / length;
        }

        temperature -= cooling;
    }

    rescale(&mut pos);
    pos
}

fn bounds(pos: &[Point]) -> (f64, f64, f64, f64) {
    pos.iter().fold(
        (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
        |(min_x, max_x, min_y, max_y), p| {
            (min_x.min(p.x), max_x.max(p.x), min_y.min(p.y), max_y.max(p.y))
        },
    )
}

/// Center on the origin and scale the largest coordinate to 1
fn rescale(pos: &mut [Point]) {
    let n = pos.len() as f64;
    let mean_x = pos.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_y = pos.iter().map(|p| p.y).sum::<f64>() / n;

    let mut limit: f64 = 0.0;
    for p in pos.iter_mut() {
        p.x -= mean_x;
        p.y -= mean_y;
        limit = limit.max(p.x.abs()).max(p.y.abs());
    }

    if limit > 0.0 {
        for p in pos.iter_mut() {
            p.x /= limit;
            p.y /= limit;
        }
    }
}

/// Render the topology as a standalone SVG document.
pub fn render_svg(topology: &Topology, config: &LayoutConfig) -> Result<String> {
    let view = LayoutView::new(topology);
    let positions = spring_layout(&view, config);

    let margin = f64::from(config.node_radius) * 3.0;
    let width = f64::from(config.width);
    let height = f64::from(config.height);
    let to_canvas = |p: Point| Point {
        x: margin + (p.x + 1.0) / 2.0 * (width - 2.0 * margin),
        y: margin + (p.y + 1.0) / 2.0 * (height - 2.0 * margin),
    };
    let canvas: Vec<Point> = positions.into_iter().map(to_canvas).collect();

    let mut svg = String::new();
    writeln!(
        svg,
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" "#,
            r#"viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
        ),
        w = config.width,
        h = config.height
    )?;
    writeln!(svg, r#"  <rect width="100%" height="100%" fill="white"/>"#)?;
    writeln!(
        svg,
        r#"  <text x="{}" y="{}" text-anchor="middle" font-size="24">{}</text>"#,
        width / 2.0,
        margin / 2.0,
        TITLE
    )?;

    // Group links per unordered device pair so parallels can be spread apart
    let mut groups: BTreeMap<(usize, usize), Vec<&str>> = BTreeMap::new();
    for labeled in &view.links {
        let (Some(a), Some(b)) = (
            view.index_of(&labeled.link.local.device),
            view.index_of(&labeled.link.remote.device),
        ) else {
            continue;
        };
        groups
            .entry((a.min(b), a.max(b)))
            .or_default()
            .push(labeled.label.as_str());
    }

    writeln!(svg, r#"  <g stroke="black" stroke-width="1" fill="none">"#)?;
    let mut labels = String::new();
    for (&(a, b), group) in &groups {
        if a == b {
            draw_self_links(&mut svg, &mut labels, canvas[a], group, config.node_radius)?;
        } else {
            draw_links(&mut svg, &mut labels, canvas[a], canvas[b], group)?;
        }
    }
    writeln!(svg, "  </g>")?;
    svg.push_str(&labels);

    for (device, p) in view.devices.iter().zip(&canvas) {
        writeln!(
            svg,
            r#"  <circle cx="{:.1}" cy="{:.1}" r="{}" fill="lightblue"/>"#,
            p.x, p.y, config.node_radius
        )?;
        writeln!(
            svg,
            concat!(
                r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle" "#,
                r#"dominant-baseline="central" font-size="{}" font-weight="bold">{}</text>"#,
            ),
            p.x,
            p.y,
            NODE_FONT_SIZE,
            escape(device.name.as_str())
        )?;
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

fn draw_links(
    svg: &mut String,
    labels: &mut String,
    from: Point,
    to: Point,
    group: &[&str],
) -> fmt::Result {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
    // Unit normal to the straight line between the two nodes
    let (nx, ny) = (-dy / length, dx / length);
    let mid = Point {
        x: (from.x + to.x) / 2.0,
        y: (from.y + to.y) / 2.0,
    };

    for (i, label) in group.iter().enumerate() {
        let offset = (i as f64 - (group.len() as f64 - 1.0) / 2.0) * PARALLEL_SPACING;
        // Control point is twice the desired curve offset
        let control = Point {
            x: mid.x + nx * offset * 2.0,
            y: mid.y + ny * offset * 2.0,
        };
        writeln!(
            svg,
            r#"    <path d="M {:.1} {:.1} Q {:.1} {:.1} {:.1} {:.1}"/>"#,
            from.x, from.y, control.x, control.y, to.x, to.y
        )?;
        push_label(labels, mid.x + nx * offset, mid.y + ny * offset, label)?;
    }
    Ok(())
}

fn draw_self_links(
    svg: &mut String,
    labels: &mut String,
    at: Point,
    group: &[&str],
    node_radius: u32,
) -> fmt::Result {
    let base = f64::from(node_radius);
    for (i, label) in group.iter().enumerate() {
        let radius = base * 0.6 + i as f64 * 10.0;
        let cy = at.y - base - radius * 0.5;
        writeln!(
            svg,
            r#"    <circle cx="{:.1}" cy="{:.1}" r="{:.1}"/>"#,
            at.x, cy, radius
        )?;
        push_label(labels, at.x, cy - radius - 4.0, label)?;
    }
    Ok(())
}

fn push_label(labels: &mut String, x: f64, y: f64, label: &str) -> fmt::Result {
    writeln!(
        labels,
        concat!(
            r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="{}" fill="black" "#,
            r#"stroke="white" stroke-width="3" paint-order="stroke">{}</text>"#,
        ),
        x,
        y,
        LABEL_FONT_SIZE,
        escape(label)
    )
}

pub fn write_svg(path: &Path, topology: &Topology, config: &LayoutConfig) -> Result<()> {
    fs::write(path, render_svg(topology, config)?)?;
    info!(
        path = %path.display(),
        width = config.width,
        height = config.height,
        "Rendered topology image"
    );
    Ok(())
}
