//! Sobel gradients, Canny edge detection and edge-region extraction.

use image::GrayImage;
use std::collections::VecDeque;

/// Hysteresis thresholds on the L1 gradient magnitude
pub(super) const LOW_THRESHOLD: f64 = 50.0;
pub(super) const HIGH_THRESHOLD: f64 = 150.0;

/// tan(22.5°) and tan(67.5°), the direction bin boundaries
const TAN_22_5: f64 = 0.414_213_562_373_095;
const TAN_67_5: f64 = 2.414_213_562_373_095;

/// 3x3 Sobel responses, zero on the one-pixel border
pub(super) struct Gradients {
    width: u32,
    gx: Vec<f64>,
    gy: Vec<f64>,
}

impl Gradients {
    pub(super) fn at(&self, x: u32, y: u32) -> (f64, f64) {
        let i = (y * self.width + x) as usize;
        (self.gx[i], self.gy[i])
    }
}

pub(super) fn sobel(gray: &GrayImage) -> Gradients {
    let (width, height) = gray.dimensions();
    let len = (width * height) as usize;
    let mut gx = vec![0.0; len];
    let mut gy = vec![0.0; len];

    if width >= 3 && height >= 3 {
        let p = |x: u32, y: u32| gray.get_pixel(x, y)[0] as f64;
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let i = (y * width + x) as usize;
                gx[i] = (p(x + 1, y - 1) + 2.0 * p(x + 1, y) + p(x + 1, y + 1))
                    - (p(x - 1, y - 1) + 2.0 * p(x - 1, y) + p(x - 1, y + 1));
                gy[i] = (p(x - 1, y + 1) + 2.0 * p(x, y + 1) + p(x + 1, y + 1))
                    - (p(x - 1, y - 1) + 2.0 * p(x, y - 1) + p(x + 1, y - 1));
            }
        }
    }

    Gradients { width, gx, gy }
}

/// Binary edge map
pub(super) struct EdgeMap {
    width: u32,
    height: u32,
    edges: Vec<bool>,
}

impl EdgeMap {
    fn is_edge(&self, x: u32, y: u32) -> bool {
        self.edges[(y * self.width + x) as usize]
    }
}

/// Canny edge detection: Sobel gradients, non-maximum suppression, hysteresis.
pub(super) fn canny(gray: &GrayImage, low: f64, high: f64) -> EdgeMap {
    let (width, height) = gray.dimensions();
    let len = (width * height) as usize;
    let mut edges = vec![false; len];

    if width < 3 || height < 3 {
        return EdgeMap {
            width,
            height,
            edges,
        };
    }

    let gradients = sobel(gray);
    let magnitude: Vec<f64> = gradients
        .gx
        .iter()
        .zip(&gradients.gy)
        .map(|(gx, gy)| gx.abs() + gy.abs())
        .collect();
    let mag = |x: u32, y: u32| magnitude[(y * width + x) as usize];

    // Non-maximum suppression along the quantized gradient direction
    let mut candidate = vec![false; len];
    let mut strong = Vec::new();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let i = (y * width + x) as usize;
            let m = magnitude[i];
            if m <= low {
                continue;
            }

            let (gx, gy) = (gradients.gx[i], gradients.gy[i]);
            let (ax, ay) = (gx.abs(), gy.abs());
            let is_peak = if ay <= TAN_22_5 * ax {
                m > mag(x - 1, y) && m >= mag(x + 1, y)
            } else if ay > TAN_67_5 * ax {
                m > mag(x, y - 1) && m >= mag(x, y + 1)
            } else if gx * gy > 0.0 {
                m > mag(x - 1, y - 1) && m > mag(x + 1, y + 1)
            } else {
                m > mag(x + 1, y - 1) && m > mag(x - 1, y + 1)
            };

            if is_peak {
                candidate[i] = true;
                if m > high {
                    strong.push((x, y));
                }
            }
        }
    }

    // Hysteresis: keep weak candidates 8-connected to a strong pixel
    let mut queue: VecDeque<(u32, u32)> = VecDeque::new();
    for (x, y) in strong {
        let i = (y * width + x) as usize;
        if !edges[i] {
            edges[i] = true;
            queue.push_back((x, y));
        }
    }
    while let Some((x, y)) = queue.pop_front() {
        for (nx, ny) in neighbours(x, y, width, height) {
            let i = (ny * width + nx) as usize;
            if candidate[i] && !edges[i] {
                edges[i] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    EdgeMap {
        width,
        height,
        edges,
    }
}

/// Axis-aligned bounding box of one connected edge component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn area(&self) -> u32 {
        self.width * self.height
    }
}

/// Bounding boxes of 8-connected edge components, in scan order
pub(super) fn edge_regions(map: &EdgeMap) -> Vec<Region> {
    let (width, height) = (map.width, map.height);
    let mut visited = vec![false; map.edges.len()];
    let mut regions = Vec::new();
    let mut queue: VecDeque<(u32, u32)> = VecDeque::new();

    for y in 0..height {
        for x in 0..width {
            let i = (y * width + x) as usize;
            if visited[i] || !map.is_edge(x, y) {
                continue;
            }

            visited[i] = true;
            queue.push_back((x, y));
            let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);

            while let Some((cx, cy)) = queue.pop_front() {
                min_x = min_x.min(cx);
                min_y = min_y.min(cy);
                max_x = max_x.max(cx);
                max_y = max_y.max(cy);

                for (nx, ny) in neighbours(cx, cy, width, height) {
                    let ni = (ny * width + nx) as usize;
                    if !visited[ni] && map.is_edge(nx, ny) {
                        visited[ni] = true;
                        queue.push_back((nx, ny));
                    }
                }
            }

            regions.push(Region {
                x: min_x,
                y: min_y,
                width: max_x - min_x + 1,
                height: max_y - min_y + 1,
            });
        }
    }

    regions
}

fn neighbours(x: u32, y: u32, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    (-1i64..=1)
        .flat_map(|dy| (-1i64..=1).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| dx != 0 || dy != 0)
        .filter_map(move |(dx, dy)| {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx >= 0 && ny >= 0 && nx < width as i64 && ny < height as i64 {
                Some((nx as u32, ny as u32))
            } else {
                None
            }
        })
}
