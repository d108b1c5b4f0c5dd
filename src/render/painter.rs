// Walks a finished control-point list left to right and paints one output
// row. Adjacent points bound a single linear texture ramp; within each ramp
// the painter walks integer pixel boundaries, accumulating coverage-weighted
// texture color. A pixel that straddles a control point keeps accumulating
// across the pair boundary, which is what antialiases the seams.

use super::list::PointList;
use crate::raster::Image;

pub fn color_row(
    out_row: &mut [f32],
    row: usize,
    texture: &Image,
    points: &PointList,
    edge_echo_offset: i64,
) {
    let width_px = out_row.len() / 4;
    let width = width_px as f32;

    let base_row = row % texture.height();

    let mut accum = [0.0f32; 4];

    let ids: Vec<_> = points.iter().collect();
    for pair in ids.windows(2) {
        let a = points.point(pair[0]);
        let b = points.point(pair[1]);

        let mut left = a.x;
        let right = b.x;

        let mut left_u = a.right_x;
        let right_u = b.left_x;

        // Nothing to do until the pair reaches the left edge of the image.
        if right <= 0.0 {
            continue;
        }
        // And nothing more once we've moved past the right edge.
        if left >= width {
            break;
        }

        let texture_row = shifted_texture_row(base_row, a.right_y, edge_echo_offset, texture.height());

        while right - left.floor() > 1.0 {
            // The range covers more than one output pixel; finish this one.
            let tmp_right = left.floor() + 1.0;
            let tmp_right_u = left_u + (right_u - left_u) * (tmp_right - left) / (right - left);

            if left >= width {
                break;
            }
            if left >= 0.0 {
                add_color_for_range(
                    texture,
                    left_u,
                    tmp_right_u,
                    texture_row,
                    tmp_right - left,
                    &mut accum,
                );

                let x = 4 * left as usize;
                out_row[x..x + 4].copy_from_slice(&accum);
                accum = [0.0; 4];
            }

            left = tmp_right;
            left_u = tmp_right_u;
        }

        if left != right && left < width {
            // The rest of the range sits inside a single pixel. Keep filling
            // the accumulator; if the range ends exactly on a pixel boundary
            // the pixel is done, otherwise the next pair continues it.
            add_color_for_range(texture, left_u, right_u, texture_row, right - left, &mut accum);

            if right.floor() == right {
                let x = 4 * left as usize;
                out_row[x..x + 4].copy_from_slice(&accum);
                accum = [0.0; 4];
            }
        }
    }
}

// Applies `shift` steps of `offset` rows to the base texture row, skipping
// over the base row itself so inserted texture never lands on the row it is
// supposed to differ from.
fn shifted_texture_row(base_row: usize, shift: i64, offset: i64, height: usize) -> usize {
    let height = height as i64;
    // With a degenerate offset every step lands back on the base row.
    if shift == 0 || offset.rem_euclid(height) == 0 {
        return base_row;
    }

    let base = base_row as i64;
    let mut row = base;

    let mut i = 0i64;
    while i < shift {
        row = (row + offset).rem_euclid(height);
        if row == base {
            i -= 1;
        }
        i += 1;
    }

    let mut i = 0i64;
    while i > shift {
        row = (row - offset).rem_euclid(height);
        if row == base {
            i += 1;
        }
        i -= 1;
    }

    row as usize
}

/// Accumulate the average texture color over the u range `left..right`,
/// weighted by `scale` (this range's share of one output pixel). Exact box
/// filtering: each texel contributes the length of its intersection with the
/// range.
pub fn add_color_for_range(
    texture: &Image,
    left: f32,
    right: f32,
    row: usize,
    scale: f32,
    accum: &mut [f32; 4],
) {
    if scale <= 0.0 || scale > 1.0 {
        warn!("add_color_for_range: scale is {scale}");
    }

    let mut left = left;
    let mut right = right;
    if !(0.0..=1.0).contains(&left) {
        warn!("left ({left}) is outside the range 0..1");
        left = left.clamp(0.0, 1.0);
    }
    if !(0.0..=1.0).contains(&right) {
        warn!("right ({right}) is outside the range 0..1");
        right = right.clamp(0.0, 1.0);
    }

    let width = texture.width() as f32;
    let mut left = left * width;
    let right = right * width;

    let length = right - left;
    if length <= 0.0 {
        warn!("add_color_for_range: empty range {left} .. {right}");
        return;
    }

    let mut rgba = [0.0f32; 4];

    while right - left.floor() > 1.0 {
        // The range straddles a texel boundary.
        let tmp_right = left.floor() + 1.0;
        let pixel = texture.pixel(left.floor() as usize, row);
        for c in 0..4 {
            rgba[c] += pixel[c] * (tmp_right - left);
        }
        left = tmp_right;
    }

    // Fully contained within a single texel now.
    let x = (left.floor() as usize).min(texture.width() - 1);
    let pixel = texture.pixel(x, row);
    for c in 0..4 {
        rgba[c] += pixel[c] * (right - left);
    }

    let scale = scale / length;
    for c in 0..4 {
        accum[c] += rgba[c] * scale;
    }
}
