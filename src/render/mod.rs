use std::time::Instant;

use rayon::prelude::*;

use crate::errors::Result;
use crate::heightmap::Heightmap;
use crate::raster::Image;

pub mod control_point;
pub mod list;
pub mod painter;
pub mod solver;

use list::PointList;

/// Stereo geometry, all in output pixels.
/// Requires 0 < separation_min < separation_max < eye_separation and a
/// nonzero edge_echo_offset; see config validation.
#[derive(Debug, Clone, Copy)]
pub struct StereoParams {
    pub eye_separation: f32,
    pub separation_min: f32,
    pub separation_max: f32,
    pub edge_echo_offset: i64,
}

/// Synthesize the whole stereogram. Rows only share read-only inputs and
/// disjoint slices of the output, so they run in parallel; the result is
/// identical to a sequential loop.
pub fn create_stereogram(
    heightmap: &Heightmap,
    texture: &Image,
    params: &StereoParams,
) -> Result<Image> {
    let width = heightmap.width();
    let height = heightmap.height();

    let start = Instant::now();

    let mut output = Image::new(width, height);

    output
        .pixels_mut()
        .par_chunks_exact_mut(4 * width)
        .enumerate()
        .try_for_each(|(row, out_row)| generate_row(out_row, row, heightmap, texture, params))?;

    debug!("generated {width}x{height} stereogram in {:?}", start.elapsed());

    Ok(output)
}

fn generate_row(
    out_row: &mut [f32],
    row: usize,
    heightmap: &Heightmap,
    texture: &Image,
    params: &StereoParams,
) -> Result<()> {
    let mut view = heightmap.view();

    // Worst case each sweep step inserts a point plus a wraparound seam.
    let mut points = PointList::with_capacity(2 * heightmap.width());

    solver::generate_control_points(&mut points, row, &mut view, params)?;
    painter::color_row(out_row, row, texture, &points, params.edge_echo_offset);

    Ok(())
}
