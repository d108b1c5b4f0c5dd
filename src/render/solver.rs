// Builds the control-point list for one output row.
//
// The sweep walks the right half of the row outward from the center. Each
// step projects the surface patch under `h_place` through both eyes, giving
// a new control point at `x = h_place + s/2` linked to `other_x = h_place -
// s/2`. Depending on how the new point relates to what has already been
// emitted it falls into one of three topological cases: both eyes see the
// patch, only the right eye does, or only the left eye does. The left half
// of the row reuses the same sweep against a mirrored depth source, then the
// list is reflected into its true orientation.

use super::control_point::ControlPoint;
use super::list::{NodeId, PointList};
use super::StereoParams;
use crate::errors::{Error, Result};
use crate::heightmap::HeightmapView;

/// Horizontal separation, in pixels, between the two eyes' projections of
/// the surface at depth sample (x, row).
///
/// Similar triangles against the near and far plane disparities: perceived
/// distance d interpolates between the planes, then s = d*E / (d + 1).
pub fn separation(view: &HeightmapView, row: usize, x: f32, params: &StereoParams) -> f32 {
    let c = view.get(x, row);

    let d = (c * params.separation_min) / (params.eye_separation - params.separation_min)
        + ((1.0 - c) * params.separation_max) / (params.eye_separation - params.separation_max);

    (d * params.eye_separation) / (d + 1.0)
}

/// Fraction into a tiled texture row of the given width the x value lands at.
fn x_to_texture(x: f32, width: f32) -> f32 {
    (x % width) / width
}

/// Texture-row shift for texture inserted at `x` (relative to the row
/// center). Each successive texture-width column outward gets a distinct
/// shift, alternating sign, so inserted ranges never echo their neighbors.
fn inserted_texture_shift(width: f32, x: f32) -> i64 {
    let column = (x / width) as i64;

    let shift = column / 2 + 1;

    if column % 2 != 0 { -shift } else { shift }
}

struct RightHalfSweep {
    // Right-most position any point has linked to; decides eye visibility.
    greatest_other_x: f32,
    // Bookmark into the list to speed up range queries and insertions.
    start: Option<NodeId>,
    // Whether the previous control point didn't link with anything.
    last_invalid: bool,
}

pub fn generate_control_points(
    points: &mut PointList,
    row: usize,
    view: &mut HeightmapView,
    params: &StereoParams,
) -> Result<()> {
    let width = view.width() as f32;

    // The left half is solved as a right half against a mirrored depth
    // source, then reflected into place.
    view.set_reflected(true);

    generate_middle_control_points(points, row, view, params, width);
    generate_right_half_control_points(points, row, view, params)?;

    view.set_reflected(false);
    points.reflect(0.5 * width);

    generate_right_half_control_points(points, row, view, params)?;

    Ok(())
}

/// The two seed points at the center of the row. At the exact center both
/// eyes see the same texel: the texture spans from u=0 at `center - s/2` to
/// u=1 at `center + s/2`.
fn generate_middle_control_points(
    points: &mut PointList,
    row: usize,
    view: &HeightmapView,
    params: &StereoParams,
    width: f32,
) {
    let h_place = 0.5 * width;
    let half_sep = 0.5 * separation(view, row, h_place, params);

    let mut point = ControlPoint {
        x: h_place - half_sep,
        other_x: h_place + half_sep,
        left_x: 1.0,
        left_y: 0,
        right_x: 0.0,
        right_y: 0,
    };
    points.add(point, None);

    point.other_x = point.x;
    point.x = h_place + half_sep;
    points.add(point, None);
}

fn generate_right_half_control_points(
    points: &mut PointList,
    row: usize,
    view: &HeightmapView,
    params: &StereoParams,
) -> Result<()> {
    let width = view.width() as f32;

    let last = points.last().expect("seeded list");
    let mut sweep = RightHalfSweep {
        greatest_other_x: points.point(last).other_x,
        start: points.prev(last),
        last_invalid: false,
    };

    // The caller has already generated the two control points at the
    // midpoint, so begin one pixel to its right.
    let mut h_place = 0.5 * width + 1.0;
    while h_place < width {
        generate_h_place_control_points(points, row, view, params, h_place, &mut sweep)?;
        h_place += 1.0;
    }

    Ok(())
}

fn generate_h_place_control_points(
    points: &mut PointList,
    row: usize,
    view: &HeightmapView,
    params: &StereoParams,
    h_place: f32,
    sweep: &mut RightHalfSweep,
) -> Result<()> {
    let half_sep = 0.5 * separation(view, row, h_place, params);
    let center = 0.5 * view.width() as f32;

    let mut point = ControlPoint {
        x: h_place + half_sep,
        other_x: h_place - half_sep,
        left_x: -1.0,
        left_y: 0,
        right_x: 0.0,
        right_y: 0,
    };

    let last = points.last().expect("seeded list");

    if point.other_x <= sweep.greatest_other_x {
        left_eye_cannot_see(points, params.separation_max, center, sweep, &mut point);
    } else if point.x <= points.point(last).x {
        right_eye_cannot_see(points, sweep, &mut point);
    } else {
        both_eyes_can_see(points, params.separation_max, sweep, &mut point)?;
    }

    points.add(point, points.last());

    Ok(())
}

/// The new point links to a place left of where a previous point linked, so
/// the left eye can't see what the right eye sees here. The range between
/// the previous point and this one has to be invented from the texture, on a
/// shifted texture row so it doesn't echo.
fn left_eye_cannot_see(
    points: &mut PointList,
    separation_max: f32,
    center: f32,
    sweep: &mut RightHalfSweep,
    point: &mut ControlPoint,
) {
    let last = points.last().expect("seeded list");
    let last_x = points.point(last).x;
    {
        let lp = points.point_mut(last);
        lp.right_x = x_to_texture(last_x, separation_max);
        lp.right_y = lp.left_y;
    }
    if !sweep.last_invalid {
        points.point_mut(last).right_y = inserted_texture_shift(separation_max, point.x - center);
    }

    point.left_x = x_to_texture(point.x, separation_max);
    point.left_y = points.point(last).right_y;

    // If this point happens to map to the edge of the texture, the left side
    // should address the right end of the texel row and vice versa.
    if point.left_x == 0.0 {
        point.left_x = 1.0;
    }
    if point.right_x == 1.0 {
        point.right_x = 0.0;
    }

    if points.point(last).right_x >= point.left_x {
        // The inserted range wraps around the edge of the texture, so an
        // extra control point is needed to represent the seam.
        insert_wraparound_control_point(points, point);
    }

    sweep.last_invalid = true;
}

fn insert_wraparound_control_point(points: &mut PointList, point: &ControlPoint) {
    let last = points.last().expect("seeded list");
    let lp = *points.point(last);

    let seam = ControlPoint {
        x: lp.x + (point.x - lp.x) * (1.0 - lp.right_x) / (1.0 + point.left_x - lp.right_x),
        other_x: -1.0,
        left_x: 1.0,
        left_y: point.left_y,
        right_x: 0.0,
        right_y: point.left_y,
    };

    points.add(seam, Some(last));
}

/// The new point passes through the screen left of at least one previously
/// emitted point, which this nearer patch now occludes from the right eye.
/// Retract those points and take over their texture range.
fn right_eye_cannot_see(
    points: &mut PointList,
    sweep: &mut RightHalfSweep,
    point: &mut ControlPoint,
) {
    let mut removed = ControlPoint::default();

    loop {
        let last = points.last().expect("seeded list");
        if point.x > points.point(last).x {
            break;
        }
        removed = *points.point(last);
        if sweep.start == Some(last) {
            sweep.start = points.prev(last);
        }
        points.remove_last();
    }

    // Interpolate the texture position between the point immediately to the
    // left and the removed point immediately to the right.
    let last = points.last().expect("seeded list");
    let lp = *points.point(last);
    point.left_x =
        lp.right_x + (removed.left_x - lp.right_x) * (point.x - lp.x) / (removed.x - lp.x);
    point.left_y = lp.right_y;

    sweep.greatest_other_x = point.other_x;
    sweep.last_invalid = false;
}

/// The well-behaved case: the new point falls right of all previous points
/// and links right of all previous links. Its texture mapping comes from
/// interpolating the existing list at `other_x`.
fn both_eyes_can_see(
    points: &mut PointList,
    separation_max: f32,
    sweep: &mut RightHalfSweep,
    point: &mut ControlPoint,
) -> Result<()> {
    let last = points.last().expect("seeded list");

    let bound_x = if sweep.last_invalid {
        point.other_x
    } else {
        points.point(last).other_x
    };

    let (start, end) = points.find_range(bound_x, point.other_x, sweep.start);
    let (start, end) = match (start, end) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(Error::InternalInvariant(format!(
                "empty control point range for {bound_x} .. {} (start is {start:?}, end is {end:?})",
                point.other_x,
            )));
        }
    };
    sweep.start = Some(start);

    if start == end {
        // The previous point was invalid AND this point links to a position
        // that exactly coincides with an existing control point.
        let sp = points.point(start);
        point.left_x = sp.left_x;
        point.left_y = sp.left_y;
        point.right_x = sp.right_x;
        point.right_y = sp.right_y;
    } else {
        let end_point = *points.point(end);
        let end_prev = *points.point(points.prev(end).expect("end follows start"));

        point.right_x = end_prev.right_x
            + (point.other_x - end_prev.x) * (end_point.left_x - end_prev.right_x)
                / (end_point.x - end_prev.x);
        point.right_y = end_prev.right_y;

        point.left_x = point.right_x;
        point.left_y = point.right_y;

        // If the linked position lands exactly on another control point, the
        // right side must follow that point's right side; it could mark a
        // texture wrap seam or a row-shift change.
        if point.other_x == end_point.x {
            point.right_x = end_point.right_x;
            point.right_y = end_point.right_y;
        }
    }

    if sweep.last_invalid {
        // The previous point didn't link to anything; the range between it
        // and this point is inserted texture, chained onto the same shifted
        // row as the previous insertion.
        let last = points.last().expect("seeded list");
        let last_x = points.point(last).x;
        {
            let lp = points.point_mut(last);
            lp.right_x = x_to_texture(last_x, separation_max);
            lp.right_y = lp.left_y;
        }

        point.left_x = x_to_texture(point.x, separation_max);
        point.left_y = points.point(last).right_y;
    } else if start != end {
        // Copy any control points enclosed by the linked range, projected
        // into the span between the previous point and this one.
        let mut node = points.next(start);
        while let Some(id) = node {
            if id == end {
                break;
            }
            let next = points.next(id);

            let mut copy = *points.point(id);
            copy.other_x = copy.x;

            let last = points.last().expect("seeded list");
            let lp = *points.point(last);
            copy.x = lp.x
                + (copy.other_x - lp.other_x) * (point.x - lp.x) / (point.other_x - lp.other_x);

            // Don't copy it if the copy would exactly coincide with this
            // control point.
            if copy.x != point.x {
                points.add(copy, Some(last));
            }

            node = next;
        }
    }

    sweep.greatest_other_x = point.other_x;
    sweep.last_invalid = false;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::heightmap::Heightmap;
    use crate::raster::Image;

    fn flat_heightmap(width: usize, depth: f32) -> Heightmap {
        let mut image = Image::new(width, 1);
        image.fill(Color::from_rgb(depth, depth, depth));
        Heightmap::from_image(image)
    }

    fn params(eye: f32, min: f32, max: f32) -> StereoParams {
        StereoParams {
            eye_separation: eye,
            separation_min: min,
            separation_max: max,
            edge_echo_offset: 2,
        }
    }

    fn solve(heightmap: &Heightmap, params: &StereoParams) -> PointList {
        let mut view = heightmap.view();
        let mut points = PointList::with_capacity(2 * heightmap.width());
        generate_control_points(&mut points, 0, &mut view, params).unwrap();
        points
    }

    #[test]
    fn separation_tracks_depth() {
        let p = params(100.0, 10.0, 20.0);

        let far = flat_heightmap(4, 0.0);
        let near = flat_heightmap(4, 1.0);
        let mid = flat_heightmap(4, 0.5);

        let s_far = separation(&far.view(), 0, 1.0, &p);
        let s_mid = separation(&mid.view(), 0, 1.0, &p);
        let s_near = separation(&near.view(), 0, 1.0, &p);

        assert!((s_far - 20.0).abs() < 1e-4);
        assert!((s_near - 10.0).abs() < 1e-4);
        assert!(s_near < s_mid && s_mid < s_far);
    }

    #[test]
    fn separation_is_monotone_in_depth() {
        let p = params(280.0, 91.0, 140.0);
        let mut prev = f32::MAX;
        for i in 0..=100 {
            let c = i as f32 / 100.0;
            let map = flat_heightmap(4, c);
            let s = separation(&map.view(), 0, 1.0, &p);
            assert!(s <= prev + 1e-4, "separation increased at depth {c}");
            assert!((91.0..=140.0 + 1e-3).contains(&s));
            prev = s;
        }
    }

    #[test]
    fn texture_shift_alternates_and_grows() {
        assert_eq!(inserted_texture_shift(16.0, 0.0), 1);
        assert_eq!(inserted_texture_shift(16.0, 15.9), 1);
        assert_eq!(inserted_texture_shift(16.0, 16.0), -1);
        assert_eq!(inserted_texture_shift(16.0, 32.0), 2);
        assert_eq!(inserted_texture_shift(16.0, 48.0), -2);
        assert_eq!(inserted_texture_shift(16.0, 64.0), 3);
    }

    fn assert_well_formed(points: &PointList) {
        let ids: Vec<_> = points.iter().collect();
        assert!(ids.len() >= 2);

        for pair in ids.windows(2) {
            let a = points.point(pair[0]);
            let b = points.point(pair[1]);
            assert!(a.x < b.x, "control points out of order: {} then {}", a.x, b.x);
        }

        for id in &ids {
            let p = points.point(*id);
            assert!(
                (-1e-4..=1.0 + 1e-4).contains(&p.right_x),
                "right_x {} out of range",
                p.right_x
            );
            // left_x of -1 marks "unset" only during the sweep; the finished
            // list must not contain it.
            assert!((-1e-4..=1.0 + 1e-4).contains(&p.left_x), "left_x {} out of range", p.left_x);
        }
    }

    #[test]
    fn flat_row_is_well_formed() {
        let map = flat_heightmap(100, 0.0);
        let points = solve(&map, &params(100.0, 20.0, 20.0));
        assert_well_formed(&points);
    }

    #[test]
    fn flat_row_spacing() {
        let map = flat_heightmap(100, 0.0);
        let points = solve(&map, &params(100.0, 20.0, 20.0));

        // The sweep emits one point per depth sample, so interior points are
        // one pixel apart, except for the single seed span of width s
        // centered on the row.
        let xs: Vec<f32> = points.iter().map(|id| points.point(id).x).collect();
        let mut wide_gaps = 0;
        for pair in xs.windows(2) {
            let gap = pair[1] - pair[0];
            if (gap - 20.0).abs() < 1e-3 {
                assert!((pair[0] - 40.0).abs() < 1e-3, "seed span at {}", pair[0]);
                wide_gaps += 1;
            } else {
                assert!((gap - 1.0).abs() < 1e-3, "gap {gap} at {}", pair[0]);
            }
        }
        assert_eq!(wide_gaps, 1);
    }

    #[test]
    fn raised_square_is_well_formed() {
        let mut image = Image::new(32, 32);
        image.fill(Color::from_rgb(0.0, 0.0, 0.0));
        for y in 14..18 {
            for x in 14..18 {
                image.set_pixel(x, y, [1.0, 1.0, 1.0, 1.0]);
            }
        }
        let map = Heightmap::from_image(image);
        let p = params(32.0, 8.0, 12.0);

        let mut shifted = false;
        for row in 0..32 {
            let mut view = map.view();
            let mut points = PointList::new();
            generate_control_points(&mut points, row, &mut view, &p).unwrap();
            assert_well_formed(&points);

            // Rows crossing the square de-occlude texture at its edges and
            // must shift the inserted ranges onto other texture rows.
            if (14..18).contains(&row) {
                shifted |= points.iter().any(|id| points.point(id).right_y != 0);
            }
        }
        assert!(shifted, "no echo-avoidance shifts around the raised square");
    }

    #[test]
    fn gradient_rows_are_well_formed() {
        // A ramp exercises the occlusion cases on both sides.
        let mut image = Image::new(64, 2);
        for x in 0..64 {
            let c = if x % 7 == 0 { 0.9 } else { x as f32 / 64.0 };
            image.set_pixel(x, 0, [c, c, c, 1.0]);
            image.set_pixel(x, 1, [1.0 - c, 1.0 - c, 1.0 - c, 1.0]);
        }
        let map = Heightmap::from_image(image);
        let p = params(40.0, 10.0, 16.0);

        for row in 0..2 {
            let mut view = map.view();
            let mut points = PointList::new();
            generate_control_points(&mut points, row, &mut view, &p).unwrap();
            assert_well_formed(&points);
        }
    }

    #[test]
    fn middle_seed_points() {
        let map = flat_heightmap(100, 0.0);
        let p = params(100.0, 20.0, 20.0);
        let mut points = PointList::new();
        generate_middle_control_points(&mut points, 0, &map.view(), &p, 100.0);

        let first = points.point(points.first().unwrap());
        let last = points.point(points.last().unwrap());

        assert!((first.x - 40.0).abs() < 1e-4);
        assert!((first.other_x - 60.0).abs() < 1e-4);
        assert!((last.x - 60.0).abs() < 1e-4);
        assert!((last.other_x - 40.0).abs() < 1e-4);
        for p in [first, last] {
            assert_eq!(p.left_x, 1.0);
            assert_eq!(p.right_x, 0.0);
            assert_eq!(p.left_y, 0);
            assert_eq!(p.right_y, 0);
        }
    }
}
