/// A seam in one output row. Between two adjacent control points the texture
/// mapping is a single linear ramp; everything interesting happens at the
/// points themselves.
///
/// `x` is the position in the output row, `other_x` the mirrored position at
/// which the other eye sees the same surface patch. `left_x`/`right_x` are
/// texture u coordinates in [0, 1] bounding the ranges on either side, and
/// `left_y`/`right_y` are texture-row shifts used to keep inserted texture
/// from echoing neighboring rows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlPoint {
    pub x: f32,
    pub other_x: f32,

    pub left_x: f32,
    pub left_y: i64,

    pub right_x: f32,
    pub right_y: i64,
}

impl ControlPoint {
    /// Mirror the point around a vertical axis. The left/right sides trade
    /// places, u coordinates flip to 1 - u, and row shifts negate. A flipped
    /// u of exactly 0 on the left (or 1 on the right) is snapped to the other
    /// end of the texture so it keeps addressing the same texel after the
    /// direction change.
    pub fn reflect(&mut self, axis: f32) {
        self.x = axis + (axis - self.x);
        self.other_x = axis + (axis - self.other_x);

        self.left_x = 1.0 - self.left_x;
        self.right_x = 1.0 - self.right_x;
        std::mem::swap(&mut self.left_x, &mut self.right_x);

        if self.left_x == 0.0 {
            self.left_x = 1.0;
        }
        if self.right_x == 1.0 {
            self.right_x = 0.0;
        }

        self.left_y = -self.left_y;
        self.right_y = -self.right_y;
        std::mem::swap(&mut self.left_y, &mut self.right_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflect_mirrors_positions() {
        let mut p = ControlPoint {
            x: 30.0,
            other_x: 10.0,
            left_x: 0.25,
            left_y: 1,
            right_x: 0.75,
            right_y: -2,
        };
        p.reflect(50.0);

        assert_eq!(p.x, 70.0);
        assert_eq!(p.other_x, 90.0);
        // Sides swap and flip: old right 0.75 becomes new left 0.25.
        assert_eq!(p.left_x, 0.25);
        assert_eq!(p.right_x, 0.75);
        assert_eq!(p.left_y, 2);
        assert_eq!(p.right_y, -1);
    }

    #[test]
    fn reflect_snaps_texture_edges() {
        let mut p = ControlPoint {
            x: 0.0,
            other_x: 0.0,
            left_x: 1.0,
            left_y: 0,
            right_x: 0.0,
            right_y: 0,
        };
        p.reflect(0.0);

        // (1, 0) flips to (0, 1), swaps to (1, 0), and the snaps keep it there.
        assert_eq!(p.left_x, 1.0);
        assert_eq!(p.right_x, 0.0);
    }

    #[test]
    fn double_reflect_is_identity() {
        let cases = [
            ControlPoint {
                x: 12.5,
                other_x: 40.0,
                left_x: 0.3,
                left_y: 2,
                right_x: 0.6,
                right_y: -1,
            },
            ControlPoint { x: 0.0, other_x: 1.0, left_x: 1.0, left_y: 0, right_x: 0.0, right_y: 0 },
            ControlPoint {
                x: -3.0,
                other_x: 7.0,
                left_x: 0.5,
                left_y: -4,
                right_x: 0.5,
                right_y: 4,
            },
        ];

        for case in cases {
            let mut p = case;
            p.reflect(16.0);
            p.reflect(16.0);
            assert_eq!(p, case);
        }
    }
}
