//! Orientation codec: 3x3 orientation matrix <-> (direction, roll).
//!
//! A bone is stored as a head, a tail and a roll angle. The direction
//! `tail - head` fixes the bone's local Y axis; the roll disambiguates the
//! twist about that axis. [`decompose`] and [`compose`] convert between that
//! representation and a full orientation matrix.
//!
//! Matrices use the column-vector convention: column `i` is the world-space
//! image of local axis `i`.

use nalgebra::{Matrix3, Rotation3, Unit, Vector3};

/// Squared-length threshold for `cross(reference, direction)` below which the
/// direction is treated as parallel to the reference axis.
pub const DEGENERATE_EPSILON: f64 = 1e-10;

/// Fixed world axis the zero-roll frame is built around.
#[inline]
pub fn reference_axis() -> Vector3<f64> {
    Vector3::new(0.0, 0.1, 0.0)
}

/// Split an orientation into the bone direction and its roll.
///
/// The direction is the matrix's second column and is not normalized: its
/// length becomes the bone length.
pub fn decompose(orientation: &Matrix3<f64>) -> (Vector3<f64>, f64) {
    let direction: Vector3<f64> = orientation.column(1).into_owned();
    let reference = compose(&direction, 0.0);
    // `reference` is orthonormal, so its transpose is its inverse.
    let residual = reference.transpose() * orientation;
    let roll = residual[(0, 2)].atan2(residual[(2, 2)]);
    (direction, roll)
}

/// Build the orientation whose Y axis points along `direction`, twisted by `roll`.
///
/// `direction` must be non-zero; a zero vector yields NaN entries.
pub fn compose(direction: &Vector3<f64>, roll: f64) -> Matrix3<f64> {
    let target = reference_axis();
    let nor = direction.normalize();
    let axis = target.cross(&nor);

    let frame = if axis.dot(&axis) > DEGENERATE_EPSILON {
        let theta = target.angle(&nor);
        Rotation3::from_axis_angle(&Unit::new_normalize(axis), theta).into_inner()
    } else {
        // Parallel or anti-parallel to the reference axis. This scale frame is
        // not the limit of the rotation above, so orientations can flip when a
        // direction crosses this neighbourhood.
        let updown = if target.dot(&nor) > 0.0 { 1.0 } else { -1.0 };
        Matrix3::from_diagonal(&Vector3::new(updown, updown, 1.0))
    };

    let twist = Rotation3::from_axis_angle(&Unit::new_unchecked(nor), roll).into_inner();
    twist * frame
}

/// Largest per-entry deviation between `compose(decompose(m))` and `m` with its
/// columns normalized.
pub fn round_trip_error(orientation: &Matrix3<f64>) -> f64 {
    let (direction, roll) = decompose(orientation);
    let rebuilt = compose(&direction, roll);
    (rebuilt - normalize_columns(orientation)).amax()
}

/// `m` with every non-zero column scaled to unit length.
pub(crate) fn normalize_columns(m: &Matrix3<f64>) -> Matrix3<f64> {
    let mut out = *m;
    for mut col in out.column_iter_mut() {
        let n = col.norm();
        if n > 0.0 {
            col /= n;
        }
    }
    out
}

/// True when `direction` lies inside the neighbourhood handled by the
/// degenerate branch of [`compose`].
pub fn is_degenerate_direction(direction: &Vector3<f64>, epsilon: f64) -> bool {
    let axis = reference_axis().cross(&direction.normalize());
    axis.dot(&axis) <= epsilon
}
