use nalgebra::{Matrix3, Point3, Rotation3, Unit, Vector3};

const TETRAHEDRAL_ANGLE_DEGREES: f64 = 109.47;

/// Computes the rigid transform that superimposes `from_points` onto `to_points`.
///
/// Uses the Kabsch algorithm on centered coordinates, correcting for
/// reflections so that the result is a proper rotation.
///
/// # Return
///
/// `(rotation, translation)` such that `rotation * p + translation` maps a
/// point of the `from` frame into the `to` frame, or `None` if the point sets
/// are empty, differ in size, or the decomposition fails.
pub fn superposition_transform(
    from_points: &[Point3<f64>],
    to_points: &[Point3<f64>],
) -> Option<(Rotation3<f64>, Vector3<f64>)> {
    if from_points.is_empty() || from_points.len() != to_points.len() {
        return None;
    }

    let n = from_points.len() as f64;
    let from_centroid = Point3::from(from_points.iter().map(|p| p.coords).sum::<Vector3<f64>>() / n);
    let to_centroid = Point3::from(to_points.iter().map(|p| p.coords).sum::<Vector3<f64>>() / n);

    let h = from_points
        .iter()
        .zip(to_points.iter())
        .fold(Matrix3::zeros(), |acc, (f, t)| {
            acc + (t - to_centroid) * (f - from_centroid).transpose()
        });

    let svd = h.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;

    let mut correction = Matrix3::identity();
    if (u * v_t).determinant() < 0.0 {
        correction[(2, 2)] = -1.0;
    }

    let rotation = Rotation3::from_matrix_unchecked(u * correction * v_t);
    let translation = to_centroid.coords - rotation * from_centroid.coords;

    Some((rotation, translation))
}

/// Places an ideal beta carbon on a backbone given its N, CA and C atoms.
pub fn ideal_cb_position(
    n_pos: &Point3<f64>,
    ca_pos: &Point3<f64>,
    c_pos: &Point3<f64>,
) -> Point3<f64> {
    let b = ca_pos - n_pos;
    let c = c_pos - ca_pos;
    let a = b.cross(&c);
    ca_pos + a * -0.58273431 + b * 0.56802827 - c * 0.54067466
}

fn any_perpendicular(v: &Vector3<f64>) -> Vector3<f64> {
    let reference = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    (reference - v * v.dot(&reference)).normalize()
}

fn unit_vectors(center: &Point3<f64>, neighbors: &[Point3<f64>]) -> Vec<Vector3<f64>> {
    neighbors.iter().map(|p| (p - center).normalize()).collect()
}

/// Hydrogen positions that complete a tetrahedral center bonded to 1-3 neighbors.
///
/// Returns `4 - neighbors.len()` positions, or nothing for other neighbor counts.
pub fn tetrahedral_hydrogens(
    center: &Point3<f64>,
    neighbors: &[Point3<f64>],
    bond_length: f64,
) -> Vec<Point3<f64>> {
    let dirs = unit_vectors(center, neighbors);
    let half_angle = (TETRAHEDRAL_ANGLE_DEGREES / 2.0).to_radians();

    match dirs.as_slice() {
        [u1] => {
            let p = any_perpendicular(u1);
            let axis = Unit::new_normalize(*u1);
            let angle = TETRAHEDRAL_ANGLE_DEGREES.to_radians();
            let first = u1 * angle.cos() + p * angle.sin();
            (0..3)
                .map(|k| {
                    let rot = Rotation3::from_axis_angle(&axis, (120.0 * k as f64).to_radians());
                    center + (rot * first) * bond_length
                })
                .collect()
        }
        [u1, u2] => {
            let bisector = -(u1 + u2).normalize();
            let normal = u1.cross(u2).normalize();
            [1.0, -1.0]
                .iter()
                .map(|sign| {
                    center
                        + (bisector * half_angle.cos() + normal * (sign * half_angle.sin()))
                            * bond_length
                })
                .collect()
        }
        [u1, u2, u3] => vec![center - (u1 + u2 + u3).normalize() * bond_length],
        _ => Vec::new(),
    }
}

/// Hydrogen positions that complete a trigonal-planar center bonded to 1-2 neighbors.
///
/// Returns `3 - neighbors.len()` positions, or nothing for other neighbor counts.
pub fn planar_hydrogens(
    center: &Point3<f64>,
    neighbors: &[Point3<f64>],
    bond_length: f64,
) -> Vec<Point3<f64>> {
    let dirs = unit_vectors(center, neighbors);

    match dirs.as_slice() {
        [u1] => {
            let p = any_perpendicular(u1);
            let angle = 120.0f64.to_radians();
            [1.0, -1.0]
                .iter()
                .map(|sign| center + (u1 * angle.cos() + p * (sign * angle.sin())) * bond_length)
                .collect()
        }
        [u1, u2] => vec![center - (u1 + u2).normalize() * bond_length],
        _ => Vec::new(),
    }
}

/// Hydrogen position that completes a linear center bonded to one neighbor.
pub fn linear_hydrogens(
    center: &Point3<f64>,
    neighbors: &[Point3<f64>],
    bond_length: f64,
) -> Vec<Point3<f64>> {
    match unit_vectors(center, neighbors).as_slice() {
        [u1] => vec![center - u1 * bond_length],
        _ => Vec::new(),
    }
}
