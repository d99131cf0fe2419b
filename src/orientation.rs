use nalgebra::{Matrix3, Rotation3, Unit, UnitQuaternion, Vector3};

use crate::error::{AnchorError, Result};
use crate::landmark::{Finger, Landmark};

/// これ未満の長さのベクトルは向きを持たないとみなす
const MIN_VECTOR_LENGTH: f32 = 1e-6;

/// 指の基底行列の行列式が 1 からこれ以上ずれたら不安定として棄却
const DETERMINANT_TOLERANCE: f32 = 0.1;

fn normalized(v: Vector3<f32>, what: &'static str) -> Result<Vector3<f32>> {
    let len = v.norm();
    if !len.is_finite() || len < MIN_VECTOR_LENGTH {
        return Err(AnchorError::DegenerateGeometry(what));
    }
    Ok(v / len)
}

/// 3 点から作る正規直交基底
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationBasis {
    pub forward: Vector3<f32>,
    pub up: Vector3<f32>,
    pub right: Vector3<f32>,
}

impl OrientationBasis {
    /// origin から point_a を注視し、(a, b) の張る面の法線を上方向とする look-at 基底
    pub fn from_points(
        origin: &Vector3<f32>,
        point_a: &Vector3<f32>,
        point_b: &Vector3<f32>,
    ) -> Result<Self> {
        let v1 = normalized(point_a - origin, "origin coincides with first point")?;
        let v2 = normalized(point_b - origin, "origin coincides with second point")?;
        let normal = normalized(v1.cross(&v2), "collinear points")?;

        // three.js の lookAt と同じ並び: z = eye - target, x = up × z, y = z × x
        let forward = -v1;
        let right = normalized(normal.cross(&forward), "up parallel to view direction")?;
        let up = forward.cross(&right);

        Ok(Self { forward, up, right })
    }

    pub fn from_quaternion(rotation: &UnitQuaternion<f32>) -> Self {
        Self {
            right: rotation * Vector3::x(),
            up: rotation * Vector3::y(),
            forward: rotation * Vector3::z(),
        }
    }

    pub fn to_matrix(&self) -> Matrix3<f32> {
        Matrix3::from_columns(&[self.right, self.up, self.forward])
    }

    pub fn to_quaternion(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(self.to_matrix()))
    }
}

/// 3 点から回転を求める。共線・一致点は DegenerateGeometry（呼び出し側はアセットを隠す）
pub fn solve_orientation(
    origin: &Landmark,
    point_a: &Landmark,
    point_b: &Landmark,
) -> Result<UnitQuaternion<f32>> {
    OrientationBasis::from_points(&origin.to_vector(), &point_a.to_vector(), &point_b.to_vector())
        .map(|basis| basis.to_quaternion())
}

/// 指先・指輪用の姿勢
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FingerOrientation {
    pub rotation: UnitQuaternion<f32>,
    /// 二次回転の軸に使った右ベクトル
    pub right: Vector3<f32>,
}

/// 指の向きを列ベクトルから直接組み立てる
///
/// - 主方向: tip → joint
/// - 法線: 主方向 × 指ごとの側方ベクトル（隣接 MCP 間）
/// - 右: 主方向 × 法線
///
/// 行列式が 1 ± 0.1 を外れる基底は棄却し、最後に右ベクトルまわりに
/// 指ごとのチルトを掛ける
pub fn finger_orientation(
    hand: &[Landmark],
    finger: Finger,
    tip: usize,
    joint: usize,
) -> Result<FingerOrientation> {
    let point = |i: usize| {
        hand.get(i)
            .map(Landmark::to_vector)
            .ok_or(AnchorError::DegenerateGeometry("finger landmark out of range"))
    };
    let (side_from, side_to) = finger.side_refs();

    let main = normalized(point(joint)? - point(tip)?, "zero-length finger segment")?;
    let side = normalized(point(side_to)? - point(side_from)?, "coincident knuckles")?;
    let normal = normalized(main.cross(&side), "finger parallel to knuckle line")?;
    let right = normalized(main.cross(&normal), "finger frame collapsed")?;

    let matrix = Matrix3::from_columns(&[right, main, normal]);
    let det = matrix.determinant();
    // 構成上ほぼ 1。NaN や丸め誤差の混入だけをここで落とす
    if !det.is_finite() || (det - 1.0).abs() > DETERMINANT_TOLERANCE {
        return Err(AnchorError::DegenerateGeometry("finger basis not orthonormal"));
    }

    let base = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(matrix));
    let tilt = UnitQuaternion::from_axis_angle(
        &Unit::new_normalize(right),
        finger.tilt_deg().to_radians(),
    );

    Ok(FingerOrientation {
        rotation: tilt * base,
        right,
    })
}

/// UnitQuaternion → [x, y, z, w]
pub fn quaternion_to_array(rotation: &UnitQuaternion<f32>) -> [f32; 4] {
    let c = rotation.quaternion().coords;
    [c.x, c.y, c.z, c.w]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_orthonormal(basis: &OrientationBasis) {
        let eps = 1e-3;
        for v in [basis.forward, basis.up, basis.right] {
            assert!((v.norm() - 1.0).abs() < eps, "length {}", v.norm());
        }
        assert!(basis.forward.dot(&basis.up).abs() < eps);
        assert!(basis.forward.dot(&basis.right).abs() < eps);
        assert!(basis.up.dot(&basis.right).abs() < eps);
    }

    #[test]
    fn test_orientation_round_trip_orthonormal() {
        let triples = [
            ([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.5, 0.5, 0.0], [0.6, 0.45, 0.01], [0.55, 0.6, -0.02]),
            ([10.0, -3.0, 2.0], [12.0, 1.0, 2.5], [9.0, 0.0, 7.0]),
            ([0.0, 0.0, 0.0], [0.001, 0.0, 0.0], [0.0, 0.0, 0.001]),
        ];
        for (o, a, b) in triples {
            let q = solve_orientation(
                &Landmark::new(o[0], o[1], o[2]),
                &Landmark::new(a[0], a[1], a[2]),
                &Landmark::new(b[0], b[1], b[2]),
            )
            .unwrap();
            let basis = OrientationBasis::from_quaternion(&q);
            assert_orthonormal(&basis);
        }
    }

    #[test]
    fn test_basis_matches_quaternion() {
        let basis = OrientationBasis::from_points(
            &Vector3::new(0.0, 0.0, 0.0),
            &Vector3::new(0.0, 0.0, -1.0),
            &Vector3::new(-1.0, 0.0, 0.0),
        )
        .unwrap();
        // -Z を注視、法線は +Y → 単位回転
        let q = basis.to_quaternion();
        assert!(q.angle() < 1e-4);
        let back = OrientationBasis::from_quaternion(&q);
        assert!((back.forward - basis.forward).norm() < 1e-4);
        assert!((back.up - basis.up).norm() < 1e-4);
    }

    #[test]
    fn test_collinear_points_rejected() {
        let result = solve_orientation(
            &Landmark::new(0.0, 0.0, 0.0),
            &Landmark::new(1.0, 0.0, 0.0),
            &Landmark::new(2.0, 0.0, 0.0),
        );
        assert!(matches!(result, Err(AnchorError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_coincident_points_rejected() {
        let p = Landmark::new(0.3, 0.3, 0.0);
        assert!(solve_orientation(&p, &p, &Landmark::new(0.4, 0.3, 0.0)).is_err());
        assert!(solve_orientation(&p, &Landmark::new(0.4, 0.3, 0.0), &p).is_err());
    }

    #[test]
    fn test_no_nan_output() {
        let q = solve_orientation(
            &Landmark::new(0.0, 0.0, 0.0),
            &Landmark::new(1e-3, 0.0, 0.0),
            &Landmark::new(0.0, 1e-3, 0.0),
        )
        .unwrap();
        assert!(quaternion_to_array(&q).iter().all(|c| c.is_finite()));
    }

    fn flat_hand() -> Vec<Landmark> {
        // 掌を正面に向けた右手（指は +Y 方向に伸びる）
        let mut hand = vec![Landmark::default(); 21];
        hand[0] = Landmark::new(0.0, 0.0, 0.0);
        for (k, finger) in Finger::ALL.iter().enumerate() {
            let x = -0.4 + 0.2 * k as f32;
            for (j, &idx) in finger.chain().iter().enumerate() {
                hand[idx] = Landmark::new(x, 1.0 + 0.3 * j as f32, 0.0);
            }
        }
        hand
    }

    #[test]
    fn test_finger_orientation_orthonormal() {
        let hand = flat_hand();
        for finger in Finger::ALL {
            let result = finger_orientation(&hand, finger, finger.tip(), finger.dip()).unwrap();
            let basis = OrientationBasis::from_quaternion(&result.rotation);
            assert_orthonormal(&basis);
            assert!((result.right.norm() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_finger_tilt_applied_around_right() {
        let hand = flat_hand();
        let finger = Finger::Index;
        let result = finger_orientation(&hand, finger, finger.tip(), finger.dip()).unwrap();
        // 二次回転後の Y 軸（主方向）は右ベクトルに直交したまま、チルト角だけ傾く
        let main = result.rotation * Vector3::y();
        assert!(main.dot(&result.right).abs() < 1e-4);
        let tip_to_joint = -Vector3::y();
        let tilt = main.dot(&tip_to_joint).clamp(-1.0, 1.0).acos();
        assert!((tilt - finger.tilt_deg().to_radians()).abs() < 1e-3);
    }

    #[test]
    fn test_finger_main_axis_points_tip_to_joint() {
        let hand = flat_hand();
        for finger in Finger::ALL {
            let (tip, joint) = (finger.tip(), finger.dip());
            let result = finger_orientation(&hand, finger, tip, joint).unwrap();
            let untilt = UnitQuaternion::from_axis_angle(
                &Unit::new_normalize(result.right),
                -finger.tilt_deg().to_radians(),
            );
            let local_y = (untilt * result.rotation) * Vector3::y();
            let expected = (hand[joint].to_vector() - hand[tip].to_vector()).normalize();
            assert!((local_y - expected).norm() < 1e-4, "{:?}: {:?}", finger, local_y);
        }
    }

    #[test]
    fn test_finger_parallel_to_knuckles_rejected() {
        let mut hand = flat_hand();
        // 人差し指を MCP の並び（X 方向）と平行に倒す
        hand[Finger::Index.dip()] = Landmark::new(0.0, 1.0, 0.0);
        hand[Finger::Index.tip()] = Landmark::new(0.5, 1.0, 0.0);
        let result = finger_orientation(&hand, Finger::Index, Finger::Index.tip(), Finger::Index.dip());
        assert!(matches!(result, Err(AnchorError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_finger_zero_segment_rejected() {
        let mut hand = flat_hand();
        hand[Finger::Ring.tip()] = hand[Finger::Ring.dip()];
        assert!(finger_orientation(&hand, Finger::Ring, Finger::Ring.tip(), Finger::Ring.dip()).is_err());
    }
}
