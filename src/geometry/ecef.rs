use crate::{
    error::Error,
    geometry::{
        constants::{WGS84_A, WGS84_B, WGS84_E2},
        point::Point,
    },
};

/// 第二離心率の二乗
const WGS84_EP2: f64 = WGS84_E2 / (1.0 - WGS84_E2);

/// 地心直交座標系（ECEF: Earth-Centered, Earth-Fixed）の位置。
///
/// WGS-84 楕円体を基準とし、原点は地球の重心にある。
/// * X 軸は赤道面上で本初子午線方向
/// * Y 軸は赤道面上で東経 90 度方向
/// * Z 軸は北極方向
///
/// 単位はすべてメートル。[`Point`] の深さ（km、下向き正）は楕円体高の
/// 符号を反転したものとして扱う。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ecef {
    x: f64,
    y: f64,
    z: f64,
}

impl Ecef {
    /// # Examples
    /// ```
    /// # use hazardlib_geo::Ecef;
    /// let ecef = Ecef::new(10.0, 20.0, 30.0);
    /// assert_eq!((ecef.as_x(), ecef.as_y(), ecef.as_z()), (10.0, 20.0, 30.0));
    /// ```
    pub fn new(x: f64, y: f64, z: f64) -> Ecef {
        Ecef { x, y, z }
    }

    pub fn as_x(&self) -> f64 {
        self.x
    }

    pub fn as_y(&self) -> f64 {
        self.y
    }

    pub fn as_z(&self) -> f64 {
        self.z
    }

    /// 2点を結ぶ弦の長さ（m）。
    ///
    /// # Examples
    /// ```
    /// # use hazardlib_geo::Ecef;
    /// let a = Ecef::new(0.0, 0.0, 0.0);
    /// assert_eq!(a.distance(&Ecef::new(3.0, 4.0, 0.0)), 5.0);
    /// ```
    pub fn distance(&self, other: &Ecef) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl From<Point> for Ecef {
    fn from(point: Point) -> Self {
        let (sin_lat, cos_lat) = point.latitude().to_radians().sin_cos();
        let (sin_lon, cos_lon) = point.longitude().to_radians().sin_cos();
        let height = -point.depth() * 1000.0;

        // 卯酉線曲率半径
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let r = (n + height) * cos_lat;

        Ecef {
            x: r * cos_lon,
            y: r * sin_lon,
            z: (n * (1.0 - WGS84_E2) + height) * sin_lat,
        }
    }
}

impl TryFrom<Ecef> for Point {
    type Error = Error;

    /// Bowring の更新式で化成緯度から測地緯度を求め直す反復解法。
    ///
    /// # エラー
    /// 地球の中心、または計算が有限値にならない位置
    fn try_from(ecef: Ecef) -> Result<Self, Self::Error> {
        let Ecef { x, y, z } = ecef;
        let invalid = Error::InvalidEcef { x, y, z };
        let p = x.hypot(y);

        if p == 0.0 {
            if z == 0.0 {
                return Err(invalid);
            }
            let latitude = 90.0_f64.copysign(z);
            return Point::new(0.0, latitude, (WGS84_B - z.abs()) / 1000.0);
        }

        let mut beta = (WGS84_A * z).atan2(WGS84_B * p);
        let mut phi = beta;
        for _ in 0..10 {
            let (sin_beta, cos_beta) = beta.sin_cos();
            let next = (z + WGS84_EP2 * WGS84_B * sin_beta.powi(3))
                .atan2(p - WGS84_E2 * WGS84_A * cos_beta.powi(3));
            let converged = (next - phi).abs() < 1e-14;
            phi = next;
            if converged {
                break;
            }
            beta = (WGS84_B * phi.sin()).atan2(WGS84_A * phi.cos());
        }

        let (sin_phi, cos_phi) = phi.sin_cos();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_phi * sin_phi).sqrt();
        // 極付近でも桁落ちしない楕円体高の式
        let height = p * cos_phi + (z + WGS84_E2 * n * sin_phi) * sin_phi - n;
        if !phi.is_finite() || !height.is_finite() {
            return Err(invalid);
        }

        Point::new(y.atan2(x).to_degrees(), phi.to_degrees(), -height / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equator_prime_meridian_is_semi_major_axis() {
        let ecef: Ecef = Point::new(0.0, 0.0, 0.0).unwrap().into();
        assert!((ecef.as_x() - WGS84_A).abs() < 1e-6);
        assert!(ecef.as_y().abs() < 1e-6);
        assert!(ecef.as_z().abs() < 1e-6);
    }

    #[test]
    fn depth_moves_towards_center() {
        let surface: Ecef = Point::new(0.0, 0.0, 0.0).unwrap().into();
        let deep: Ecef = Point::new(0.0, 0.0, 10.0).unwrap().into();
        assert!((surface.distance(&deep) - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn round_trip_is_millimetre_accurate() {
        let original = Point::new(139.767, 35.681, 12.5).unwrap();
        let ecef: Ecef = original.into();
        let back = Point::try_from(ecef).unwrap();
        assert!((back.longitude() - original.longitude()).abs() < 1e-9);
        assert!((back.latitude() - original.latitude()).abs() < 1e-9);
        assert!((back.depth() - original.depth()).abs() < 1e-6);

        //高緯度・西半球・地表より上
        let original = Point::new(-71.5, 84.2, -3.0).unwrap();
        let back = Point::try_from(Ecef::from(original)).unwrap();
        assert!((back.longitude() - original.longitude()).abs() < 1e-9);
        assert!((back.latitude() - original.latitude()).abs() < 1e-9);
        assert!((back.depth() - original.depth()).abs() < 1e-6);
    }

    #[test]
    fn poles_and_center() {
        let north = Point::try_from(Ecef::new(0.0, 0.0, 6_356_752.314_245)).unwrap();
        assert_eq!(north.latitude(), 90.0);
        assert!(north.depth().abs() < 1e-6);
        let south = Point::try_from(Ecef::new(0.0, 0.0, -6_356_752.314_245 + 5_000.0)).unwrap();
        assert_eq!(south.latitude(), -90.0);
        assert!((south.depth() - 5.0).abs() < 1e-6);

        assert!(Point::try_from(Ecef::new(0.0, 0.0, 0.0)).is_err());
    }
}
