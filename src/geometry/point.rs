use std::fmt;

use roaring::RoaringTreemap;

#[cfg(any(test, feature = "random"))]
use rand::Rng;

#[cfg(test)]
use proptest::prelude::*;

use crate::{
    error::Error,
    geometry::{constants::EQUALITY_DISTANCE, geodetic, mesh::Mesh},
};

/// 経度・緯度・深さで表される地球上の1点。
///
/// 経度・緯度は度、深さはキロメートル（下向きが正）。
/// 2点の3次元距離が [`EQUALITY_DISTANCE`] 以下であれば等しいとみなす。
#[derive(Debug, Clone, Copy)]
pub struct Point {
    longitude: f64,
    latitude: f64,
    depth: f64,
}

impl Point {
    /// 経度・緯度・深さから [`Point`] を生成する。
    ///
    /// # エラー
    /// 経度が `-180.0..=180.0`、緯度が `-90.0..=90.0` の範囲外の場合
    ///
    /// # Examples
    /// ```
    /// # use hazardlib_geo::Point;
    /// let p = Point::new(135.5, 34.7, 10.0).unwrap();
    /// assert_eq!(p.depth(), 10.0);
    ///
    /// assert!(Point::new(181.0, 0.0, 0.0).is_err());
    /// ```
    pub fn new(longitude: f64, latitude: f64, depth: f64) -> Result<Self, Error> {
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::LongitudeOutOfRange { longitude });
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::LatitudeOutOfRange { latitude });
        }
        Ok(Self::new_unchecked(longitude, latitude, depth))
    }

    /// 範囲が保証されている計算結果から生成する。
    pub(crate) fn new_unchecked(longitude: f64, latitude: f64, depth: f64) -> Self {
        Self {
            longitude,
            latitude,
            depth,
        }
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// 他の点への方位角（度）。
    pub fn azimuth(&self, other: &Point) -> f64 {
        geodetic::azimuth(
            self.longitude,
            self.latitude,
            other.longitude,
            other.latitude,
        )
    }

    /// 深さを考慮した他の点までの距離（km）。
    pub fn distance(&self, other: &Point) -> f64 {
        geodetic::distance(
            self.longitude,
            self.latitude,
            self.depth,
            other.longitude,
            other.latitude,
            other.depth,
        )
    }

    /// 地表に投影した他の点までの距離（km）。
    pub fn horizontal_distance(&self, other: &Point) -> f64 {
        geodetic::geodetic_distance(
            self.longitude,
            self.latitude,
            other.longitude,
            other.latitude,
        )
    }

    /// 方位角 `azimuth` の方向へ水平に `horizontal_distance`、
    /// 鉛直に `vertical_increment` だけ移動した点を返す。
    pub fn point_at(&self, horizontal_distance: f64, vertical_increment: f64, azimuth: f64) -> Point {
        let (longitude, latitude) = geodetic::point_at(
            self.longitude,
            self.latitude,
            azimuth,
            horizontal_distance,
        );
        Point::new_unchecked(longitude, latitude, self.depth + vertical_increment)
    }

    /// 他の点までを `distance` にできるだけ近い等間隔で刻んだ点列を返す。
    ///
    /// 先頭は自身。区間数が 0 の場合は自身のみ。
    pub fn equally_spaced_points(&self, other: &Point, distance: f64) -> Result<Vec<Point>, Error> {
        geodetic::intervals_between(self, other, distance)
    }

    /// メッシュのうち、3次元距離が `radius` 以下の点の添字集合を返す。
    pub fn closer_than(&self, mesh: &Mesh, radius: f64) -> RoaringTreemap {
        mesh.iter()
            .enumerate()
            .filter(|(_, point)| self.distance(point) <= radius)
            .map(|(index, _)| index as u64)
            .collect()
    }

    #[cfg(any(test, feature = "random"))]
    /// 乱数生成器を指定して、深さ `depth_range` のランダムな点を生成する。
    pub fn random_using<R: Rng>(rng: &mut R, depth_range: std::ops::Range<f64>) -> Self {
        let longitude = rng.random_range(-180.0..=180.0);
        let latitude = rng.random_range(-90.0..=90.0);
        let depth = if depth_range.is_empty() {
            depth_range.start
        } else {
            rng.random_range(depth_range)
        };
        Self::new_unchecked(longitude, latitude, depth)
    }

    #[cfg(test)]
    /// 緯度を `lat_range` に制限した、地表の点を生成する Strategy
    pub fn arb_surface(
        lat_range: std::ops::RangeInclusive<f64>,
    ) -> impl Strategy<Value = Self> {
        (-180.0f64..=180.0, lat_range)
            .prop_map(|(lon, lat)| Point::new(lon, lat, 0.0).unwrap())
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.distance(other) <= EQUALITY_DISTANCE
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Latitude={:.6}, Longitude={:.6}, Depth={:.4}>",
            self.latitude, self.longitude, self.depth
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn new_rejects_out_of_range() {
        assert_eq!(
            Point::new(180.5, 0.0, 0.0).unwrap_err(),
            Error::LongitudeOutOfRange { longitude: 180.5 }
        );
        assert_eq!(
            Point::new(0.0, -90.1, 0.0).unwrap_err(),
            Error::LatitudeOutOfRange { latitude: -90.1 }
        );
        assert!(Point::new(-180.0, 90.0, -3.0).is_ok());
    }

    #[test]
    fn equality_tolerates_sub_meter_differences() {
        let a = Point::new(10.0, 10.0, 5.0).unwrap();
        let b = Point::new(10.0, 10.0, 5.0005).unwrap();
        let c = Point::new(10.0, 10.0, 5.01).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn point_at_moves_down_and_along_azimuth() {
        let origin = Point::new(0.0, 0.0, 2.0).unwrap();
        let moved = origin.point_at(10.0, 3.0, 0.0);
        assert!(moved.longitude().abs() < 1e-12);
        assert!(moved.latitude() > 0.0);
        assert!((origin.horizontal_distance(&moved) - 10.0).abs() < 1e-9);
        assert_eq!(moved.depth(), 5.0);
    }

    #[test]
    fn equally_spaced_points_start_at_self() {
        let a = Point::new(0.0, 0.0, 0.0).unwrap();
        let b = Point::new(0.0, 0.09, 0.0).unwrap();
        let points = a.equally_spaced_points(&b, 2.0).unwrap();
        //約10.0 km / 2.0 km = 5 区間
        assert_eq!(points.len(), 6);
        assert_eq!(points[0], a);
        //終点は区間長の整数倍の位置に来る
        assert!((a.distance(&points[5]) - 10.0).abs() < 1e-6);
        assert!(points[5].distance(&b) < 0.01);
    }

    #[test]
    fn closer_than_collects_indices() {
        let mesh = Mesh::from_points(&[
            Point::new(0.0, 0.0, 0.0).unwrap(),
            Point::new(0.0, 0.05, 0.0).unwrap(),
            Point::new(0.0, 1.0, 0.0).unwrap(),
        ])
        .unwrap();
        let origin = Point::new(0.0, 0.0, 0.0).unwrap();
        let indices: Vec<u64> = origin.closer_than(&mesh, 10.0).iter().collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn random_points_are_valid() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..100 {
            let p = Point::random_using(&mut rng, 0.0..30.0);
            assert!(Point::new(p.longitude(), p.latitude(), p.depth()).is_ok());
            assert!((0.0..30.0).contains(&p.depth()));
        }
    }
}
