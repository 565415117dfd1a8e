//! 地理座標の配列に対する幾何ユーティリティ。
//!
//! 外接矩形、正射図法による投影、球面座標と直交座標の変換、平面のあてはめ、
//! 投影平面上のポリゴン距離などを提供する。

use tracing::trace;

use crate::{
    error::Error,
    geometry::{
        constants::EARTH_RADIUS,
        geodetic,
        helpers::{vec2::Vec2, vec3::Vec3},
        point::Point,
    },
};

/// 連続する重複点（[`Point`] の等値判定で等しい点）を取り除く。
pub fn clean_points(points: &[Point]) -> Vec<Point> {
    let mut cleaned: Vec<Point> = Vec::with_capacity(points.len());
    for point in points {
        if cleaned.last() != Some(point) {
            cleaned.push(*point);
        }
    }
    cleaned
}

/// `lon1` から東へ `lon2` までの経度差を `[-180, 180)` で返す。
///
/// 負の値は `lon2` が `lon1` の西側にあることを表す。
pub fn get_longitudinal_extent(lon1: f64, lon2: f64) -> f64 {
    (lon2 - lon1 + 180.0).rem_euclid(360.0) - 180.0
}

/// 球面上の外接矩形。日付変更線をまたぐ場合は `west > east` となる。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalBoundingBox {
    pub west: f64,
    pub east: f64,
    pub north: f64,
    pub south: f64,
}

/// 点群の外接矩形を求める。
///
/// # エラー
/// * 点が1つもない場合
/// * 経度方向の広がりが180度を超える場合
pub fn get_spherical_bounding_box(lons: &[f64], lats: &[f64]) -> Result<SphericalBoundingBox, Error> {
    if lons.len() != lats.len() {
        return Err(Error::LengthMismatch {
            expected: lons.len(),
            found: lats.len(),
        });
    }
    if lons.is_empty() {
        return Err(Error::TooFewPoints {
            required: 1,
            found: 0,
        });
    }

    let north = lats.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let south = lats.iter().copied().fold(f64::INFINITY, f64::min);
    let mut west = lons.iter().copied().fold(f64::INFINITY, f64::min);
    let mut east = lons.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if get_longitudinal_extent(west, east) < 0.0 {
        // 日付変更線の両側に点がある: 西端は最小の正の経度、東端は最大の負の経度
        west = lons
            .iter()
            .copied()
            .filter(|&lon| lon > 0.0)
            .fold(f64::INFINITY, f64::min);
        east = lons
            .iter()
            .copied()
            .filter(|&lon| lon < 0.0)
            .fold(f64::NEG_INFINITY, f64::max);
        let within = lons.iter().all(|&lon| {
            get_longitudinal_extent(west, lon) >= 0.0 && get_longitudinal_extent(lon, east) >= 0.0
        });
        if !west.is_finite() || !east.is_finite() || !within {
            return Err(Error::LongitudinalExtentTooWide);
        }
    }

    Ok(SphericalBoundingBox {
        west,
        east,
        north,
        south,
    })
}

/// 2点の中点（大円上で等距離の点）を返す。
pub fn get_middle_point(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> (f64, f64) {
    if lon1 == lon2 && lat1 == lat2 {
        return (lon1, lat1);
    }
    let dist = geodetic::geodetic_distance(lon1, lat1, lon2, lat2);
    let azimuth = geodetic::azimuth(lon1, lat1, lon2, lat2);
    geodetic::point_at(lon1, lat1, azimuth, dist / 2.0)
}

/// 外接矩形の中心を投影中心とする正射図法。
///
/// 投影平面の座標はキロメートル。x が東、y が北。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicProjection {
    lambda0: f64,
    sin_phi0: f64,
    cos_phi0: f64,
}

impl OrthographicProjection {
    pub fn new(center_lon: f64, center_lat: f64) -> Self {
        let lambda0 = center_lon.to_radians();
        let phi0 = center_lat.to_radians();
        Self {
            lambda0,
            sin_phi0: phi0.sin(),
            cos_phi0: phi0.cos(),
        }
    }

    pub fn from_bounding_box(bbox: &SphericalBoundingBox) -> Self {
        let (lon, lat) = get_middle_point(bbox.west, bbox.north, bbox.east, bbox.south);
        Self::new(lon, lat)
    }

    /// 点群の外接矩形から投影を作る。
    pub fn for_points(lons: &[f64], lats: &[f64]) -> Result<Self, Error> {
        Ok(Self::from_bounding_box(&get_spherical_bounding_box(
            lons, lats,
        )?))
    }

    /// 経度・緯度を投影平面に写す。
    ///
    /// # エラー
    /// 投影中心から見て地球の裏側にある点
    pub fn project(&self, lon: f64, lat: f64) -> Result<Vec2, Error> {
        let phi = lat.to_radians();
        let lambda = lon.to_radians() - self.lambda0;
        let cos_phi = phi.cos();
        let cos_c = self.sin_phi0 * phi.sin() + self.cos_phi0 * cos_phi * lambda.cos();
        if cos_c < 0.0 {
            return Err(Error::BeyondProjectionHorizon {
                longitude: lon,
                latitude: lat,
            });
        }
        let x = cos_phi * lambda.sin();
        let y = self.cos_phi0 * phi.sin() - self.sin_phi0 * cos_phi * lambda.cos();
        Ok(Vec2::new(x * EARTH_RADIUS, y * EARTH_RADIUS))
    }

    pub fn project_all(&self, lons: &[f64], lats: &[f64]) -> Result<Vec<Vec2>, Error> {
        lons.iter()
            .zip(lats)
            .map(|(&lon, &lat)| self.project(lon, lat))
            .collect()
    }

    /// 投影平面の座標を経度・緯度に戻す。経度は `(-180, 180]` に収める。
    pub fn unproject(&self, xy: Vec2) -> (f64, f64) {
        let x = xy.x() / EARTH_RADIUS;
        let y = xy.y() / EARTH_RADIUS;
        let cos_c = (1.0 - (x * x + y * y)).max(0.0).sqrt();
        let phi = (cos_c * self.sin_phi0 + y * self.cos_phi0)
            .clamp(-1.0, 1.0)
            .asin();
        let lambda = x.atan2(self.cos_phi0 * cos_c - y * self.sin_phi0);

        let mut lon = (lambda + self.lambda0).to_degrees();
        if lon > 180.0 {
            lon -= 360.0;
        } else if lon <= -180.0 {
            lon += 360.0;
        }
        (lon, phi.to_degrees())
    }
}

/// 球面座標を地心直交座標（km）に変換する。
///
/// 半径は地球半径から深さを引いたもの。
pub fn spherical_to_cartesian(lon: f64, lat: f64, depth: f64) -> Vec3 {
    let phi = lon.to_radians();
    let theta = lat.to_radians();
    let rr = EARTH_RADIUS - depth;
    let cos_theta_r = rr * theta.cos();
    Vec3::new(cos_theta_r * phi.cos(), cos_theta_r * phi.sin(), rr * theta.sin())
}

/// 地心直交座標を球面座標の [`Point`] に戻す。
pub fn cartesian_to_spherical(vector: Vec3) -> Point {
    let rr = vector.length();
    if rr == 0.0 {
        return Point::new_unchecked(0.0, 0.0, EARTH_RADIUS);
    }
    let lat = (vector.z() / rr).clamp(-1.0, 1.0).asin().to_degrees();
    let lon = vector.y().atan2(vector.x()).to_degrees();
    Point::new_unchecked(lon, lat, EARTH_RADIUS - rr)
}

/// 3辺のベクトルから三角形の面積をヘロンの公式で求める。
pub fn triangle_area(e1: Vec3, e2: Vec3, e3: Vec3) -> f64 {
    let (a, b, c) = (e1.length(), e2.length(), e3.length());
    let s = (a + b + c) / 2.0;
    (s * (s - a) * (s - b) * (s - c)).max(0.0).sqrt()
}

/// 単位ベクトル化。零ベクトルは零ベクトルのまま返す。
pub fn normalized(vector: Vec3) -> Vec3 {
    vector.normalize().unwrap_or(Vec3::ZERO)
}

/// 点群に最小二乗平面をあてはめ、重心と単位法線ベクトルを返す。
///
/// 法線は散布行列の最小固有値に対応する固有ベクトル。
pub fn plane_fit(points: &[Vec3]) -> Result<(Vec3, Vec3), Error> {
    if points.len() < 3 {
        return Err(Error::TooFewPoints {
            required: 3,
            found: points.len(),
        });
    }

    let centroid = points.iter().fold(Vec3::ZERO, |acc, &p| acc + p) / points.len() as f64;
    let mut scatter = [[0.0; 3]; 3];
    for p in points {
        let d = (*p - centroid).to_array();
        for (i, row) in scatter.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value += d[i] * d[j];
            }
        }
    }

    let (eigenvalues, eigenvectors) = symmetric_eigen(scatter);
    let smallest = (0..3)
        .min_by(|&a, &b| eigenvalues[a].total_cmp(&eigenvalues[b]))
        .unwrap_or(0);
    let normal = Vec3::new(
        eigenvectors[0][smallest],
        eigenvectors[1][smallest],
        eigenvectors[2][smallest],
    );
    Ok((centroid, normalized(normal)))
}

/// 3x3 対称行列のヤコビ法による固有値分解。固有ベクトルは列に並ぶ。
fn symmetric_eigen(mut a: [[f64; 3]; 3]) -> ([f64; 3], [[f64; 3]; 3]) {
    let mut v = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    let scale: f64 = (0..3).map(|i| a[i][i].abs()).sum::<f64>().max(f64::MIN_POSITIVE);

    for _ in 0..64 {
        let (p, q) = [(0, 1), (0, 2), (1, 2)]
            .into_iter()
            .max_by(|&(i, j), &(k, l)| a[i][j].abs().total_cmp(&a[k][l].abs()))
            .unwrap_or((0, 1));
        if a[p][q].abs() <= 1e-15 * scale {
            break;
        }

        let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
        let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
        let c = 1.0 / (t * t + 1.0).sqrt();
        let s = t * c;

        let mut rotation = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        rotation[p][p] = c;
        rotation[q][q] = c;
        rotation[p][q] = s;
        rotation[q][p] = -s;

        a = matmul(&transpose(&rotation), &matmul(&a, &rotation));
        v = matmul(&v, &rotation);
    }

    trace!(diagonal = ?[a[0][0], a[1][1], a[2][2]], "jacobi eigen decomposition");
    ([a[0][0], a[1][1], a[2][2]], v)
}

fn matmul(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, value) in row.iter_mut().enumerate() {
            *value = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

fn transpose(a: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in a.iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            out[j][i] = *value;
        }
    }
    out
}

/// 折れ線（`closed` なら閉じた多角形）が自己交差するかを判定する。
///
/// 4点未満の線は交差しない。判定は点群の外接矩形の中心で投影した平面で行う。
pub fn line_intersects_itself(lons: &[f64], lats: &[f64], closed: bool) -> Result<bool, Error> {
    if lons.len() != lats.len() {
        return Err(Error::LengthMismatch {
            expected: lons.len(),
            found: lats.len(),
        });
    }
    if lons.len() < 4 {
        return Ok(false);
    }

    let projection = OrthographicProjection::for_points(lons, lats)?;
    let mut xy = projection.project_all(lons, lats)?;
    if closed && xy.first() != xy.last() {
        xy.push(xy[0]);
    }
    Ok(polyline_intersects_itself(&xy, closed))
}

fn polyline_intersects_itself(xy: &[Vec2], closed: bool) -> bool {
    let segments: Vec<(Vec2, Vec2)> = xy.windows(2).map(|w| (w[0], w[1])).collect();
    let n = segments.len();

    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (closed && i == 0 && j == n - 1);
            let (a, b) = segments[i];
            let (c, d) = segments[j];
            if adjacent {
                // 共有端点以外で重なる場合（折り返し）だけを交差とみなす
                if collinear_overlap(a, b, c, d) {
                    return true;
                }
            } else if segments_intersect(a, b, c, d) {
                return true;
            }
        }
    }
    false
}

fn orientation(a: Vec2, b: Vec2, c: Vec2) -> f64 {
    b.sub(a).cross(c.sub(a))
}

fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x() >= a.x().min(b.x())
        && p.x() <= a.x().max(b.x())
        && p.y() >= a.y().min(b.y())
        && p.y() <= a.y().max(b.y())
}

/// 線分 `a`-`b` と `c`-`d` が交差または接触するか
pub fn segments_intersect(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    let d1 = orientation(c, d, a);
    let d2 = orientation(c, d, b);
    let d3 = orientation(a, b, c);
    let d4 = orientation(a, b, d);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(c, d, a))
        || (d2 == 0.0 && on_segment(c, d, b))
        || (d3 == 0.0 && on_segment(a, b, c))
        || (d4 == 0.0 && on_segment(a, b, d))
}

fn collinear_overlap(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    if orientation(a, b, c) != 0.0 || orientation(a, b, d) != 0.0 {
        return false;
    }
    let dir = b.sub(a);
    let len_sq = dir.length_sq();
    if len_sq == 0.0 {
        return false;
    }
    // 線分 c-d を a-b 上の媒介変数に直し、重なりの長さを測る
    let tc = c.sub(a).dot(dir) / len_sq;
    let td = d.sub(a).dot(dir) / len_sq;
    let lo = tc.min(td).max(0.0);
    let hi = tc.max(td).min(1.0);
    hi - lo > 1e-12
}

/// 2次元点群の凸包を反時計回りで返す（Andrew の monotone chain）。
///
/// 点が1つ、または全点が一直線上にある場合は、その端点だけを返す。
pub fn convex_hull_2d(points: &[Vec2]) -> Vec<Vec2> {
    let mut sorted: Vec<Vec2> = points.to_vec();
    sorted.sort_by(|a, b| a.x().total_cmp(&b.x()).then(a.y().total_cmp(&b.y())));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<Vec2> = Vec::with_capacity(sorted.len());
    for &p in &sorted {
        while lower.len() >= 2 && orientation(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Vec2> = Vec::with_capacity(sorted.len());
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && orientation(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// 点が多角形の内部にあるか（レイキャスティング）。境界上の扱いは不定。
pub fn point_in_polygon(polygon: &[Vec2], p: Vec2) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y() > p.y()) != (b.y() > p.y()) {
            let x_cross = (b.x() - a.x()) * (p.y() - a.y()) / (b.y() - a.y()) + a.x();
            if p.x() < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// 投影平面上の多角形から点までの距離。内部または境界上なら 0。
///
/// 頂点が1つなら点間距離、2つなら線分までの距離になる。
pub fn point_to_polygon_distance(polygon: &[Vec2], p: Vec2) -> f64 {
    match polygon.len() {
        0 => f64::INFINITY,
        1 => p.distance(polygon[0]),
        _ => {
            if point_in_polygon(polygon, p) {
                return 0.0;
            }
            let closing = (polygon[polygon.len() - 1], polygon[0]);
            polygon
                .windows(2)
                .map(|w| (w[0], w[1]))
                .chain(std::iter::once(closing))
                .map(|(a, b)| p.distance_to_segment(a, b))
                .fold(f64::INFINITY, f64::min)
        }
    }
}
