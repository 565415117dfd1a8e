//! 球体地球モデル上の測地計算。
//!
//! 経度・緯度は度、深さ・距離はキロメートル、方位角は北から時計回りの度で扱う。

use std::f64::consts::FRAC_PI_2;

use crate::{
    error::Error,
    geometry::{constants::EARTH_RADIUS, point::Point},
};

/// 2地点間の大円距離（km）を haversine 公式で求める。
///
/// # Examples
/// ```
/// # use hazardlib_geo::geodetic::geodetic_distance;
/// let d = geodetic_distance(0.0, 0.0, 1.0, 0.0);
/// assert!((d - 111.194_926_6).abs() < 1e-6);
/// ```
pub fn geodetic_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (lon1, lat1) = (lon1.to_radians(), lat1.to_radians());
    let (lon2, lat2) = (lon2.to_radians(), lat2.to_radians());
    let h = ((lat1 - lat2) / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * ((lon1 - lon2) / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS * h.sqrt().min(1.0).asin()
}

/// 地点1から地点2へ向かう大円の初期方位角を `[0, 360)` で返す。
pub fn azimuth(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (lon1, lat1) = (lon1.to_radians(), lat1.to_radians());
    let (lon2, lat2) = (lon2.to_radians(), lat2.to_radians());
    let cos_lat2 = lat2.cos();
    let true_course = ((lon1 - lon2).sin() * cos_lat2)
        .atan2(lat1.cos() * lat2.sin() - lat1.sin() * cos_lat2 * (lon1 - lon2).cos())
        .to_degrees();
    (360.0 - true_course).rem_euclid(360.0)
}

/// 深さを考慮した2地点間の距離。
///
/// 地表上の大円距離と深さの差を直角三角形の2辺とみなす。
pub fn distance(lon1: f64, lat1: f64, depth1: f64, lon2: f64, lat2: f64, depth2: f64) -> f64 {
    let hdist = geodetic_distance(lon1, lat1, lon2, lat2);
    let vdist = depth1 - depth2;
    (hdist * hdist + vdist * vdist).sqrt()
}

fn check_lengths(expected: usize, others: &[usize]) -> Result<(), Error> {
    match others.iter().find(|&&len| len != expected) {
        Some(&found) => Err(Error::LengthMismatch { expected, found }),
        None => Ok(()),
    }
}

/// 各サイトについて、メッシュ上の最も近い点までの3次元距離とその点の添字を返す。
pub fn min_distance_with_indices(
    mlons: &[f64],
    mlats: &[f64],
    mdepths: &[f64],
    slons: &[f64],
    slats: &[f64],
    sdepths: &[f64],
) -> Result<Vec<(f64, usize)>, Error> {
    check_lengths(mlons.len(), &[mlats.len(), mdepths.len()])?;
    check_lengths(slons.len(), &[slats.len(), sdepths.len()])?;
    if mlons.is_empty() {
        return Err(Error::TooFewPoints {
            required: 1,
            found: 0,
        });
    }

    let result = (0..slons.len())
        .map(|s| {
            let mut best = (f64::INFINITY, 0);
            for m in 0..mlons.len() {
                let d = distance(
                    mlons[m], mlats[m], mdepths[m], slons[s], slats[s], sdepths[s],
                );
                if d < best.0 {
                    best = (d, m);
                }
            }
            best
        })
        .collect();
    Ok(result)
}

/// 各サイトについて、メッシュ上の最も近い点までの3次元距離を返す。
pub fn min_distance(
    mlons: &[f64],
    mlats: &[f64],
    mdepths: &[f64],
    slons: &[f64],
    slats: &[f64],
    sdepths: &[f64],
) -> Result<Vec<f64>, Error> {
    Ok(
        min_distance_with_indices(mlons, mlats, mdepths, slons, slats, sdepths)?
            .into_iter()
            .map(|(d, _)| d)
            .collect(),
    )
}

/// 各サイトについて、メッシュ上の最も近い点までの地表距離を返す。
pub fn min_geodetic_distance(
    mlons: &[f64],
    mlats: &[f64],
    slons: &[f64],
    slats: &[f64],
) -> Result<Vec<f64>, Error> {
    check_lengths(mlons.len(), &[mlats.len()])?;
    check_lengths(slons.len(), &[slats.len()])?;
    if mlons.is_empty() {
        return Err(Error::TooFewPoints {
            required: 1,
            found: 0,
        });
    }

    let result = slons
        .iter()
        .zip(slats)
        .map(|(&slon, &slat)| {
            mlons
                .iter()
                .zip(mlats)
                .map(|(&mlon, &mlat)| geodetic_distance(mlon, mlat, slon, slat))
                .fold(f64::INFINITY, f64::min)
        })
        .collect();
    Ok(result)
}

/// 点 (`alon`, `alat`) を方位角 `aazimuth` で通る大円までの符号付き距離。
///
/// 進行方向に向かって右側が正、左側が負。
pub fn distance_to_arc(alon: f64, alat: f64, aazimuth: f64, plon: f64, plat: f64) -> f64 {
    let azimuth_to_target = azimuth(alon, alat, plon, plat);
    let distance_to_target = geodetic_distance(alon, alat, plon, plat);
    // 大円と目標点への大円弧のなす角
    let t_angle = (azimuth_to_target - aazimuth + 360.0).rem_euclid(360.0);
    // ネイピアの法則: 直角球面三角形の斜辺と対角から垂線の長さを得る
    let angle = (t_angle.to_radians().sin() * (distance_to_target / EARTH_RADIUS).sin())
        .clamp(-1.0, 1.0)
        .acos();
    (FRAC_PI_2 - angle) * EARTH_RADIUS
}

/// 点 (`alon`, `alat`) から方位角 `aazimuth` へ伸びる半大円までの符号付き距離。
///
/// 起点より後方にある点は起点までの距離を返し、左側なら負にする。
pub fn distance_to_semi_arc(alon: f64, alat: f64, aazimuth: f64, plon: f64, plat: f64) -> f64 {
    let azimuth_to_target = azimuth(alon, alat, plon, plat);
    let delta = (aazimuth - azimuth_to_target).to_radians();

    if delta.cos() > 0.0 {
        return distance_to_arc(alon, alat, aazimuth, plon, plat);
    }

    let d = geodetic_distance(alon, alat, plon, plat);
    if delta.sin() > 0.0 { -d } else { d }
}

/// 方位角と距離から到達点の経度・緯度を求める（測地線の順問題）。
///
/// 経度は `[-180, 180)` に正規化される。
pub fn point_at(lon: f64, lat: f64, azimuth: f64, distance: f64) -> (f64, f64) {
    let (lon, lat) = (lon.to_radians(), lat.to_radians());
    let tc = (360.0 - azimuth).to_radians();
    let angular = distance / EARTH_RADIUS;
    let (sin_dist, cos_dist) = angular.sin_cos();
    let (sin_lat, cos_lat) = lat.sin_cos();

    let sin_lats = (sin_lat * cos_dist + cos_lat * sin_dist * tc.cos()).clamp(-1.0, 1.0);
    let lats = sin_lats.asin().to_degrees();

    let dlon = (tc.sin() * sin_dist * cos_lat).atan2(cos_dist - sin_lat * sin_lats);
    let lons = (lon - dlon + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI)
        - std::f64::consts::PI;
    (lons.to_degrees(), lats)
}

/// 起点から方位角 `azimuth` の方向へ、水平距離 `hdist`・鉛直距離 `vdist` を
/// `npoints` 個の等間隔点で刻む。先頭の点は起点そのもの。
pub fn npoints_towards(
    origin: &Point,
    azimuth: f64,
    hdist: f64,
    vdist: f64,
    npoints: usize,
) -> Result<Vec<Point>, Error> {
    if npoints < 2 {
        return Err(Error::TooFewSteps { npoints });
    }
    let steps = (npoints - 1) as f64;

    let mut points = Vec::with_capacity(npoints);
    points.push(*origin);
    for i in 1..npoints {
        let fraction = i as f64 / steps;
        let (lon, lat) = point_at(
            origin.longitude(),
            origin.latitude(),
            azimuth,
            hdist * fraction,
        );
        points.push(Point::new_unchecked(
            lon,
            lat,
            origin.depth() + vdist * fraction,
        ));
    }
    Ok(points)
}

/// 2点間を `npoints` 個の等間隔点で結ぶ。両端の点はそのまま残る。
pub fn npoints_between(from: &Point, to: &Point, npoints: usize) -> Result<Vec<Point>, Error> {
    let hdist = geodetic_distance(
        from.longitude(),
        from.latitude(),
        to.longitude(),
        to.latitude(),
    );
    let vdist = to.depth() - from.depth();
    let mut points = npoints_towards(from, from.azimuth(to), hdist, vdist, npoints)?;
    if let Some(last) = points.last_mut() {
        *last = *to;
    }
    Ok(points)
}

/// 2点間を `length` にできるだけ近い間隔で刻む。
///
/// 区間数は総距離を小数第7位で丸めてから `round(total / length)` で決める。
/// 区間数が 0 のときは起点のみを返す。
pub fn intervals_between(from: &Point, to: &Point, length: f64) -> Result<Vec<Point>, Error> {
    if length <= 0.0 || length.is_nan() {
        return Err(Error::NonPositiveSpacing { spacing: length });
    }
    let hdist = geodetic_distance(
        from.longitude(),
        from.latitude(),
        to.longitude(),
        to.latitude(),
    );
    let vdist = to.depth() - from.depth();
    // 同じ距離から常に同じ区間数を得るため、浮動小数点誤差を丸める
    let total_distance = ((hdist * hdist + vdist * vdist).sqrt() * 1e7).round() / 1e7;
    let num_intervals = (total_distance / length).round() as usize;
    if num_intervals == 0 {
        return Ok(vec![*from]);
    }
    let dist_factor = (length * num_intervals as f64) / total_distance;
    npoints_towards(
        from,
        from.azimuth(to),
        hdist * dist_factor,
        vdist * dist_factor,
        num_intervals + 1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ONE_DEGREE: f64 = 111.194_926_644_558_73;

    #[test]
    fn one_degree_at_equator() {
        assert!((geodetic_distance(0.0, 0.0, 1.0, 0.0) - ONE_DEGREE).abs() < 1e-9);
        assert!((geodetic_distance(0.0, 0.0, 0.0, 1.0) - ONE_DEGREE).abs() < 1e-9);
        assert_eq!(geodetic_distance(12.0, -3.0, 12.0, -3.0), 0.0);
    }

    #[test]
    fn antipodal_points_are_half_circumference_apart() {
        let d = geodetic_distance(0.0, 0.0, 180.0, 0.0);
        assert!((d - std::f64::consts::PI * EARTH_RADIUS).abs() < 1e-6);
    }

    #[test]
    fn azimuth_cardinal_directions() {
        assert!((azimuth(0.0, 0.0, 0.0, 1.0) - 0.0).abs() < 1e-9);
        assert!((azimuth(0.0, 0.0, 1.0, 0.0) - 90.0).abs() < 1e-9);
        assert!((azimuth(0.0, 0.0, 0.0, -1.0) - 180.0).abs() < 1e-9);
        assert!((azimuth(0.0, 0.0, -1.0, 0.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn distance_includes_depth() {
        let d = distance(0.0, 0.0, 0.0, 0.0, 0.0, 10.0);
        assert!((d - 10.0).abs() < 1e-12);
        let d = distance(0.0, 0.0, 3.0, 1.0, 0.0, 3.0);
        assert!((d - ONE_DEGREE).abs() < 1e-9);
    }

    #[test]
    fn min_distance_finds_closest_mesh_point() {
        let mlons = [0.0, 1.0, 2.0];
        let mlats = [0.0, 0.0, 0.0];
        let mdepths = [5.0, 5.0, 5.0];
        let result = min_distance_with_indices(
            &mlons,
            &mlats,
            &mdepths,
            &[1.1, -3.0],
            &[0.0, 0.0],
            &[5.0, 5.0],
        )
        .unwrap();
        assert_eq!(result[0].1, 1);
        assert!((result[0].0 - 0.1 * ONE_DEGREE).abs() < 1e-6);
        assert_eq!(result[1].1, 0);
        assert!((result[1].0 - 3.0 * ONE_DEGREE).abs() < 1e-6);
    }

    #[test]
    fn min_distance_rejects_mismatched_lengths() {
        let err = min_geodetic_distance(&[0.0, 1.0], &[0.0], &[0.0], &[0.0]).unwrap_err();
        assert_eq!(
            err,
            Error::LengthMismatch {
                expected: 2,
                found: 1
            }
        );
        let err = min_distance(&[], &[], &[], &[0.0], &[0.0], &[0.0]).unwrap_err();
        assert!(matches!(err, Error::TooFewPoints { .. }));
    }

    #[test]
    fn distance_to_arc_is_positive_on_the_right() {
        //東向きの赤道: 南側が右
        let south = distance_to_arc(0.0, 0.0, 90.0, 0.5, -1.0);
        let north = distance_to_arc(0.0, 0.0, 90.0, 0.5, 1.0);
        assert!((south - ONE_DEGREE).abs() < 1e-6);
        assert!((north + ONE_DEGREE).abs() < 1e-6);
        //大円の後方でも同じ
        let behind = distance_to_arc(0.0, 0.0, 90.0, -20.0, -1.0);
        assert!((behind - ONE_DEGREE).abs() < 1e-6);
    }

    #[test]
    fn distance_to_semi_arc_behind_origin() {
        //後方の点は起点までの距離、左側なら負
        let d = distance_to_semi_arc(0.0, 0.0, 90.0, -1.0, 0.5);
        let expected = geodetic_distance(0.0, 0.0, -1.0, 0.5);
        assert!((d + expected).abs() < 1e-9);
        let d = distance_to_semi_arc(0.0, 0.0, 90.0, -1.0, -0.5);
        assert!((d - expected).abs() < 1e-9);
        //前方の点は大円までの距離
        let d = distance_to_semi_arc(0.0, 0.0, 90.0, 3.0, -1.0);
        assert!((d - ONE_DEGREE).abs() < 1e-6);
    }

    #[test]
    fn point_at_wraps_longitude() {
        let (lon, lat) = point_at(179.5, 0.0, 90.0, ONE_DEGREE);
        assert!((lon + 179.5).abs() < 1e-9);
        assert!(lat.abs() < 1e-9);
    }

    #[test]
    fn npoints_between_keeps_both_ends() {
        let a = Point::new(0.0, 0.0, 1.0).unwrap();
        let b = Point::new(1.0, 1.0, 11.0).unwrap();
        let points = npoints_between(&a, &b, 5).unwrap();
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], a);
        assert_eq!(points[4], b);
        assert!((points[2].depth() - 6.0).abs() < 1e-12);
        assert!(npoints_between(&a, &b, 1).is_err());
    }

    #[test]
    fn intervals_between_rounds_interval_count() {
        let a = Point::new(0.0, 0.0, 0.0).unwrap();
        let b = Point::new(1.0, 0.0, 0.0).unwrap();
        //111.195 / 10 = 11.1 → 11 区間
        let points = intervals_between(&a, &b, 10.0).unwrap();
        assert_eq!(points.len(), 12);
        let step = geodetic_distance(
            points[0].longitude(),
            points[0].latitude(),
            points[1].longitude(),
            points[1].latitude(),
        );
        //総距離を小数第7位で丸めるぶん、間隔もわずかにずれる
        assert!((step - 10.0).abs() < 1e-6);

        //区間数0なら起点のみ
        let points = intervals_between(&a, &b, 500.0).unwrap();
        assert_eq!(points, vec![a]);

        assert!(intervals_between(&a, &b, 0.0).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn geodetic_distance_is_symmetric(
            lon1 in -180.0f64..=180.0, lat1 in -90.0f64..=90.0,
            lon2 in -180.0f64..=180.0, lat2 in -90.0f64..=90.0,
        ) {
            let d1 = geodetic_distance(lon1, lat1, lon2, lat2);
            let d2 = geodetic_distance(lon2, lat2, lon1, lat1);
            prop_assert!(d1 >= 0.0);
            prop_assert!((d1 - d2).abs() < 1e-6);
        }

        #[test]
        fn point_at_travels_requested_distance(
            lon in -180.0f64..=180.0, lat in -80.0f64..=80.0,
            az in 0.0f64..360.0, dist in 0.0f64..5000.0,
        ) {
            let (lon2, lat2) = point_at(lon, lat, az, dist);
            prop_assert!((-180.0..180.0).contains(&lon2));
            prop_assert!((geodetic_distance(lon, lat, lon2, lat2) - dist).abs() < 1e-6);
        }
    }
}
