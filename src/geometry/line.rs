use crate::{
    error::Error,
    geometry::{point::Point, utils::clean_points},
};

/// 点を順に結んだ折れ線（断層トレースなど）。
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    points: Vec<Point>,
}

impl Line {
    /// 連続する重複点を除いてから [`Line`] を生成する。
    ///
    /// # エラー
    /// 点が1つもない場合
    pub fn new(points: &[Point]) -> Result<Self, Error> {
        let points = clean_points(points);
        if points.is_empty() {
            return Err(Error::TooFewPoints {
                required: 1,
                found: 0,
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 各区間の方位角を区間長で重み付けしたベクトル平均（度）。
    ///
    /// 1点だけの線は 0 を返す。
    pub fn average_azimuth(&self) -> f64 {
        if self.points.len() == 2 {
            return self.points[0].azimuth(&self.points[1]);
        }
        let (mut x, mut y) = (0.0, 0.0);
        for w in self.points.windows(2) {
            let azimuth = w[0].azimuth(&w[1]).to_radians();
            let distance = w[0].horizontal_distance(&w[1]);
            x += distance * azimuth.sin();
            y += distance * azimuth.cos();
        }
        let azimuth = x.atan2(y).to_degrees();
        if azimuth < 0.0 { azimuth + 360.0 } else { azimuth }
    }

    /// 各区間を `section_length` にできるだけ近い間隔で刻み直す。
    ///
    /// 区間ごとに直前の刻み点から次の頂点まで刻むので、元の頂点は保存されない。
    pub fn resample(&self, section_length: f64) -> Result<Line, Error> {
        if section_length <= 0.0 || section_length.is_nan() {
            return Err(Error::NonPositiveSpacing {
                spacing: section_length,
            });
        }
        if self.points.len() < 2 {
            return Ok(self.clone());
        }

        let mut resampled = self.points[0].equally_spaced_points(&self.points[1], section_length)?;
        for target in &self.points[2..] {
            let Some(last) = resampled.last().copied() else {
                break;
            };
            let section = last.equally_spaced_points(target, section_length)?;
            resampled.extend(section.into_iter().skip(1));
        }
        Line::new(&resampled)
    }

    /// 線全体を `num_points` 個の点で等間隔（3次元距離）に刻み直す。
    ///
    /// 両端の点は保存される。
    ///
    /// # エラー
    /// * 線の点が2つ未満の場合
    /// * `num_points` が2未満の場合
    pub fn resample_to_num_points(&self, num_points: usize) -> Result<Line, Error> {
        if self.points.len() < 2 {
            return Err(Error::TooFewPoints {
                required: 2,
                found: self.points.len(),
            });
        }
        if num_points < 2 {
            return Err(Error::TooFewSteps { npoints: num_points });
        }

        let lengths: Vec<f64> = self.points.windows(2).map(|w| w[0].distance(&w[1])).collect();
        let section_length = lengths.iter().sum::<f64>() / (num_points - 1) as f64;

        let mut resampled = Vec::with_capacity(num_points);
        resampled.push(self.points[0]);
        let mut segment = 0;
        let mut accumulated = 0.0;
        let mut last_length = 0.0;
        for i in 1..num_points {
            let target = i as f64 * section_length;
            while accumulated < target && segment < lengths.len() {
                last_length = lengths[segment];
                accumulated += last_length;
                segment += 1;
            }
            let end = segment.max(1);
            let (from, to) = (&self.points[end - 1], &self.points[end]);
            let offset = target - (accumulated - last_length);
            resampled.push(if offset < 1e-5 {
                *from
            } else {
                towards(from, to, offset)
            });
        }
        Ok(Line { points: resampled })
    }

    /// 各区間の3次元距離の合計（km）。
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }
}

/// `from` から `to` へ向かって3次元距離 `distance` だけ進んだ点。
fn towards(from: &Point, to: &Point, distance: f64) -> Point {
    let total = from.distance(to);
    if total <= 0.0 {
        return *from;
    }
    let fraction = distance / total;
    from.point_at(
        from.horizontal_distance(to) * fraction,
        (to.depth() - from.depth()) * fraction,
        from.azimuth(to),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lon: f64, lat: f64) -> Point {
        Point::new(lon, lat, 0.0).unwrap()
    }

    #[test]
    fn new_removes_duplicates_and_rejects_empty() {
        let line = Line::new(&[p(0.0, 0.0), p(0.0, 0.0), p(1.0, 0.0)]).unwrap();
        assert_eq!(line.len(), 2);
        assert!(Line::new(&[]).is_err());
    }

    #[test]
    fn average_azimuth_weights_by_length() {
        //北へ長く、東へ短く
        let line = Line::new(&[p(0.0, 0.0), p(0.0, 1.0), p(0.01, 1.0)]).unwrap();
        let azimuth = line.average_azimuth();
        assert!(azimuth > 0.0 && azimuth < 1.0);

        //西へ向かう線は 270 度付近
        let line = Line::new(&[p(0.0, 0.0), p(-0.5, 0.0), p(-1.0, 0.0)]).unwrap();
        assert!((line.average_azimuth() - 270.0).abs() < 1e-6);
    }

    #[test]
    fn resample_spaces_points_evenly() {
        let line = Line::new(&[p(0.0, 0.0), p(0.1, 0.0), p(0.2, 0.0)]).unwrap();
        let resampled = line.resample(1.0).unwrap();
        //0.1 度 ≈ 11.12 km → 各区間 11 刻み
        assert_eq!(resampled.len(), 23);
        for w in resampled.points().windows(2) {
            assert!((w[0].distance(&w[1]) - 1.0).abs() < 1e-6);
        }
        assert!(line.resample(0.0).is_err());
    }

    #[test]
    fn resample_to_num_points_keeps_ends() {
        let line = Line::new(&[p(0.0, 0.0), p(0.1, 0.0), p(0.1, 0.2)]).unwrap();
        let resampled = line.resample_to_num_points(7).unwrap();
        assert_eq!(resampled.len(), 7);
        assert_eq!(resampled.points()[0], p(0.0, 0.0));
        assert_eq!(resampled.points()[6], p(0.1, 0.2));
        //全長 0.3 度を 6 等分するので 3 番目は角の頂点
        assert_eq!(resampled.points()[2], p(0.1, 0.0));
        let step = line.length() / 6.0;
        for w in resampled.points().windows(2) {
            assert!((w[0].distance(&w[1]) - step).abs() < 1e-3);
        }
    }

    #[test]
    fn resample_to_num_points_interpolates_depth() {
        let line = Line::new(&[
            Point::new(0.0, 0.0, 0.0).unwrap(),
            Point::new(0.0, 0.0, 10.0).unwrap(),
        ])
        .unwrap();
        let resampled = line.resample_to_num_points(5).unwrap();
        let depths: Vec<f64> = resampled.points().iter().map(Point::depth).collect();
        for (depth, expected) in depths.iter().zip([0.0, 2.5, 5.0, 7.5, 10.0]) {
            assert!((depth - expected).abs() < 1e-9);
        }

        assert_eq!(
            line.resample_to_num_points(1).unwrap_err(),
            Error::TooFewSteps { npoints: 1 }
        );
        assert!(Line::new(&[p(0.0, 0.0)]).unwrap().resample_to_num_points(3).is_err());
    }

    #[test]
    fn length_sums_segments() {
        let line = Line::new(&[p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)]).unwrap();
        let one_degree = 1.0_f64.to_radians() * 6371.0;
        assert!((line.length() - 2.0 * one_degree).abs() < 1e-9);
    }
}
