//! 点群 [`Mesh`] と、行・列の格子状に並んだ [`RectangularMesh`]。

use roaring::RoaringTreemap;
use tracing::debug;

use crate::{
    error::Error,
    geometry::{
        constants::JB_CLOSE_THRESHOLD,
        geodetic,
        helpers::{vec2::Vec2, vec3::Vec3},
        point::Point,
        utils::{
            OrthographicProjection, SphericalBoundingBox, cartesian_to_spherical, convex_hull_2d,
            get_middle_point, get_spherical_bounding_box, normalized, point_to_polygon_distance,
            spherical_to_cartesian, triangle_area,
        },
    },
};

/// 経度・緯度・深さの配列で表される点の集合。
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    lons: Vec<f64>,
    lats: Vec<f64>,
    depths: Vec<f64>,
}

impl Mesh {
    /// 配列から [`Mesh`] を生成する。`depths` が `None` なら全点を地表とする。
    ///
    /// # エラー
    /// * 配列の長さが揃っていない場合
    /// * 点が1つもない場合
    pub fn new(lons: Vec<f64>, lats: Vec<f64>, depths: Option<Vec<f64>>) -> Result<Self, Error> {
        if lats.len() != lons.len() {
            return Err(Error::LengthMismatch {
                expected: lons.len(),
                found: lats.len(),
            });
        }
        let depths = depths.unwrap_or_else(|| vec![0.0; lons.len()]);
        if depths.len() != lons.len() {
            return Err(Error::LengthMismatch {
                expected: lons.len(),
                found: depths.len(),
            });
        }
        if lons.is_empty() {
            return Err(Error::TooFewPoints {
                required: 1,
                found: 0,
            });
        }
        for (&longitude, &latitude) in lons.iter().zip(&lats) {
            Point::new(longitude, latitude, 0.0)?;
        }
        Ok(Self { lons, lats, depths })
    }

    pub fn from_points(points: &[Point]) -> Result<Self, Error> {
        Self::new(
            points.iter().map(Point::longitude).collect(),
            points.iter().map(Point::latitude).collect(),
            Some(points.iter().map(Point::depth).collect()),
        )
    }

    pub fn len(&self) -> usize {
        self.lons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lons.is_empty()
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn depths(&self) -> &[f64] {
        &self.depths
    }

    pub fn get(&self, index: usize) -> Option<Point> {
        Some(Point::new_unchecked(
            *self.lons.get(index)?,
            *self.lats.get(index)?,
            *self.depths.get(index)?,
        ))
    }

    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.len()).map(|i| Point::new_unchecked(self.lons[i], self.lats[i], self.depths[i]))
    }

    /// 添字集合に含まれる点だけを取り出す。該当する点がなければ `None`。
    pub fn select(&self, indices: &RoaringTreemap) -> Option<Mesh> {
        let picked: Vec<usize> = indices
            .iter()
            .map(|i| i as usize)
            .filter(|&i| i < self.len())
            .collect();
        if picked.is_empty() {
            return None;
        }
        Some(Mesh {
            lons: picked.iter().map(|&i| self.lons[i]).collect(),
            lats: picked.iter().map(|&i| self.lats[i]).collect(),
            depths: picked.iter().map(|&i| self.depths[i]).collect(),
        })
    }

    pub fn bounding_box(&self) -> Result<SphericalBoundingBox, Error> {
        get_spherical_bounding_box(&self.lons, &self.lats)
    }

    /// 各サイトからこのメッシュまでの最短3次元距離。
    pub fn min_distance(&self, sites: &Mesh) -> Result<Vec<f64>, Error> {
        geodetic::min_distance(
            &self.lons,
            &self.lats,
            &self.depths,
            &sites.lons,
            &sites.lats,
            &sites.depths,
        )
    }

    /// 各サイトに最も近いこのメッシュ上の点を集めたメッシュ。
    pub fn closest_points(&self, sites: &Mesh) -> Result<Mesh, Error> {
        let nearest = geodetic::min_distance_with_indices(
            &self.lons,
            &self.lats,
            &self.depths,
            &sites.lons,
            &sites.lats,
            &sites.depths,
        )?;
        Ok(Mesh {
            lons: nearest.iter().map(|&(_, i)| self.lons[i]).collect(),
            lats: nearest.iter().map(|&(_, i)| self.lats[i]).collect(),
            depths: nearest.iter().map(|&(_, i)| self.depths[i]).collect(),
        })
    }

    /// 投影平面上でのこのメッシュの凸包。
    pub fn convex_hull(&self, projection: &OrthographicProjection) -> Result<Vec<Vec2>, Error> {
        Ok(convex_hull_2d(
            &projection.project_all(&self.lons, &self.lats)?,
        ))
    }

    /// 各サイトから、このメッシュを地表に投影した領域までの距離（Joyner-Boore 距離）。
    pub fn joyner_boore_distance(&self, sites: &Mesh) -> Result<Vec<f64>, Error> {
        self.joyner_boore_distance_with_threshold(sites, JB_CLOSE_THRESHOLD)
    }

    /// `threshold` より遠いサイトは大円距離で、近いサイトは投影平面上の
    /// 凸包までの距離で求める。
    pub fn joyner_boore_distance_with_threshold(
        &self,
        sites: &Mesh,
        threshold: f64,
    ) -> Result<Vec<f64>, Error> {
        refine_close_sites(&self.lons, &self.lats, sites, threshold, |projection| {
            Ok(vec![self.convex_hull(projection)?])
        })
    }
}

/// 近いサイトの距離を、投影平面上で `footprint` が返す多角形群までの
/// 最短距離に置き換える。
fn refine_close_sites<F>(
    lons: &[f64],
    lats: &[f64],
    sites: &Mesh,
    threshold: f64,
    footprint: F,
) -> Result<Vec<f64>, Error>
where
    F: FnOnce(&OrthographicProjection) -> Result<Vec<Vec<Vec2>>, Error>,
{
    let mut distances = geodetic::min_geodetic_distance(lons, lats, &sites.lons, &sites.lats)?;

    let close: Vec<usize> = distances
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d < threshold)
        .map(|(i, _)| i)
        .collect();
    if close.is_empty() {
        return Ok(distances);
    }
    debug!(
        close_sites = close.len(),
        total_sites = sites.len(),
        "refining Joyner-Boore distance on projection plane"
    );

    let mut all_lons = lons.to_vec();
    let mut all_lats = lats.to_vec();
    all_lons.extend(close.iter().map(|&i| sites.lons[i]));
    all_lats.extend(close.iter().map(|&i| sites.lats[i]));
    let projection = OrthographicProjection::for_points(&all_lons, &all_lats)?;

    let polygons = footprint(&projection)?;
    for i in close {
        let xy = projection.project(sites.lons[i], sites.lats[i])?;
        distances[i] = polygons
            .iter()
            .map(|polygon| point_to_polygon_distance(polygon, xy))
            .fold(f64::INFINITY, f64::min);
    }
    Ok(distances)
}

/// 行・列の格子状に並んだ点群。
///
/// 断層面の離散化に使い、行は傾斜方向（下へ向かって深くなる）、
/// 列は走向方向に並ぶ。値は行優先で保持する。
#[derive(Debug, Clone, PartialEq)]
pub struct RectangularMesh {
    rows: usize,
    cols: usize,
    lons: Vec<f64>,
    lats: Vec<f64>,
    depths: Vec<f64>,
}

/// メッシュを三角形分割したときの辺ベクトル（地心直交座標、km）。
#[derive(Debug, Clone)]
pub struct Triangulation {
    /// 各点の直交座標 `[row][col]`
    pub points: Vec<Vec<Vec3>>,
    /// 走向方向の辺 `[row][col]` → `[row][col + 1]`
    pub along_azimuth: Vec<Vec<Vec3>>,
    /// 上向きの辺 `[row + 1][col]` → `[row][col]`
    pub updip: Vec<Vec<Vec3>>,
    /// 対角の辺 `[row + 1][col]` → `[row][col + 1]`
    pub diag: Vec<Vec<Vec3>>,
}

/// 各セル（隣接する4点で囲まれる四角形）の中心・長さ・幅・面積。
#[derive(Debug, Clone, Default)]
pub struct CellDimensions {
    pub centers: Vec<Vec<Point>>,
    pub lengths: Vec<Vec<f64>>,
    pub widths: Vec<Vec<f64>>,
    pub areas: Vec<Vec<f64>>,
}

impl RectangularMesh {
    pub fn new(
        rows: usize,
        cols: usize,
        lons: Vec<f64>,
        lats: Vec<f64>,
        depths: Vec<f64>,
    ) -> Result<Self, Error> {
        let expected = rows * cols;
        for found in [lons.len(), lats.len(), depths.len()] {
            if found != expected {
                return Err(Error::LengthMismatch { expected, found });
            }
        }
        if expected == 0 {
            return Err(Error::TooFewPoints {
                required: 1,
                found: 0,
            });
        }
        for (&longitude, &latitude) in lons.iter().zip(&lats) {
            Point::new(longitude, latitude, 0.0)?;
        }
        Ok(Self {
            rows,
            cols,
            lons,
            lats,
            depths,
        })
    }

    /// 点の行の並びから生成する。全ての行は同じ長さでなければならない。
    pub fn from_points_list(points: &[Vec<Point>]) -> Result<Self, Error> {
        let cols = points.first().map(Vec::len).unwrap_or(0);
        for (row, line) in points.iter().enumerate() {
            if line.len() != cols {
                return Err(Error::RaggedRow {
                    row,
                    expected: cols,
                    found: line.len(),
                });
            }
        }
        let flat = points.iter().flatten();
        Self::new(
            points.len(),
            cols,
            flat.clone().map(Point::longitude).collect(),
            flat.clone().map(Point::latitude).collect(),
            flat.map(Point::depth).collect(),
        )
    }

    /// `(行数, 列数)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Point> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let i = row * self.cols + col;
        Some(Point::new_unchecked(self.lons[i], self.lats[i], self.depths[i]))
    }

    fn at(&self, row: usize, col: usize) -> Point {
        let i = row * self.cols + col;
        Point::new_unchecked(self.lons[i], self.lats[i], self.depths[i])
    }

    pub fn row(&self, row: usize) -> Option<Vec<Point>> {
        (row < self.rows).then(|| (0..self.cols).map(|col| self.at(row, col)).collect())
    }

    pub fn depths(&self) -> &[f64] {
        &self.depths
    }

    /// 行優先で平坦化した [`Mesh`]。
    pub fn to_mesh(&self) -> Mesh {
        Mesh {
            lons: self.lons.clone(),
            lats: self.lats.clone(),
            depths: self.depths.clone(),
        }
    }

    /// 各サイトから、各セルを地表に投影した四角形の和集合までの距離。
    pub fn joyner_boore_distance(&self, sites: &Mesh) -> Result<Vec<f64>, Error> {
        self.joyner_boore_distance_with_threshold(sites, JB_CLOSE_THRESHOLD)
    }

    /// 近いサイトは投影平面上のセルごとの四角形までの距離をとる。
    ///
    /// 凸包を使わないので、折れ曲がったトレースの内側にあるサイトも
    /// 0 にはならない。
    pub fn joyner_boore_distance_with_threshold(
        &self,
        sites: &Mesh,
        threshold: f64,
    ) -> Result<Vec<f64>, Error> {
        refine_close_sites(&self.lons, &self.lats, sites, threshold, |projection| {
            self.projected_cells(projection)
        })
    }

    /// 投影平面上の各セルの四角形 `[r][c], [r][c+1], [r+1][c+1], [r+1][c]`。
    ///
    /// 1行または1列しかなければ、隣り合う2点の線分を並べる。
    fn projected_cells(&self, projection: &OrthographicProjection) -> Result<Vec<Vec<Vec2>>, Error> {
        let xy = projection.project_all(&self.lons, &self.lats)?;
        if self.rows < 2 || self.cols < 2 {
            if xy.len() < 2 {
                return Ok(vec![xy]);
            }
            return Ok(xy.windows(2).map(<[Vec2]>::to_vec).collect());
        }
        let at = |r: usize, c: usize| xy[r * self.cols + c];
        let mut cells = Vec::with_capacity((self.rows - 1) * (self.cols - 1));
        for r in 0..self.rows - 1 {
            for c in 0..self.cols - 1 {
                cells.push(vec![at(r, c), at(r, c + 1), at(r + 1, c + 1), at(r + 1, c)]);
            }
        }
        Ok(cells)
    }

    /// メッシュの中央の点。
    ///
    /// 行数・列数が奇数なら中央の点そのもの。偶数の場合は中央をはさむ2点の
    /// 大円上の中点（深さは平均）を使う。
    pub fn middle_point(&self) -> Point {
        let mid_row = self.rows / 2;
        if self.rows % 2 == 1 {
            return self.row_middle_point(mid_row);
        }
        let p1 = self.row_middle_point(mid_row - 1);
        let p2 = self.row_middle_point(mid_row);
        middle_of(&p1, &p2)
    }

    fn row_middle_point(&self, row: usize) -> Point {
        let mid_col = self.cols / 2;
        if self.cols % 2 == 1 {
            return self.at(row, mid_col);
        }
        middle_of(&self.at(row, mid_col - 1), &self.at(row, mid_col))
    }

    /// 地心直交座標で三角形分割の辺ベクトルを求める。
    pub fn triangulate(&self) -> Triangulation {
        let points: Vec<Vec<Vec3>> = (0..self.rows)
            .map(|r| {
                (0..self.cols)
                    .map(|c| {
                        let i = r * self.cols + c;
                        spherical_to_cartesian(self.lons[i], self.lats[i], self.depths[i])
                    })
                    .collect()
            })
            .collect();

        let along_azimuth = points
            .iter()
            .map(|row| row.windows(2).map(|w| w[1] - w[0]).collect())
            .collect();
        let updip = points
            .windows(2)
            .map(|w| w[0].iter().zip(&w[1]).map(|(&up, &down)| up - down).collect())
            .collect();
        let diag = points
            .windows(2)
            .map(|w| (0..self.cols.saturating_sub(1)).map(|c| w[0][c + 1] - w[1][c]).collect())
            .collect();

        Triangulation {
            points,
            along_azimuth,
            updip,
            diag,
        }
    }

    /// 面積で重み付けした平均の傾斜角と走向（度）を返す。
    ///
    /// 各セルを左上・右下の2つの三角形に分け、三角形ごとの傾斜角と走向を
    /// 角度の円周平均で合成する。
    ///
    /// # エラー
    /// * 行または列が1つしかない場合
    /// * 下の行が上の行より浅い場合
    pub fn mean_inclination_and_azimuth(&self) -> Result<(f64, f64), Error> {
        if self.rows < 2 || self.cols < 2 {
            return Err(Error::MeshTooSmall {
                rows: self.rows,
                cols: self.cols,
            });
        }
        for row in 1..self.rows {
            for col in 0..self.cols {
                if self.at(row, col).depth() < self.at(row - 1, col).depth() {
                    return Err(Error::DepthDecreasesDownDip { row });
                }
            }
        }

        let tri = self.triangulate();
        let z_unit = Vec3::new(0.0, 0.0, 1.0);

        let (mut incl_x, mut incl_y) = (0.0, 0.0);
        let (mut az_x, mut az_y) = (0.0, 0.0);

        for r in 0..self.rows - 1 {
            for c in 0..self.cols - 1 {
                let triangles = [
                    // 左上: [r][c], [r][c+1], [r+1][c]
                    (tri.along_azimuth[r][c], tri.updip[r][c], (r, c), (r, c)),
                    // 右下: [r][c+1], [r+1][c], [r+1][c+1]
                    (tri.along_azimuth[r + 1][c], tri.updip[r][c + 1], (r + 1, c + 1), (r + 1, c)),
                ];
                for (along, up, (nr, nc), (ar, ac)) in triangles {
                    let area = triangle_area(along, up, tri.diag[r][c]);

                    let surface_normal = normalized(tri.points[nr][nc]);
                    let triangle_normal = normalized(along.cross(up));
                    let inclination = surface_normal
                        .dot(triangle_normal)
                        .clamp(-1.0, 1.0)
                        .acos();
                    incl_x += area * inclination.sin();
                    incl_y += area * inclination.cos();

                    let position = tri.points[ar][ac];
                    let east = normalized(z_unit.cross(position));
                    let north = normalized(normalized(position).cross(east));
                    let along = normalized(along);
                    let azimuth = along.dot(east).atan2(along.dot(north));
                    az_x += area * azimuth.sin();
                    az_y += area * azimuth.cos();
                }
            }
        }

        let mut inclination = incl_x.atan2(incl_y).to_degrees();
        let mut azimuth = az_x.atan2(az_y).to_degrees().rem_euclid(360.0);
        // 列の並びが走向と逆（傾斜方向が左手側）なら走向を反転させる。
        // 鉛直面の丸め誤差では反転しない
        if inclination > 90.0 + 1e-6 {
            inclination = 180.0 - inclination;
            azimuth = (azimuth + 180.0).rem_euclid(360.0);
        }
        Ok((inclination.min(90.0), azimuth))
    }

    /// 各セルの中心・長さ（走向方向）・幅（傾斜方向）・面積を求める。
    ///
    /// 行または列が1つしかない場合は空の結果を返す。
    pub fn cell_dimensions(&self) -> CellDimensions {
        if self.rows < 2 || self.cols < 2 {
            return CellDimensions::default();
        }
        let tri = self.triangulate();
        let mut dims = CellDimensions::default();

        for r in 0..self.rows - 1 {
            let mut centers = Vec::with_capacity(self.cols - 1);
            let mut lengths = Vec::with_capacity(self.cols - 1);
            let mut widths = Vec::with_capacity(self.cols - 1);
            let mut areas = Vec::with_capacity(self.cols - 1);

            for c in 0..self.cols - 1 {
                let top = tri.along_azimuth[r][c];
                let left = tri.updip[r][c];
                let bottom = tri.along_azimuth[r + 1][c];
                let right = tri.updip[r][c + 1];
                let diag = tri.diag[r][c];

                let tl_area = triangle_area(top, left, diag);
                let br_area = triangle_area(bottom, right, diag);
                let area = tl_area + br_area;

                let p = &tri.points;
                let tl_center = (p[r][c] + p[r][c + 1] + p[r + 1][c]) / 3.0;
                let br_center = (p[r][c + 1] + p[r + 1][c] + p[r + 1][c + 1]) / 3.0;

                if area > 0.0 {
                    centers.push(cartesian_to_spherical(
                        (tl_center * tl_area + br_center * br_area) / area,
                    ));
                    lengths.push((top.length() * tl_area + bottom.length() * br_area) / area);
                    widths.push((left.length() * tl_area + right.length() * br_area) / area);
                } else {
                    centers.push(cartesian_to_spherical((tl_center + br_center) / 2.0));
                    lengths.push((top.length() + bottom.length()) / 2.0);
                    widths.push((left.length() + right.length()) / 2.0);
                }
                areas.push(area);
            }

            dims.centers.push(centers);
            dims.lengths.push(lengths);
            dims.widths.push(widths);
            dims.areas.push(areas);
        }
        dims
    }
}

fn middle_of(p1: &Point, p2: &Point) -> Point {
    let (lon, lat) = get_middle_point(p1.longitude(), p1.latitude(), p2.longitude(), p2.latitude());
    Point::new_unchecked(lon, lat, (p1.depth() + p2.depth()) / 2.0)
}
