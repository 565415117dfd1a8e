use roaring::RoaringTreemap;
use tracing::debug;

use crate::{
    error::Error,
    geometry::{
        helpers::vec2::Vec2,
        mesh::Mesh,
        point::Point,
        utils::{
            OrthographicProjection, SphericalBoundingBox, clean_points, get_spherical_bounding_box,
            line_intersects_itself, point_in_polygon,
        },
    },
};

/// 地表上の単純多角形（震源域など）。
///
/// 頂点は閉じずに保持し、判定は頂点の外接矩形の中心で投影した平面で行う。
#[derive(Debug, Clone)]
pub struct Polygon {
    lons: Vec<f64>,
    lats: Vec<f64>,
    projection: OrthographicProjection,
    projected: Vec<Vec2>,
}

impl Polygon {
    /// 頂点列から [`Polygon`] を生成する。最後の点が最初の点と等しければ取り除く。
    ///
    /// # エラー
    /// * 異なる頂点が3つ未満の場合
    /// * 辺どうしが交差する場合
    pub fn new(points: &[Point]) -> Result<Self, Error> {
        let mut points = clean_points(points);
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() < 3 {
            return Err(Error::TooFewPoints {
                required: 3,
                found: points.len(),
            });
        }

        let lons: Vec<f64> = points.iter().map(Point::longitude).collect();
        let lats: Vec<f64> = points.iter().map(Point::latitude).collect();
        if line_intersects_itself(&lons, &lats, true)? {
            return Err(Error::SelfIntersection);
        }

        let projection = OrthographicProjection::for_points(&lons, &lats)?;
        let projected = projection.project_all(&lons, &lats)?;
        Ok(Self {
            lons,
            lats,
            projection,
            projected,
        })
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn bounding_box(&self) -> Result<SphericalBoundingBox, Error> {
        get_spherical_bounding_box(&self.lons, &self.lats)
    }

    /// 地表に投影した点が多角形の内部にあるか。投影の裏側の点は外部とする。
    pub fn contains(&self, point: &Point) -> bool {
        match self.projection.project(point.longitude(), point.latitude()) {
            Ok(xy) => point_in_polygon(&self.projected, xy),
            Err(_) => false,
        }
    }

    /// メッシュのうち多角形の内部にある点の添字集合。
    pub fn intersects(&self, mesh: &Mesh) -> RoaringTreemap {
        mesh.iter()
            .enumerate()
            .filter(|(_, point)| self.contains(point))
            .map(|(i, _)| i as u64)
            .collect()
    }

    /// 投影平面上で `mesh_spacing` 間隔の格子を張り、内部の格子点を地表の
    /// [`Mesh`] として返す。
    ///
    /// # エラー
    /// * `mesh_spacing` が正でない場合
    /// * 内部に格子点が1つもない場合
    pub fn discretize(&self, mesh_spacing: f64) -> Result<Mesh, Error> {
        if mesh_spacing <= 0.0 || mesh_spacing.is_nan() {
            return Err(Error::NonPositiveSpacing {
                spacing: mesh_spacing,
            });
        }

        let (min_x, max_x, min_y, max_y) = self.projected.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |(x0, x1, y0, y1), p| (x0.min(p.x()), x1.max(p.x()), y0.min(p.y()), y1.max(p.y())),
        );
        // 格子点は外接矩形の端から半間隔ずらして置く
        let nx = ((max_x - min_x) / mesh_spacing).ceil().max(1.0) as usize;
        let ny = ((max_y - min_y) / mesh_spacing).ceil().max(1.0) as usize;

        let mut lons = Vec::new();
        let mut lats = Vec::new();
        for j in 0..ny {
            for i in 0..nx {
                let xy = Vec2::new(
                    min_x + (i as f64 + 0.5) * mesh_spacing,
                    min_y + (j as f64 + 0.5) * mesh_spacing,
                );
                if point_in_polygon(&self.projected, xy) {
                    let (lon, lat) = self.projection.unproject(xy);
                    lons.push(lon);
                    lats.push(lat);
                }
            }
        }
        debug!(
            grid_points = nx * ny,
            inside = lons.len(),
            mesh_spacing,
            "discretized polygon"
        );
        Mesh::new(lons, lats, None)
    }
}
