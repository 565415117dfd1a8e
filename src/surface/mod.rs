//! 断層破壊面と、破壊面からサイトまでの各種距離。

use crate::{
    error::Error,
    geometry::{
        constants::JB_CLOSE_THRESHOLD,
        geodetic,
        mesh::{Mesh, RectangularMesh},
        point::Point,
        utils::SphericalBoundingBox,
    },
};

mod complex_fault;
mod mesh_surface;
mod simple_fault;

pub use complex_fault::ComplexFaultSurface;
pub use mesh_surface::MeshSurface;
pub use simple_fault::SimpleFaultSurface;

/// 格子状のメッシュで離散化された断層破壊面。
///
/// 実装は破壊面のメッシュと走向・傾斜角・幅を与えれば、距離計算などは
/// 既定の実装がメッシュから求める。
pub trait Surface {
    /// 破壊面を離散化したメッシュ。行は傾斜方向、列は走向方向に並ぶ。
    fn mesh(&self) -> &RectangularMesh;

    /// 走向（度、`[0, 360)`）
    fn strike(&self) -> f64;

    /// 傾斜角（度、`(0, 90]`）
    fn dip(&self) -> f64;

    /// 傾斜方向に測った破壊面の幅（km）
    fn width(&self) -> f64;

    /// 各サイトから破壊面までの最短3次元距離（Rrup）。
    fn min_distance(&self, sites: &Mesh) -> Result<Vec<f64>, Error> {
        self.mesh().to_mesh().min_distance(sites)
    }

    /// 各サイトに最も近い破壊面上の点。
    fn closest_points(&self, sites: &Mesh) -> Result<Mesh, Error> {
        self.mesh().to_mesh().closest_points(sites)
    }

    /// 各サイトから破壊面の地表投影までの距離（Rjb）。投影の内部なら 0。
    fn joyner_boore_distance(&self, sites: &Mesh) -> Result<Vec<f64>, Error> {
        self.joyner_boore_distance_with_threshold(sites, JB_CLOSE_THRESHOLD)
    }

    /// `threshold` より近いサイトだけ投影平面上で、セルごとの四角形までの
    /// 距離として Rjb を求める。
    fn joyner_boore_distance_with_threshold(
        &self,
        sites: &Mesh,
        threshold: f64,
    ) -> Result<Vec<f64>, Error> {
        self.mesh().joyner_boore_distance_with_threshold(sites, threshold)
    }

    /// 上端の最初の点を走向方向に通る大円までの符号付き距離（Rx）。
    ///
    /// 走向に向かって右側（上盤側）が正、左側（下盤側）が負。
    fn rx_distance(&self, sites: &Mesh) -> Result<Vec<f64>, Error> {
        let Some(origin) = self.mesh().get(0, 0) else {
            return Err(Error::TooFewPoints {
                required: 1,
                found: 0,
            });
        };
        let strike = self.strike();
        Ok(sites
            .lons()
            .iter()
            .zip(sites.lats())
            .map(|(&lon, &lat)| {
                geodetic::distance_to_arc(origin.longitude(), origin.latitude(), strike, lon, lat)
            })
            .collect())
    }

    /// 破壊面上端の最も浅い深さ（km）。
    fn top_edge_depth(&self) -> f64 {
        let (_, cols) = self.mesh().shape();
        self.mesh().depths()[..cols]
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }

    /// 全セルの面積の合計（km²）。
    fn area(&self) -> f64 {
        self.mesh().cell_dimensions().areas.iter().flatten().sum()
    }

    fn bounding_box(&self) -> Result<SphericalBoundingBox, Error> {
        self.mesh().to_mesh().bounding_box()
    }

    fn middle_point(&self) -> Point {
        self.mesh().middle_point()
    }
}

/// 傾斜方向に合計したセル幅の、列についての平均。
pub(crate) fn mean_width(mesh: &RectangularMesh) -> f64 {
    let widths = mesh.cell_dimensions().widths;
    let Some(cols) = widths.first().map(Vec::len) else {
        return 0.0;
    };
    if cols == 0 {
        return 0.0;
    }
    let total: f64 = (0..cols)
        .map(|c| widths.iter().map(|row| row[c]).sum::<f64>())
        .sum();
    total / cols as f64
}
