use crate::{error::Error, geometry::mesh::RectangularMesh, surface::Surface};

use super::mean_width;

/// 任意の格子状メッシュをそのまま破壊面として扱う。
///
/// 走向と傾斜角はメッシュの面積重み付き平均から、幅は傾斜方向のセル幅の
/// 合計の平均から求める。
#[derive(Debug, Clone)]
pub struct MeshSurface {
    mesh: RectangularMesh,
    strike: f64,
    dip: f64,
    width: f64,
}

impl MeshSurface {
    /// # エラー
    /// * メッシュの行または列が1つしかない場合
    /// * 下の行が上の行より浅い場合
    pub fn new(mesh: RectangularMesh) -> Result<Self, Error> {
        let (dip, strike) = mesh.mean_inclination_and_azimuth()?;
        let width = mean_width(&mesh);
        Ok(Self {
            mesh,
            strike,
            dip,
            width,
        })
    }
}

impl Surface for MeshSurface {
    fn mesh(&self) -> &RectangularMesh {
        &self.mesh
    }

    fn strike(&self) -> f64 {
        self.strike
    }

    fn dip(&self) -> f64 {
        self.dip
    }

    fn width(&self) -> f64 {
        self.width
    }
}
