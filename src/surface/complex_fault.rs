use tracing::debug;

use crate::{
    error::Error,
    geometry::{line::Line, mesh::RectangularMesh, point::Point},
    surface::{MeshSurface, Surface},
};

/// 深さの異なる複数の縁（上端から下端へ順に並べた折れ線）の間を
/// 張った破壊面。
///
/// 縁ごとに点の数をそろえて刻み、同じ添字の点を上から下へ結んだ線を
/// さらに等間隔で刻んでメッシュにする。
#[derive(Debug, Clone)]
pub struct ComplexFaultSurface {
    surface: MeshSurface,
}

impl ComplexFaultSurface {
    /// # エラー
    /// * 縁が2本未満、または点が2つ未満の縁がある場合
    /// * `mesh_spacing` が正でない場合
    /// * `mesh_spacing` が縁の平均の長さ、または平均の幅に対して大きすぎる場合
    pub fn from_fault_data(edges: &[Line], mesh_spacing: f64) -> Result<Self, Error> {
        check_fault_data(edges, mesh_spacing)?;

        let mean_length = edges.iter().map(Line::length).sum::<f64>() / edges.len() as f64;
        let num_hor_points = (mean_length / mesh_spacing).round() as usize + 1;
        if num_hor_points <= 1 {
            return Err(Error::SpacingExceedsLength {
                spacing: mesh_spacing,
                length: mean_length,
            });
        }
        let edges = edges
            .iter()
            .map(|edge| edge.resample_to_num_points(num_hor_points))
            .collect::<Result<Vec<_>, _>>()?;

        // 各縁の同じ添字の点を上から下へ結んだ線
        let vertical_edges: Vec<Line> = (0..num_hor_points)
            .map(|i| {
                let points: Vec<Point> = edges.iter().map(|edge| edge.points()[i]).collect();
                Line::new(&points)
            })
            .collect::<Result<_, _>>()?;
        let mean_width =
            vertical_edges.iter().map(Line::length).sum::<f64>() / vertical_edges.len() as f64;
        let num_vert_points = (mean_width / mesh_spacing).round() as usize + 1;
        if num_vert_points <= 1 {
            return Err(Error::SpacingExceedsWidth {
                spacing: mesh_spacing,
                width: mean_width,
            });
        }
        let columns = vertical_edges
            .iter()
            .map(|edge| edge.resample_to_num_points(num_vert_points))
            .collect::<Result<Vec<_>, _>>()?;

        let grid: Vec<Vec<Point>> = (0..num_vert_points)
            .map(|r| columns.iter().map(|column| column.points()[r]).collect())
            .collect();
        debug!(
            rows = num_vert_points,
            cols = num_hor_points,
            mean_length,
            mean_width,
            "meshed complex fault"
        );

        Ok(Self {
            surface: MeshSurface::new(RectangularMesh::from_points_list(&grid)?)?,
        })
    }
}

impl Surface for ComplexFaultSurface {
    fn mesh(&self) -> &RectangularMesh {
        self.surface.mesh()
    }

    fn strike(&self) -> f64 {
        self.surface.strike()
    }

    fn dip(&self) -> f64 {
        self.surface.dip()
    }

    fn width(&self) -> f64 {
        self.surface.width()
    }
}

fn check_fault_data(edges: &[Line], mesh_spacing: f64) -> Result<(), Error> {
    if edges.len() < 2 {
        return Err(Error::TooFewEdges { found: edges.len() });
    }
    if let Some(edge) = edges.iter().find(|edge| edge.len() < 2) {
        return Err(Error::TooFewPoints {
            required: 2,
            found: edge.len(),
        });
    }
    if mesh_spacing <= 0.0 || mesh_spacing.is_nan() {
        return Err(Error::NonPositiveSpacing {
            spacing: mesh_spacing,
        });
    }
    Ok(())
}
