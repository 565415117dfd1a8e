use tracing::debug;

use crate::{
    error::Error,
    geometry::{line::Line, mesh::RectangularMesh, point::Point, utils::line_intersects_itself},
    surface::{MeshSurface, Surface},
};

/// 地表の断層トレースを一定の傾斜角で地下へ延ばした破壊面。
#[derive(Debug, Clone)]
pub struct SimpleFaultSurface {
    surface: MeshSurface,
    upper_seismogenic_depth: f64,
    lower_seismogenic_depth: f64,
}

impl SimpleFaultSurface {
    /// 断層トレースと地震発生層の上下限・傾斜角から破壊面を生成する。
    ///
    /// トレースを `mesh_spacing` 間隔で刻み直し、各点から走向の右手方向
    /// （走向 + 90 度）へ上限・下限の深さまで延ばした2点の間を、
    /// `mesh_spacing` 間隔の点で埋める。
    ///
    /// # エラー
    /// * トレースの点が2つ未満、水平でない、または自己交差する場合
    /// * 傾斜角が `(0, 90]` の範囲外の場合
    /// * `0 <= upper < lower` を満たさない、または上限がトレースより浅い場合
    /// * `mesh_spacing` が正でない場合
    /// * 刻んだ結果が1行または1列しかない場合
    pub fn from_fault_data(
        fault_trace: &Line,
        upper_seismogenic_depth: f64,
        lower_seismogenic_depth: f64,
        dip: f64,
        mesh_spacing: f64,
    ) -> Result<Self, Error> {
        check_fault_data(
            fault_trace,
            upper_seismogenic_depth,
            lower_seismogenic_depth,
            dip,
            mesh_spacing,
        )?;

        let points = fault_trace.points();
        let (first, last) = (points[0], points[points.len() - 1]);
        let strike = first.azimuth(&last);
        let azimuth = (strike + 90.0) % 360.0;

        let tan_dip = dip.to_radians().tan();
        let to_upper = upper_seismogenic_depth - first.depth();
        let vertical_distance = lower_seismogenic_depth - upper_seismogenic_depth;
        let horizontal_distance = vertical_distance / tan_dip;

        // 列ごと（トレースの各点ごと）に傾斜方向の点列を作る
        let mut columns: Vec<Vec<Point>> = Vec::new();
        for point in fault_trace.resample(mesh_spacing)?.points() {
            let top = point.point_at(to_upper / tan_dip, to_upper, azimuth);
            let bottom = top.point_at(horizontal_distance, vertical_distance, azimuth);
            columns.push(top.equally_spaced_points(&bottom, mesh_spacing)?);
        }

        let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
        let cols = columns.len();
        debug!(rows, cols, strike, dip, "meshed simple fault");
        if rows < 2 || cols < 2 {
            return Err(Error::MeshTooSmall { rows, cols });
        }
        // 列の長さが揃わなければ from_points_list が RaggedRow を返す
        let grid: Vec<Vec<Point>> = (0..columns[0].len())
            .map(|r| {
                columns
                    .iter()
                    .filter_map(|column| column.get(r).copied())
                    .collect()
            })
            .collect();

        Ok(Self {
            surface: MeshSurface::new(RectangularMesh::from_points_list(&grid)?)?,
            upper_seismogenic_depth,
            lower_seismogenic_depth,
        })
    }

    pub fn upper_seismogenic_depth(&self) -> f64 {
        self.upper_seismogenic_depth
    }

    pub fn lower_seismogenic_depth(&self) -> f64 {
        self.lower_seismogenic_depth
    }
}

impl Surface for SimpleFaultSurface {
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

fn check_fault_data(
    fault_trace: &Line,
    upper_seismogenic_depth: f64,
    lower_seismogenic_depth: f64,
    dip: f64,
    mesh_spacing: f64,
) -> Result<(), Error> {
    if fault_trace.len() < 2 {
        return Err(Error::TooFewPoints {
            required: 2,
            found: fault_trace.len(),
        });
    }
    let points = fault_trace.points();
    let trace_depth = points[0].depth();
    if let Some((index, point)) = points
        .iter()
        .enumerate()
        .find(|(_, point)| point.depth() != trace_depth)
    {
        return Err(Error::TraceNotHorizontal {
            index,
            depth: point.depth(),
        });
    }
    let lons: Vec<f64> = points.iter().map(Point::longitude).collect();
    let lats: Vec<f64> = points.iter().map(Point::latitude).collect();
    if line_intersects_itself(&lons, &lats, false)? {
        return Err(Error::SelfIntersection);
    }
    if !(dip > 0.0 && dip <= 90.0) {
        return Err(Error::DipOutOfRange { dip });
    }
    if !(upper_seismogenic_depth >= 0.0 && lower_seismogenic_depth > upper_seismogenic_depth) {
        return Err(Error::InvalidSeismogenicDepths {
            upper: upper_seismogenic_depth,
            lower: lower_seismogenic_depth,
        });
    }
    if upper_seismogenic_depth < trace_depth {
        return Err(Error::UpperDepthAboveTrace {
            upper: upper_seismogenic_depth,
            trace_depth,
        });
    }
    if mesh_spacing <= 0.0 || mesh_spacing.is_nan() {
        return Err(Error::NonPositiveSpacing {
            spacing: mesh_spacing,
        });
    }
    Ok(())
}
