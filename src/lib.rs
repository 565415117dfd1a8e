/// 発生し得るすべてのエラーを`enum` 型として定義・集約。
mod error;

/// 点・線・多角形・メッシュと、球面上の測地計算。
mod geometry;

/// 断層破壊面の `Surface` トレイトとその実装。
pub mod surface;

/// サイト集合と、破壊面からサイトまでの距離の組。
pub mod context;

/// 計算の既定値と RON 形式の設定ファイル。
pub mod config;

/// C から呼び出すための配列ベースの関数。
pub mod ffi;

pub use roaring::RoaringTreemap;

pub use config::Config;
pub use error::{ConfigError, Error};
pub use geometry::{
    constants,
    ecef::Ecef,
    geodetic,
    helpers::{vec2::Vec2, vec3::Vec3},
    line::Line,
    mesh::{CellDimensions, Mesh, RectangularMesh, Triangulation},
    point::Point,
    polygon::Polygon,
    utils,
    utils::{OrthographicProjection, SphericalBoundingBox},
};

pub use context::{DistancesContext, RuptureGeometry, SiteCollection};
pub use surface::{ComplexFaultSurface, MeshSurface, SimpleFaultSurface, Surface};
