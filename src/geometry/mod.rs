//! 球面地球上の点・線・面と、それらの間の距離を扱うための型やロジック。
//!
//! 本モジュールでは、経度・緯度を度、深さ・距離をキロメートル（km）で扱います。
//! 深さは下向きを正とし、地表は 0 です。[`ecef`] のみメートル単位です。

/// 地理空間計算で使用される各種の代表的な定数。
pub mod constants;

/// 地心直交座標系で定義される `Ecef` 型。
pub mod ecef;

/// 球面地球モデルでの距離・方位角・大円上の点の計算。
pub mod geodetic;

pub mod helpers;

/// 断層トレースなどの折れ線 `Line`。
pub mod line;

/// 点群 `Mesh` と格子状の `RectangularMesh`。
pub mod mesh;

/// 経度・緯度・深さで定義される `Point` 型。
pub mod point;

/// 地表上の単純多角形 `Polygon`。
pub mod polygon;

/// 外接矩形、正射投影、平面当てはめなどの補助関数。
pub mod utils;
