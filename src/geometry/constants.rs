/// 球体地球モデルの平均半径（km）
pub const EARTH_RADIUS: f64 = 6371.0;

/// WGS-84 楕円体の長半径（m）
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS-84 楕円体の扁平率
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// WGS-84 楕円体の短半径（m）
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);

/// WGS-84 楕円体の第一離心率の二乗
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// 2点を同一とみなす3次元距離の上限（km）
pub const EQUALITY_DISTANCE: f64 = 1e-3;

/// Joyner-Boore 距離で投影平面上の計算に切り替える距離（km）
pub const JB_CLOSE_THRESHOLD: f64 = 40.0;
