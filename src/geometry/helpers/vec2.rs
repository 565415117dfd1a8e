/// 正射図法で投影した平面上の2次元ベクトル型（単位はキロメートル）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    x: f64,
    y: f64,
}

impl Vec2 {
    /// 新しい Vec2 を作成
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// x 成分を返す
    pub fn x(&self) -> f64 {
        self.x
    }

    /// y 成分を返す
    pub fn y(&self) -> f64 {
        self.y
    }

    /// ベクトルの加算
    pub fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x(), self.y + other.y())
    }

    /// ベクトルの減算
    pub fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x(), self.y - other.y())
    }

    /// スカラー倍
    pub fn mul(self, scalar: f64) -> Vec2 {
        Vec2::new(self.x * scalar, self.y * scalar)
    }

    /// 内積（dot product）
    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x() + self.y * other.y()
    }

    /// 外積の z 成分。正なら other は self の左側にある
    pub fn cross(self, other: Vec2) -> f64 {
        self.x * other.y() - self.y * other.x()
    }

    /// ベクトルの長さの二乗
    pub fn length_sq(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// ベクトルの長さ
    pub fn length(self) -> f64 {
        self.length_sq().sqrt()
    }

    /// 他ベクトルとの距離
    pub fn distance(self, other: Vec2) -> f64 {
        self.sub(other).length()
    }

    /// 線分 `a`-`b` 上で自身に最も近い点までの距離
    pub fn distance_to_segment(self, a: Vec2, b: Vec2) -> f64 {
        let ab = b.sub(a);
        let len_sq = ab.length_sq();
        if len_sq == 0.0 {
            return self.distance(a);
        }
        let t = (self.sub(a).dot(ab) / len_sq).clamp(0.0, 1.0);
        self.distance(a.add(ab.mul(t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_segment_clamps_to_endpoints() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(4.0, 0.0);

        //線分の真上
        assert_eq!(Vec2::new(2.0, 3.0).distance_to_segment(a, b), 3.0);
        //端点の外側
        assert_eq!(Vec2::new(7.0, 4.0).distance_to_segment(a, b), 5.0);
        //長さ0の線分
        assert_eq!(Vec2::new(3.0, 4.0).distance_to_segment(a, a), 5.0);
    }
}
