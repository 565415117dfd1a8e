//! C から呼び出すための配列ベースの関数。
//!
//! すべての関数は成功時に `0`、NULL ポインタを受け取った場合に `-1`、
//! 配列の長さが不正な場合に `-2` を返し、結果は呼び出し側が確保した
//! 出力配列に書き込む。出力配列は入力配列と重なってはならない
//! （その場での書き換えはできない）。

use std::slice;

use crate::geometry::{geodetic, helpers::vec2::Vec2, utils::point_to_polygon_distance};

const OK: i32 = 0;
const NULL_POINTER: i32 = -1;
const INVALID_SIZE: i32 = -2;

/// `ptr` から `len` 要素の入力配列を得る。NULL なら `None`。
///
/// # Safety
/// `ptr` は NULL でなければ `len` 個の `f64` を指していなければならない。
unsafe fn input<'a>(ptr: *const f64, len: usize) -> Option<&'a [f64]> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: 呼び出し側が ptr..ptr+len の有効性を保証する
    Some(unsafe { slice::from_raw_parts(ptr, len) })
}

/// # Safety
/// `ptr` は NULL でなければ `len` 個の `f64` を書き込める領域を指し、
/// 返したスライスが生きている間は他のどのスライスとも重なってはならない。
unsafe fn output<'a>(ptr: *mut f64, len: usize) -> Option<&'a mut [f64]> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: 呼び出し側が ptr..ptr+len の有効性と排他性を保証する
    Some(unsafe { slice::from_raw_parts_mut(ptr, len) })
}

/// 要素ごとの2点間の大円距離（km）。
///
/// # Safety
/// 入力の4配列と `out` はいずれも `len` 要素を持たなければならない。
/// `out` はどの入力配列とも重なってはならない。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn geodetic_distance(
    lons1: *const f64,
    lats1: *const f64,
    lons2: *const f64,
    lats2: *const f64,
    len: usize,
    out: *mut f64,
) -> i32 {
    let (Some(lons1), Some(lats1), Some(lons2), Some(lats2), Some(out)) = (unsafe {
        (
            input(lons1, len),
            input(lats1, len),
            input(lons2, len),
            input(lats2, len),
            output(out, len),
        )
    }) else {
        return NULL_POINTER;
    };
    for i in 0..len {
        out[i] = geodetic::geodetic_distance(lons1[i], lats1[i], lons2[i], lats2[i]);
    }
    OK
}

/// 各サイトからメッシュまでの最短3次元距離（km）と、最寄りの点の添字。
///
/// `out_indices` は NULL でもよく、その場合は距離だけを書き込む。
///
/// # Safety
/// メッシュの3配列は `mesh_len` 要素、サイトの3配列と `out`・`out_indices`
/// は `sites_len` 要素を持たなければならない。`out` と `out_indices` は
/// 互いにも入力配列とも重なってはならない。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn min_distance(
    mlons: *const f64,
    mlats: *const f64,
    mdepths: *const f64,
    mesh_len: usize,
    slons: *const f64,
    slats: *const f64,
    sdepths: *const f64,
    sites_len: usize,
    out: *mut f64,
    out_indices: *mut u64,
) -> i32 {
    let (
        Some(mlons),
        Some(mlats),
        Some(mdepths),
        Some(slons),
        Some(slats),
        Some(sdepths),
        Some(out),
    ) = (unsafe {
        (
            input(mlons, mesh_len),
            input(mlats, mesh_len),
            input(mdepths, mesh_len),
            input(slons, sites_len),
            input(slats, sites_len),
            input(sdepths, sites_len),
            output(out, sites_len),
        )
    }) else {
        return NULL_POINTER;
    };
    let Ok(nearest) =
        geodetic::min_distance_with_indices(mlons, mlats, mdepths, slons, slats, sdepths)
    else {
        return INVALID_SIZE;
    };
    for (slot, &(distance, _)) in out.iter_mut().zip(&nearest) {
        *slot = distance;
    }
    if !out_indices.is_null() {
        // SAFETY: 呼び出し側が out_indices..out_indices+sites_len の有効性と排他性を保証する
        let indices = unsafe { slice::from_raw_parts_mut(out_indices, sites_len) };
        for (slot, &(_, index)) in indices.iter_mut().zip(&nearest) {
            *slot = index as u64;
        }
    }
    OK
}

/// 各サイトからメッシュの最も近い点までの大円距離（km）。
///
/// # Safety
/// メッシュの2配列は `mesh_len` 要素、サイトの2配列と `out` は
/// `sites_len` 要素を持たなければならない。`out` はどの入力配列とも
/// 重なってはならない。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn min_geodetic_distance(
    mlons: *const f64,
    mlats: *const f64,
    mesh_len: usize,
    slons: *const f64,
    slats: *const f64,
    sites_len: usize,
    out: *mut f64,
) -> i32 {
    let (Some(mlons), Some(mlats), Some(slons), Some(slats), Some(out)) = (unsafe {
        (
            input(mlons, mesh_len),
            input(mlats, mesh_len),
            input(slons, sites_len),
            input(slats, sites_len),
            output(out, sites_len),
        )
    }) else {
        return NULL_POINTER;
    };
    let Ok(distances) = geodetic::min_geodetic_distance(mlons, mlats, slons, slats) else {
        return INVALID_SIZE;
    };
    out.copy_from_slice(&distances);
    OK
}

/// 投影平面上の凸多角形から各点までの距離。内部または境界上なら 0。
///
/// # Safety
/// 多角形の2配列は `polygon_len` 要素、点の2配列と `out` は `len` 要素を
/// 持たなければならない。`out` はどの入力配列とも重なってはならない。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn convex_to_point_distance(
    polygon_xs: *const f64,
    polygon_ys: *const f64,
    polygon_len: usize,
    pxs: *const f64,
    pys: *const f64,
    len: usize,
    out: *mut f64,
) -> i32 {
    let (Some(polygon_xs), Some(polygon_ys), Some(pxs), Some(pys), Some(out)) = (unsafe {
        (
            input(polygon_xs, polygon_len),
            input(polygon_ys, polygon_len),
            input(pxs, len),
            input(pys, len),
            output(out, len),
        )
    }) else {
        return NULL_POINTER;
    };
    if polygon_len == 0 {
        return INVALID_SIZE;
    }
    let polygon: Vec<Vec2> = polygon_xs
        .iter()
        .zip(polygon_ys)
        .map(|(&x, &y)| Vec2::new(x, y))
        .collect();
    for i in 0..len {
        out[i] = point_to_polygon_distance(&polygon, Vec2::new(pxs[i], pys[i]));
    }
    OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn geodetic_distance_elementwise() {
        let lons1 = [0.0, 0.0];
        let lats1 = [0.0, 0.0];
        let lons2 = [1.0, 0.0];
        let lats2 = [0.0, 0.0];
        let mut out = [f64::NAN; 2];
        let status = unsafe {
            geodetic_distance(
                lons1.as_ptr(),
                lats1.as_ptr(),
                lons2.as_ptr(),
                lats2.as_ptr(),
                2,
                out.as_mut_ptr(),
            )
        };
        assert_eq!(status, OK);
        assert!((out[0] - 111.194_926_644_558_73).abs() < 1e-9);
        assert_eq!(out[1], 0.0);

        let status = unsafe {
            geodetic_distance(
                ptr::null(),
                lats1.as_ptr(),
                lons2.as_ptr(),
                lats2.as_ptr(),
                2,
                out.as_mut_ptr(),
            )
        };
        assert_eq!(status, NULL_POINTER);
    }

    #[test]
    fn min_distance_with_and_without_indices() {
        let mlons = [0.0, 1.0];
        let mlats = [0.0, 0.0];
        let mdepths = [5.0, 5.0];
        let slons = [0.9];
        let slats = [0.0];
        let sdepths = [5.0];
        let mut out = [0.0];
        let mut indices = [u64::MAX];
        let status = unsafe {
            min_distance(
                mlons.as_ptr(),
                mlats.as_ptr(),
                mdepths.as_ptr(),
                2,
                slons.as_ptr(),
                slats.as_ptr(),
                sdepths.as_ptr(),
                1,
                out.as_mut_ptr(),
                indices.as_mut_ptr(),
            )
        };
        assert_eq!(status, OK);
        assert_eq!(indices[0], 1);
        assert!((out[0] - 0.1_f64.to_radians() * 6371.0).abs() < 1e-6);

        let status = unsafe {
            min_distance(
                mlons.as_ptr(),
                mlats.as_ptr(),
                mdepths.as_ptr(),
                0,
                slons.as_ptr(),
                slats.as_ptr(),
                sdepths.as_ptr(),
                1,
                out.as_mut_ptr(),
                ptr::null_mut(),
            )
        };
        assert_eq!(status, INVALID_SIZE);
    }

    #[test]
    fn min_geodetic_distance_picks_nearest() {
        let mlons = [0.0, 2.0];
        let mlats = [0.0, 0.0];
        let slons = [1.5, -1.0];
        let slats = [0.0, 0.0];
        let mut out = [0.0; 2];
        let status = unsafe {
            min_geodetic_distance(
                mlons.as_ptr(),
                mlats.as_ptr(),
                2,
                slons.as_ptr(),
                slats.as_ptr(),
                2,
                out.as_mut_ptr(),
            )
        };
        assert_eq!(status, OK);
        let one_degree = 111.194_926_644_558_73;
        assert!((out[0] - 0.5 * one_degree).abs() < 1e-9);
        assert!((out[1] - one_degree).abs() < 1e-9);
    }

    #[test]
    fn convex_to_point_distance_is_zero_inside() {
        let xs = [0.0, 2.0, 2.0, 0.0];
        let ys = [0.0, 0.0, 2.0, 2.0];
        let pxs = [1.0, 5.0, 2.0];
        let pys = [1.0, 2.0, 3.0];
        let mut out = [f64::NAN; 3];
        let status = unsafe {
            convex_to_point_distance(
                xs.as_ptr(),
                ys.as_ptr(),
                4,
                pxs.as_ptr(),
                pys.as_ptr(),
                3,
                out.as_mut_ptr(),
            )
        };
        assert_eq!(status, OK);
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 3.0).abs() < 1e-12);
        assert!((out[2] - 1.0).abs() < 1e-12);

        let status = unsafe {
            convex_to_point_distance(
                xs.as_ptr(),
                ys.as_ptr(),
                0,
                pxs.as_ptr(),
                pys.as_ptr(),
                3,
                out.as_mut_ptr(),
            )
        };
        assert_eq!(status, INVALID_SIZE);
    }
}
