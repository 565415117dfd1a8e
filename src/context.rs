//! サイト集合と破壊面の幾何情報、およびサイトごとの距離の組。

use roaring::RoaringTreemap;
use tracing::debug;

use crate::{
    config::Config,
    error::Error,
    geometry::{constants::JB_CLOSE_THRESHOLD, mesh::Mesh, point::Point},
    surface::Surface,
};

/// 地震動を評価する地点の集合。
#[derive(Debug, Clone, PartialEq)]
pub struct SiteCollection {
    mesh: Mesh,
}

impl SiteCollection {
    pub fn new(sites: &[Point]) -> Result<Self, Error> {
        Ok(Self {
            mesh: Mesh::from_points(sites)?,
        })
    }

    pub fn from_mesh(mesh: Mesh) -> Self {
        Self { mesh }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn len(&self) -> usize {
        self.mesh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }

    /// 添字集合に含まれるサイトだけを残す。1つも残らなければ `None`。
    pub fn filter(&self, indices: &RoaringTreemap) -> Option<SiteCollection> {
        self.mesh.select(indices).map(Self::from_mesh)
    }
}

/// 破壊面の地表投影から `integration_distance` 以内にあるサイトの添字集合。
pub fn filter_sites_by_distance_to_rupture<S: Surface + ?Sized>(
    surface: &S,
    integration_distance: f64,
    sites: &SiteCollection,
) -> Result<RoaringTreemap, Error> {
    let rjb = surface.joyner_boore_distance(sites.mesh())?;
    let within: RoaringTreemap = rjb
        .iter()
        .enumerate()
        .filter(|&(_, &distance)| distance <= integration_distance)
        .map(|(i, _)| i as u64)
        .collect();
    debug!(
        kept = within.len(),
        total = sites.len(),
        integration_distance,
        "filtered sites by distance to rupture"
    );
    Ok(within)
}

/// 地震動予測式が参照する破壊面の幾何パラメータ。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuptureGeometry {
    pub strike: f64,
    pub dip: f64,
    /// 破壊面上端の深さ（km）
    pub ztor: f64,
    pub width: f64,
    pub hypocentre: Point,
}

impl RuptureGeometry {
    pub fn from_surface<S: Surface + ?Sized>(surface: &S, hypocentre: Point) -> Self {
        Self {
            strike: surface.strike(),
            dip: surface.dip(),
            ztor: surface.top_edge_depth(),
            width: surface.width(),
            hypocentre,
        }
    }

    pub fn hypo_depth(&self) -> f64 {
        self.hypocentre.depth()
    }
}

/// サイトごとの破壊面・震源からの距離（km）。
#[derive(Debug, Clone, PartialEq)]
pub struct DistancesContext {
    /// 破壊面までの最短距離
    pub rrup: Vec<f64>,
    /// 破壊面の地表投影までの距離
    pub rjb: Vec<f64>,
    /// 走向線からの符号付き水平距離（上盤側が正）
    pub rx: Vec<f64>,
    /// 震源距離
    pub rhypo: Vec<f64>,
    /// 震央距離
    pub repi: Vec<f64>,
}

impl DistancesContext {
    pub fn new<S: Surface + ?Sized>(
        surface: &S,
        hypocentre: &Point,
        sites: &SiteCollection,
    ) -> Result<Self, Error> {
        Self::with_threshold(surface, hypocentre, sites, JB_CLOSE_THRESHOLD)
    }

    /// Rjb の投影平面への切り替え距離を設定から取る。
    pub fn with_config<S: Surface + ?Sized>(
        surface: &S,
        hypocentre: &Point,
        sites: &SiteCollection,
        config: &Config,
    ) -> Result<Self, Error> {
        Self::with_threshold(surface, hypocentre, sites, config.jb_close_threshold)
    }

    fn with_threshold<S: Surface + ?Sized>(
        surface: &S,
        hypocentre: &Point,
        sites: &SiteCollection,
        jb_close_threshold: f64,
    ) -> Result<Self, Error> {
        let mesh = sites.mesh();
        let rrup = surface.min_distance(mesh)?;
        let rjb = surface.joyner_boore_distance_with_threshold(mesh, jb_close_threshold)?;
        let rx = surface.rx_distance(mesh)?;
        let rhypo = mesh.iter().map(|site| hypocentre.distance(&site)).collect();
        let repi = mesh
            .iter()
            .map(|site| hypocentre.horizontal_distance(&site))
            .collect();
        Ok(Self {
            rrup,
            rjb,
            rx,
            rhypo,
            repi,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{geometry::line::Line, surface::SimpleFaultSurface};

    fn p(lon: f64, lat: f64) -> Point {
        Point::new(lon, lat, 0.0).unwrap()
    }

    fn vertical_fault() -> SimpleFaultSurface {
        let trace = Line::new(&[p(0.0, 0.0), p(0.2, 0.0)]).unwrap();
        SimpleFaultSurface::from_fault_data(&trace, 2.0, 12.0, 90.0, 1.0).unwrap()
    }

    #[test]
    fn site_collection_filter() {
        let sites = SiteCollection::new(&[p(0.0, 0.0), p(1.0, 1.0), p(2.0, 2.0)]).unwrap();
        assert_eq!(sites.len(), 3);

        let picked = sites.filter(&RoaringTreemap::from_iter([0u64, 2])).unwrap();
        assert_eq!(picked.len(), 2);
        assert_eq!(picked.mesh().get(1).unwrap(), p(2.0, 2.0));

        assert!(sites.filter(&RoaringTreemap::new()).is_none());
        assert!(SiteCollection::new(&[]).is_err());
    }

    #[test]
    fn filter_by_integration_distance() {
        let fault = vertical_fault();
        //北へ 0.5 度 ≈ 55.6 km、1 度 ≈ 111.2 km
        let sites = SiteCollection::new(&[p(0.1, 0.5), p(0.1, 1.0), p(0.1, 0.0), p(10.0, 0.0)])
            .unwrap();
        let kept = filter_sites_by_distance_to_rupture(&fault, 100.0, &sites).unwrap();
        assert_eq!(kept.iter().collect::<Vec<_>>(), vec![0, 2]);

        let config = Config::default();
        let kept =
            filter_sites_by_distance_to_rupture(&fault, config.integration_distance, &sites).unwrap();
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn rupture_geometry_from_surface() {
        let fault = vertical_fault();
        let hypocentre = Point::new(0.1, 0.0, 7.0).unwrap();
        let rupture = RuptureGeometry::from_surface(&fault, hypocentre);
        assert!((rupture.dip - 90.0).abs() < 0.05);
        assert!((rupture.strike - 90.0).abs() < 0.05);
        assert!((rupture.ztor - 2.0).abs() < 1e-9);
        assert!((rupture.width - 10.0).abs() < 1e-6);
        assert_eq!(rupture.hypo_depth(), 7.0);
    }

    #[test]
    fn distances_for_sites_around_vertical_fault() {
        let fault = vertical_fault();
        //メッシュの列の真上にサイトを置く
        let x = fault.mesh().get(0, 11).unwrap().longitude();
        let hypocentre = Point::new(x, 0.0, 7.0).unwrap();
        let sites = SiteCollection::new(&[p(x, 0.0), p(x, -0.1), p(x, 0.1)]).unwrap();
        let dctx = DistancesContext::new(&fault, &hypocentre, &sites).unwrap();

        let tenth = 0.1_f64.to_radians() * 6371.0;

        //断層の真上
        assert!(dctx.rjb[0].abs() < 1e-6);
        assert!((dctx.rrup[0] - 2.0).abs() < 1e-3);
        assert!(dctx.rx[0].abs() < 1e-6);
        assert!((dctx.rhypo[0] - 7.0).abs() < 1e-6);
        assert!(dctx.repi[0].abs() < 1e-6);

        //南は上盤側、北は下盤側
        assert!((dctx.rx[1] - tenth).abs() < 1e-3);
        assert!((dctx.rx[2] + tenth).abs() < 1e-3);
        assert!((dctx.rjb[1] - tenth).abs() < 1e-2);
        assert!((dctx.repi[2] - tenth).abs() < 1e-6);
        assert!((dctx.rhypo[1] - (tenth * tenth + 49.0).sqrt()).abs() < 1e-6);
        assert!(dctx.rrup[1] > dctx.rjb[1]);

        let with_config = DistancesContext::with_config(
            &fault,
            &hypocentre,
            &sites,
            &Config {
                jb_close_threshold: 0.0,
                ..Config::default()
            },
        )
        .unwrap();
        //投影平面を使わなければ最寄りのメッシュ点までの大円距離になる
        assert!(with_config.rjb[0] < 1.0);
        assert_eq!(with_config.rrup, dctx.rrup);
    }
}
