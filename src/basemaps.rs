// src/basemaps.rs
//! Known basemaps and switching the base tile layer of a map

use crate::error::{Result, ToolError};
use crate::host::MapHost;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A base tile layer definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basemap {
    pub url: String,
    pub max_zoom: u8,
    pub attribution: String,
    pub name: String,
}

const OSM_ATTRIBUTION: &str =
    "Map data (c) <a href=\"https://openstreetmap.org\">OpenStreetMap</a> contributors";
const CARTO_ATTRIBUTION: &str = "&copy; <a href=\"http://www.openstreetmap.org/copyright\">OpenStreetMap</a> &copy; <a href=\"http://cartodb.com/attributions\">CartoDB</a>";
const STAMEN_ATTRIBUTION: &str = "Map tiles by <a href=\"http://stamen.com\">Stamen Design</a>, <a href=\"http://creativecommons.org/licenses/by/3.0\">CC BY 3.0</a> &mdash; Map data &copy; <a href=\"http://openstreetmap.org\">OpenStreetMap</a> contributors";

// (name, url, max_zoom, attribution)
const CATALOG: &[(&str, &str, u8, &str)] = &[
    (
        "OpenStreetMap.Mapnik",
        "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
        19,
        OSM_ATTRIBUTION,
    ),
    (
        "OpenStreetMap.BlackAndWhite",
        "http://{s}.tiles.wmflabs.org/bw-mapnik/{z}/{x}/{y}.png",
        18,
        OSM_ATTRIBUTION,
    ),
    (
        "OpenStreetMap.DE",
        "http://{s}.tile.openstreetmap.de/tiles/osmde/{z}/{x}/{y}.png",
        18,
        OSM_ATTRIBUTION,
    ),
    (
        "OpenStreetMap.France",
        "http://{s}.tile.openstreetmap.fr/osmfr/{z}/{x}/{y}.png",
        20,
        "Map data (c) OpenStreetMap contributors",
    ),
    (
        "OpenStreetMap.HOT",
        "http://{s}.tile.openstreetmap.fr/hot/{z}/{x}/{y}.png",
        19,
        "Map data (c) OpenStreetMap contributors",
    ),
    (
        "OpenTopoMap",
        "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png",
        17,
        "Map data: (c) OpenStreetMap contributors, SRTM | Map style: (c) OpenTopoMap (CC-BY-SA)",
    ),
    (
        "Esri.WorldStreetMap",
        "http://server.arcgisonline.com/ArcGIS/rest/services/World_Street_Map/MapServer/tile/{z}/{y}/{x}",
        20,
        "Tiles &copy; Esri &mdash; Source: Esri, DeLorme, NAVTEQ, USGS, Intermap, iPC, NRCAN, Esri Japan, METI, Esri China (Hong Kong), Esri (Thailand), TomTom, 2012",
    ),
    (
        "Esri.WorldTopoMap",
        "http://server.arcgisonline.com/ArcGIS/rest/services/World_Topo_Map/MapServer/tile/{z}/{y}/{x}",
        20,
        "Tiles &copy; Esri &mdash; Esri, DeLorme, NAVTEQ, TomTom, Intermap, iPC, USGS, FAO, NPS, NRCAN, GeoBase, Kadaster NL, Ordnance Survey, Esri Japan, METI, Esri China (Hong Kong), and the GIS User Community",
    ),
    (
        "Esri.WorldImagery",
        "http://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
        20,
        "Tiles &copy; Esri &mdash; Source: Esri, i-cubed, USDA, USGS, AEX, GeoEye, Getmapping, Aerogrid, IGN, IGP, UPR-EGP, and the GIS User Community",
    ),
    (
        "CartoDB.Positron",
        "http://c.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png",
        20,
        CARTO_ATTRIBUTION,
    ),
    (
        "CartoDB.DarkMatter",
        "http://c.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}.png",
        20,
        CARTO_ATTRIBUTION,
    ),
    (
        "Stamen.Terrain",
        "https://stamen-tiles-{s}.a.ssl.fastly.net/terrain/{z}/{x}/{y}.png",
        18,
        STAMEN_ATTRIBUTION,
    ),
    (
        "Stamen.Toner",
        "https://stamen-tiles-{s}.a.ssl.fastly.net/toner/{z}/{x}/{y}.png",
        20,
        STAMEN_ATTRIBUTION,
    ),
    (
        "Stamen.Watercolor",
        "https://stamen-tiles-{s}.a.ssl.fastly.net/watercolor/{z}/{x}/{y}.png",
        18,
        STAMEN_ATTRIBUTION,
    ),
];

/// All known basemaps, in catalogue order.
pub fn catalog() -> Vec<Basemap> {
    CATALOG
        .iter()
        .map(|(name, url, max_zoom, attribution)| Basemap {
            url: url.to_string(),
            max_zoom: *max_zoom,
            attribution: attribution.to_string(),
            name: name.to_string(),
        })
        .collect()
}

/// Look a basemap up by its fully qualified, dotted name.
///
/// The name is walked one component at a time and the first basemap met
/// wins, so trailing components below a basemap are ignored.
pub fn get_basemap(name: &str) -> Option<Basemap> {
    let all = catalog();
    let mut prefix = String::new();
    for part in name.split('.') {
        if !prefix.is_empty() {
            prefix.push('.');
        }
        prefix.push_str(part);
        if let Some(found) = all.iter().find(|b| b.name == prefix) {
            return Some(found.clone());
        }
    }
    None
}

/// Dropdown-style switcher for the base tile layer of a map.
#[derive(Debug, Clone)]
pub struct BasemapSwitcher {
    pub description: String,
    pub options: Vec<String>,
    pub value: String,
}

impl BasemapSwitcher {
    /// Control id the switcher registers with the host.
    pub const CONTROL_ID: &'static str = "basemap";

    /// Create a switcher starting at the host's current basemap (or the
    /// first known one) and apply that selection.
    pub fn new(host: &mut dyn MapHost, description: &str) -> Result<Self> {
        let options: Vec<String> = catalog().into_iter().map(|b| b.name).collect();
        let value = match host.base_layer() {
            Some(current) if options.contains(&current) => current,
            _ => options
                .first()
                .cloned()
                .ok_or_else(|| ToolError::UnknownBasemap(String::new()))?,
        };

        let mut switcher = Self {
            description: description.to_string(),
            options,
            value: value.clone(),
        };
        host.add_control(Self::CONTROL_ID);
        switcher.select(host, &value)?;
        Ok(switcher)
    }

    /// Replace the host's base tile layer.
    pub fn select(&mut self, host: &mut dyn MapHost, name: &str) -> Result<()> {
        let basemap =
            get_basemap(name).ok_or_else(|| ToolError::UnknownBasemap(name.to_string()))?;
        info!(basemap = %basemap.name, "switching basemap");
        host.set_base_layer(&basemap);
        self.value = basemap.name;
        Ok(())
    }

    pub fn close(self, host: &mut dyn MapHost) {
        host.remove_control(Self::CONTROL_ID);
    }
}
