//! WKT encoding for stored footprints

/// Encode a (lng, lat) ring as `POLYGONZ((lng lat 0, ...))`.
///
/// Ingested footprints carry no elevation, so Z is always 0.
pub fn polygonz(ring: &[[f64; 2]]) -> String {
    let coords = ring
        .iter()
        .map(|[lng, lat]| format!("{} {} 0", lng, lat))
        .collect::<Vec<_>>()
        .join(", ");
    format!("POLYGONZ(({}))", coords)
}
