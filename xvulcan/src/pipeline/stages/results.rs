use crate::pipeline::{Stage, StageContext, StageError, StageFuture};
use geo::{GeodesicArea, Geometry, MultiPolygon};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use tracing::{info, warn};

pub const STORE_RESULTS: &str = "store_results";

/// Reads the classifier output and stores the per-building results.
#[derive(Debug, Default, Clone, Copy)]
pub struct StoreResultsStage;

impl StoreResultsStage {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, ctx: &StageContext) -> Result<(), StageError> {
        let job = ctx.job_id.as_str();
        let path = ctx.layout.output_path(job);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| StageError::io(&path, e))?;

        let results = summarize_results(job, &raw)?;
        let buildings = results.features.len();
        ctx.store.put_result(&ctx.job_id, results)?;

        info!(job_id = job, buildings, "Results stored");
        Ok(())
    }
}

impl Stage for StoreResultsStage {
    fn name(&self) -> &str {
        STORE_RESULTS
    }

    fn execute<'a>(&'a self, ctx: &'a StageContext) -> StageFuture<'a> {
        Box::pin(self.run(ctx))
    }
}

/// Turns classifier GeoJSON into stored results.
///
/// Every areal geometry becomes a multipolygon carrying `uid`, `osmid`,
/// `dmg` and its geodesic `area` in square metres. Features without an
/// areal geometry are skipped; a feature without a numeric `dmg` is an
/// error.
pub fn summarize_results(job_id: &str, raw: &str) -> Result<FeatureCollection, StageError> {
    let geojson: GeoJson = raw
        .parse()
        .map_err(|e: geojson::Error| StageError::InvalidResults(e.to_string()))?;
    let input = FeatureCollection::try_from(geojson)
        .map_err(|e| StageError::InvalidResults(e.to_string()))?;

    let mut features = Vec::with_capacity(input.features.len());
    for (index, feature) in input.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            warn!(job_id, index, "Result feature without geometry skipped");
            continue;
        };
        let shape = match Geometry::<f64>::try_from(geometry) {
            Ok(Geometry::Polygon(polygon)) => MultiPolygon::new(vec![polygon]),
            Ok(Geometry::MultiPolygon(multi)) => multi,
            Ok(_) => {
                warn!(job_id, index, "Non-areal result geometry skipped");
                continue;
            }
            Err(e) => return Err(StageError::InvalidResults(e.to_string())),
        };

        let properties = feature.properties.unwrap_or_default();
        let dmg = properties
            .get("dmg")
            .and_then(JsonValue::as_f64)
            .ok_or_else(|| {
                StageError::InvalidResults(format!("feature {} has no numeric dmg", index))
            })?;
        let osmid = properties.get("osmid").cloned().unwrap_or(JsonValue::Null);

        let mut out = JsonObject::new();
        out.insert("uid".to_string(), JsonValue::from(job_id));
        out.insert("osmid".to_string(), osmid);
        out.insert("dmg".to_string(), JsonValue::from(dmg));
        out.insert(
            "area".to_string(),
            JsonValue::from(shape.geodesic_area_unsigned()),
        );

        features.push(Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&shape))),
            id: None,
            properties: Some(out),
            foreign_members: None,
        });
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}
