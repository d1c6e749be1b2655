use serde_json::Value;

use crate::{Res, error::ExportError, spotify::SpotifyApi, table::cell_text, warning};

use super::{ColumnSpec, Table, flatten};

/// Upper bound of ids per feature request accepted by the Spotify API.
pub const FEATURE_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureEndpoint {
    AudioFeatures,
    Artists,
}

/// Describes how a table is augmented by a batched foreign-key lookup.
#[derive(Debug, Clone, Copy)]
pub struct Enrichment {
    /// Column shared by the base table and the feature table.
    pub key: &'static str,
    pub endpoint: FeatureEndpoint,
    pub columns: ColumnSpec,
    pub result_key: Option<&'static str>,
}

/// Fetches features for every non-null `key` value of `base` and outer-joins
/// them back into it.
///
/// # Arguments
///
/// * `api` - Spotify endpoint implementation used for the feature lookups
/// * `base` - Table to enrich; returned unchanged when it lacks `key`
/// * `enrichment` - Key column, endpoint and projection of the feature rows
///
/// # Returns
///
/// The base rows in their original order with the feature columns appended,
/// followed by feature rows that matched no base row.
///
/// # Batching
///
/// Ids are requested in chunks of [`FEATURE_BATCH_SIZE`] in row order. A
/// chunk that still fails after the HTTP layer's retry is reported and
/// skipped; its rows end up with null feature columns.
///
/// # Errors
///
/// - [`ExportError::Auth`] from any chunk aborts the enrichment
/// - [`ExportError::MissingField`] when a returned chunk changed shape
///
/// # Example
///
/// ```
/// let enriched = enrich(&client, table, &TRACK_ENRICHMENT).await?;
/// ```
pub async fn enrich<A: SpotifyApi>(api: &A, base: Table, enrichment: &Enrichment) -> Res<Table> {
    let Some(keys) = base.column(enrichment.key) else {
        return Ok(base);
    };

    let ids: Vec<String> = keys
        .into_iter()
        .filter(|v| !v.is_null())
        .map(cell_text)
        .collect();

    let mut features = Table::new(
        enrichment
            .columns
            .destinations()
            .map(String::from)
            .collect(),
    );

    for chunk in ids.chunks(FEATURE_BATCH_SIZE) {
        let response: Res<Value> = match enrichment.endpoint {
            FeatureEndpoint::AudioFeatures => api.audio_features(chunk).await,
            FeatureEndpoint::Artists => api.artists(chunk).await,
        };

        match response {
            Ok(data) => {
                let chunk_table = flatten(&data, &enrichment.columns, enrichment.result_key)?;
                features.append(chunk_table);
            }
            Err(e @ ExportError::Auth(_)) => return Err(e),
            Err(e) => warning!(
                "Failed to fetch {:?} for {} ids, leaving them empty: {}",
                enrichment.endpoint,
                chunk.len(),
                e
            ),
        }
    }

    features.dedup_by(enrichment.key);
    Ok(base.outer_join(features, enrichment.key))
}
