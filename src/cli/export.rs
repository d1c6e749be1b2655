use std::path::PathBuf;

use tabled::Table as SummaryTable;

use crate::{
    config::Settings,
    error,
    error::ExportError,
    info, output,
    query::{QueryKind, required_scopes},
    spotify::{self, SpotifyClient},
    success,
    types::{ExportSummaryRow, TimeRange},
    utils, warning,
};

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub queries: Vec<QueryKind>,
    pub limit: u32,
    pub time_range: TimeRange,
    pub output_dir: PathBuf,
}

pub async fn export(opts: ExportOptions) {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Cannot load settings. Err: {}", e),
    };

    let kinds = selected_kinds(&opts.queries);
    let scopes = required_scopes(&kinds);

    info!("Initializing Spotify connection");
    let token_mgr = match spotify::auth::get_token(&settings, &scopes).await {
        Ok(manager) => manager,
        Err(e) => error!("{}", e),
    };

    let client = match SpotifyClient::new(settings, token_mgr) {
        Ok(client) => client,
        Err(e) => error!("Cannot create Spotify client. Err: {}", e),
    };
    success!("Connection and user are ready!");

    let mut summary: Vec<ExportSummaryRow> = Vec::new();

    for kind in kinds {
        info!("Getting {}", kind.name());

        let pb = utils::spinner(format!("Fetching {}...", kind.name()));
        let result = kind.collect(&client, opts.limit, opts.time_range).await;
        pb.finish_and_clear();

        let outputs = match result {
            Ok(outputs) => outputs,
            Err(ExportError::Auth(e)) => error!("Authorization lost while exporting: {}", e),
            Err(e) => {
                warning!("Skipping {}: {}", kind.name(), e);
                summary.push(ExportSummaryRow {
                    query: kind.name().to_string(),
                    rows: "-".to_string(),
                    file: "failed".to_string(),
                });
                continue;
            }
        };

        for out in outputs {
            let path = opts.output_dir.join(&out.file_name);
            match output::write_csv(&out.table, &path).await {
                Ok(()) => {
                    success!("Wrote {} rows to {}", out.table.len(), path.display());
                    summary.push(ExportSummaryRow {
                        query: kind.name().to_string(),
                        rows: out.table.len().to_string(),
                        file: path.display().to_string(),
                    });
                }
                Err(e) => warning!("Failed to write {}: {}", path.display(), e),
            }
        }
    }

    println!("{}", SummaryTable::new(summary));
}

/// Requested kinds without duplicates, in request order. Nothing requested
/// means every kind.
fn selected_kinds(requested: &[QueryKind]) -> Vec<QueryKind> {
    if requested.is_empty() {
        return QueryKind::ALL.to_vec();
    }

    let mut kinds = Vec::new();
    for kind in requested {
        if !kinds.contains(kind) {
            kinds.push(*kind);
        }
    }
    kinds
}
