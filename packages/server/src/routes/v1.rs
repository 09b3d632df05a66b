use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::files::{self, upload_body_limit};
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/files", file_routes(config))
}

fn file_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(files::upload_files, files::replace_files))
        .layer(upload_body_limit(config));

    // The static `id` segment wins over `{category}`.
    let access = OpenApiRouter::new()
        .routes(routes!(files::get_file, files::delete_file_by_id))
        .routes(routes!(files::download_file, files::delete_file))
        .routes(routes!(files::list_slot_files, files::delete_slot_files));

    upload.merge(access)
}
