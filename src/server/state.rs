use std::sync::Arc;
use usvg::fontdb;

use crate::label::SvgTextMeasurer;
use crate::settings;

pub(crate) struct ServerState {
    pub(crate) settings: settings::Settings,
    pub(crate) fontdb: Arc<fontdb::Database>,
    pub(crate) measurer: SvgTextMeasurer,
    pub(crate) http: reqwest::Client,
    pub(crate) docs: String,
}
