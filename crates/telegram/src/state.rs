use std::{path::PathBuf, sync::Arc};

use {tvlogo_catalog::Catalog, tvlogo_gallery::SelectionMachine};

use crate::outbound::Responder;

/// Tunables the handlers read on every update.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    /// Maximum `select` buttons for an ambiguous query.
    pub display_limit: usize,
    /// Catalog names offered when nothing matches.
    pub suggestion_count: usize,
    /// Optional directory every rendered sheet is also written to.
    pub export_dir: Option<PathBuf>,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            display_limit: 10,
            suggestion_count: 3,
            export_dir: None,
        }
    }
}

/// Runtime state shared by every update task.
#[derive(Clone)]
pub struct BotState {
    pub catalog: Arc<Catalog>,
    pub selection: Arc<SelectionMachine>,
    pub responder: Arc<dyn Responder>,
    pub settings: HandlerSettings,
}
